mod container;
mod extractor;

pub use container::ServiceContainer;
pub use extractor::{AppState, HasContainer, Inject};
