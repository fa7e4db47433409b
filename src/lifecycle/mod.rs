//! Lifecycle orchestration
//!
//! Once the module graph is resolved, the kernel moves through a fixed,
//! linear sequence of phases. Every phase is a complete pass over all
//! modules in dependency order before the next one starts.
//!
//! ```text
//! 1. Resolve root module           → Resolved
//!    ↓
//! 2. PreConfigure  (each module)   ← ConfigurationContext
//! 3. Configure     (each module)
//! 4. PostConfigure (each module)   → container frozen
//!    ↓
//! 5. PreInitialize  (each module)  ← InitializationContext
//! 6. Initialize     (each module)
//! 7. PostInitialize (each module)
//!    ↓
//! 8. PreApplication  (host-capable modules only, HostKernel)  ← ApplicationContext
//! 9. Application
//! 10. PostApplication
//!    ↓
//! [Host serves requests]
//! ```
//!
//! The first hook that fails aborts the call with
//! [`BootstrapError::PhaseFailed`](crate::BootstrapError::PhaseFailed),
//! no later module or phase runs, and the kernel ends up `Failed`.
//!
//! # Example
//!
//! ```rust,ignore
//! use bootkit::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut kernel = HostKernel::new::<AppModule>()?;
//!     let watcher = cancel_on_shutdown(kernel.cancellation_token());
//!     let router = kernel.bootstrap().await?;
//!     watcher.abort();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

mod context;
mod host;
mod kernel;
mod phase;
mod shutdown;

pub use context::{ApplicationContext, ConfigurationContext, InitializationContext};
pub use host::HostKernel;
pub use kernel::{ModuleKernel, ModuleKernelBuilder};
pub use phase::{BootstrapState, LifecyclePhase, PhaseFamily};
pub use shutdown::{cancel_on_shutdown, shutdown_signal};
