mod greeting;
mod http;

pub use greeting::{GreetingModule, Greeter};
pub use http::HttpModule;

use bootkit::prelude::*;

/// Root of the demo graph.
#[derive(Default)]
#[module(depends_on = [HttpModule, GreetingModule])]
pub struct AppModule;

#[async_trait]
impl Module for AppModule {
    async fn post_initialize(
        &mut self,
        ctx: &mut InitializationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        tracing::info!("Modules ready: {}", ctx.modules().names().join(", "));
        Ok(())
    }
}
