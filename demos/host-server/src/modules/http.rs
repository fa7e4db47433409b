use super::{Greeter, GreetingModule};
use bootkit::prelude::*;
use serde::Serialize;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    modules: usize,
}

async fn greet(Inject(greeter): Inject<Greeter>, Path(name): Path<String>) -> String {
    greeter.greet(&name)
}

async fn modules(Inject(graph): Inject<ModuleGraph>) -> Json<ModuleGraph> {
    Json(graph.as_ref().clone())
}

async fn health(Inject(graph): Inject<ModuleGraph>) -> Json<Health> {
    Json(Health {
        status: "ok",
        modules: graph.len(),
    })
}

/// Exposes the HTTP endpoints.
#[derive(Default)]
#[module(depends_on = [GreetingModule])]
pub struct HttpModule;

#[async_trait]
impl Module for HttpModule {
    fn as_application(&mut self) -> Option<&mut dyn ApplicationModule> {
        Some(self)
    }
}

#[async_trait]
impl ApplicationModule for HttpModule {
    async fn application(
        &mut self,
        ctx: &mut ApplicationContext,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        ctx.route("/health", get(health))
            .route("/modules", get(modules))
            .route("/greet/{name}", get(greet));
        Ok(())
    }
}
