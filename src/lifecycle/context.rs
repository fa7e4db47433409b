//! Contexts handed to lifecycle hooks.
//!
//! One context type per phase family. All of them are scoped to the
//! bootstrap call that creates them; nothing is global.

use crate::config::ConfigService;
use crate::di::{AppState, ServiceContainer};
use crate::module::ModuleGraph;
use axum::Router;
use axum::routing::MethodRouter;
use std::sync::Arc;

/// Passed to the configure hooks. Gives mutable access to the service
/// container under construction.
pub struct ConfigurationContext<'a> {
    services: &'a mut ServiceContainer,
    config: &'a ConfigService,
    modules: &'a ModuleGraph,
}

impl<'a> ConfigurationContext<'a> {
    pub fn new(
        services: &'a mut ServiceContainer,
        config: &'a ConfigService,
        modules: &'a ModuleGraph,
    ) -> Self {
        Self {
            services,
            config,
            modules,
        }
    }

    pub fn services(&self) -> &ServiceContainer {
        &*self.services
    }

    pub fn services_mut(&mut self) -> &mut ServiceContainer {
        &mut *self.services
    }

    pub fn configuration(&self) -> &ConfigService {
        self.config
    }

    /// The resolved modules, in load order.
    pub fn modules(&self) -> &ModuleGraph {
        self.modules
    }
}

/// Passed to the initialize hooks. The container is complete at this point
/// and acts as a service locator.
pub struct InitializationContext<'a> {
    services: &'a Arc<ServiceContainer>,
    config: &'a ConfigService,
    modules: &'a ModuleGraph,
}

impl<'a> InitializationContext<'a> {
    pub fn new(
        services: &'a Arc<ServiceContainer>,
        config: &'a ConfigService,
        modules: &'a ModuleGraph,
    ) -> Self {
        Self {
            services,
            config,
            modules,
        }
    }

    pub fn services(&self) -> &Arc<ServiceContainer> {
        self.services
    }

    pub fn configuration(&self) -> &ConfigService {
        self.config
    }

    pub fn modules(&self) -> &ModuleGraph {
        self.modules
    }
}

/// Host context for the application phases: the HTTP router being assembled
/// by host-capable modules.
///
/// # Example
///
/// ```rust,ignore
/// let mut app = kernel.application_context()?;
/// kernel.initialize_host(&mut app).await?;
/// let router = app.into_router();
/// axum::serve(listener, router).await?;
/// ```
pub struct ApplicationContext {
    services: Arc<ServiceContainer>,
    router: Router<AppState>,
}

impl ApplicationContext {
    pub fn new(services: Arc<ServiceContainer>) -> Self {
        Self {
            services,
            router: Router::new(),
        }
    }

    pub fn services(&self) -> &Arc<ServiceContainer> {
        &self.services
    }

    pub fn route(&mut self, path: &str, method_router: MethodRouter<AppState>) -> &mut Self {
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self
    }

    pub fn nest(&mut self, path: &str, router: Router<AppState>) -> &mut Self {
        self.router = std::mem::take(&mut self.router).nest(path, router);
        self
    }

    pub fn merge(&mut self, router: Router<AppState>) -> &mut Self {
        self.router = std::mem::take(&mut self.router).merge(router);
        self
    }

    pub fn router_mut(&mut self) -> &mut Router<AppState> {
        &mut self.router
    }

    /// Finish the pipeline, installing the container as router state.
    pub fn into_router(self) -> Router {
        self.router.with_state(AppState::new(self.services))
    }
}
