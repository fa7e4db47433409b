use crate::di::ServiceContainer;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode as HttpStatusCode, request::Parts},
};
use std::sync::Arc;

/// Axum extractor resolving a service from the bootstrapped container.
///
/// Routes added by host-capable modules during the application phases can
/// take their dependencies straight from the handler signature.
///
/// # Example
/// ```rust,ignore
/// async fn list_users(Inject(users): Inject<UserService>) -> Json<Vec<User>> {
///     Json(users.list().await)
/// }
/// ```
pub struct Inject<T>(pub Arc<T>);

/// Router state that gives access to the service container.
pub trait HasContainer {
    fn get_container(&self) -> &ServiceContainer;
}

/// Default router state installed by [`ApplicationContext::into_router`](crate::lifecycle::ApplicationContext::into_router).
#[derive(Clone)]
pub struct AppState {
    container: Arc<ServiceContainer>,
}

impl AppState {
    pub fn new(container: Arc<ServiceContainer>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }
}

impl HasContainer for AppState {
    fn get_container(&self) -> &ServiceContainer {
        &self.container
    }
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: 'static + Send + Sync,
{
    type Rejection = (HttpStatusCode, String);

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state.get_container().resolve::<T>().map(Inject).map_err(|e| {
            tracing::error!("Failed to inject {}: {}", std::any::type_name::<T>(), e);
            (
                HttpStatusCode::INTERNAL_SERVER_ERROR,
                format!("Dependency injection failed: {}", e),
            )
        })
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}
