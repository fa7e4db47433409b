//! The module contract.
//!
//! A module is a unit of application configuration. It declares which other
//! modules it needs while it is being constructed ([`ModuleType::create`]),
//! and the kernel then drives every loaded module through the lifecycle
//! hooks below, always dependencies first.
//!
//! ```text
//! PreConfigure → Configure → PostConfigure          (ConfigurationContext)
//! PreInitialize → Initialize → PostInitialize       (InitializationContext)
//! PreApplication → Application → PostApplication    (ApplicationContext, host-capable modules only)
//! ```
//!
//! Each arrow is a full pass over all modules: every module runs its
//! `pre_configure` before any module runs `configure`.

mod graph;
mod id;
mod registry;
mod resolver;

pub use graph::{ModuleGraph, ModuleInfo};
pub use id::ModuleId;
pub use registry::{ModuleNode, ModuleRegistry};
pub use resolver::{DependencyResolver, validate_module_type};

use crate::lifecycle::{ApplicationContext, ConfigurationContext, InitializationContext};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Lifecycle hooks every module implements.
///
/// All hooks default to a no-op, so a module only overrides the phases it
/// cares about. Errors are opaque to the kernel: a failing hook aborts the
/// bootstrap with [`BootstrapError::PhaseFailed`](crate::BootstrapError::PhaseFailed).
///
/// # Example
///
/// ```rust,ignore
/// use bootkit::prelude::*;
///
/// #[derive(Default)]
/// #[module(depends_on = [DatabaseModule])]
/// pub struct UserModule;
///
/// #[async_trait]
/// impl Module for UserModule {
///     async fn configure(
///         &mut self,
///         ctx: &mut ConfigurationContext<'_>,
///         _cancel: &CancellationToken,
///     ) -> anyhow::Result<()> {
///         ctx.services_mut().register(UserService::default());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn pre_configure(
        &mut self,
        _ctx: &mut ConfigurationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Register services into the container under construction.
    async fn configure(
        &mut self,
        _ctx: &mut ConfigurationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn post_configure(
        &mut self,
        _ctx: &mut ConfigurationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn pre_initialize(
        &mut self,
        _ctx: &mut InitializationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Resolve services from the built container and bring them up.
    async fn initialize(
        &mut self,
        _ctx: &mut InitializationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn post_initialize(
        &mut self,
        _ctx: &mut InitializationContext<'_>,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Returns the host-facing hooks if this module also configures the
    /// request pipeline. Modules that return `None` are skipped by
    /// [`HostKernel::initialize_host`](crate::HostKernel::initialize_host).
    fn as_application(&mut self) -> Option<&mut dyn ApplicationModule> {
        None
    }
}

/// A concrete, constructible module.
///
/// `create` is where a module declares its dependencies. It is usually
/// generated by the `#[module(depends_on = [...])]` attribute.
pub trait ModuleType: Module + Sized {
    fn create(deps: &mut DependsOn) -> Self;
}

/// Extra hooks for modules that configure the host's request pipeline.
///
/// A module opts in by implementing this trait and returning `Some(self)`
/// from [`Module::as_application`].
#[async_trait]
pub trait ApplicationModule: Module {
    async fn pre_application(
        &mut self,
        _ctx: &mut ApplicationContext,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Add routes, nested routers and the like.
    async fn application(
        &mut self,
        _ctx: &mut ApplicationContext,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn post_application(
        &mut self,
        _ctx: &mut ApplicationContext,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Dependency declarations collected while a module is constructed.
///
/// Declaration order is kept and is the order the resolver visits them in.
/// Declaring the same module twice is a no-op.
#[derive(Debug, Default)]
pub struct DependsOn {
    ids: Vec<ModuleId>,
}

impl DependsOn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a dependency on module `M`.
    pub fn module<M: ModuleType>(&mut self) -> &mut Self {
        self.add(ModuleId::of::<M>())
    }

    /// Declare a dependency by id. Ids without a module constructor are
    /// rejected when the graph is resolved.
    ///
    /// Re-declaring a type keeps its original position. A constructor-bearing
    /// id replaces an earlier [`ModuleId::of_type`] id for the same type.
    pub fn add(&mut self, id: ModuleId) -> &mut Self {
        match self.ids.iter_mut().find(|existing| **existing == id) {
            Some(existing) => {
                if existing.constructor().is_none() && id.constructor().is_some() {
                    *existing = id;
                }
            }
            None => self.ids.push(id),
        }
        self
    }

    pub fn ids(&self) -> &[ModuleId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<ModuleId> {
        self.ids
    }
}
