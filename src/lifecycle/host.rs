//! Host kernel
//!
//! Adds the application phases for modules that also configure the host's
//! request pipeline.

use super::kernel::{ensure_not_cancelled, phase_failed};
use super::{ApplicationContext, BootstrapState, LifecyclePhase, ModuleKernel, PhaseFamily};
use crate::di::ServiceContainer;
use crate::error::{BootstrapError, Result};
use crate::module::{ModuleGraph, ModuleId, ModuleRegistry, ModuleType};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// A [`ModuleKernel`] plus the PreApplication, Application and
/// PostApplication phases.
///
/// The application phases only visit modules whose
/// [`Module::as_application`](crate::Module::as_application) returns `Some`,
/// in the same dependency order as every other phase. Other modules still
/// take part in configuration and initialization.
///
/// # Example
///
/// ```rust,ignore
/// let mut host = HostKernel::new::<AppModule>()?;
/// let router = host.bootstrap().await?;
/// axum::serve(listener, router).await?;
/// ```
pub struct HostKernel {
    kernel: ModuleKernel,
}

impl HostKernel {
    pub fn new<Root: ModuleType>() -> Result<Self> {
        ModuleKernel::new::<Root>().map(Self::from_kernel)
    }

    pub fn from_kernel(kernel: ModuleKernel) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &ModuleKernel {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut ModuleKernel {
        &mut self.kernel
    }

    pub fn into_kernel(self) -> ModuleKernel {
        self.kernel
    }

    pub fn load_modules(&mut self, root: ModuleId) -> Result<usize> {
        self.kernel.load_modules(root)
    }

    pub fn validate_module_type(&self, id: &ModuleId) -> Result<()> {
        self.kernel.validate_module_type(id)
    }

    pub async fn configure_modules(&mut self) -> Result<()> {
        self.kernel.configure_modules().await
    }

    pub async fn initialize_modules(&mut self) -> Result<()> {
        self.kernel.initialize_modules().await
    }

    /// A fresh host context over the frozen container.
    ///
    /// Fails until configuration has finished.
    pub fn application_context(&self) -> Result<ApplicationContext> {
        self.kernel
            .shared_services()
            .map(ApplicationContext::new)
            .ok_or_else(|| BootstrapError::InvalidState {
                operation: "create application context",
                state: self.kernel.state(),
            })
    }

    /// Run the three application phases over the host-capable modules.
    ///
    /// Requires a completed [`initialize_modules`](Self::initialize_modules).
    /// Having no host-capable module is not an error.
    #[tracing::instrument(name = "initialize_host", skip_all, fields(bootstrap_id = %self.kernel.bootstrap_id()))]
    pub async fn initialize_host(&mut self, host: &mut ApplicationContext) -> Result<()> {
        let family = PhaseFamily::Application;
        self.kernel
            .expect_state(family.entry_state(), "initialize host")?;

        let host_capable = self.host_module_count();
        if host_capable == 0 {
            tracing::warn!("No host-capable modules loaded, application phases are a no-op");
        }

        for phase in family.phases() {
            if let Err(err) = self.run_application_phase(phase, host, host_capable).await {
                self.kernel.state = BootstrapState::Failed;
                return Err(err);
            }
            self.kernel.state = phase.completed_state();
        }
        Ok(())
    }

    /// Configure, initialize and run the application phases, returning the
    /// finished router.
    pub async fn bootstrap(&mut self) -> Result<Router> {
        self.configure_modules().await?;
        self.initialize_modules().await?;
        let mut host = self.application_context()?;
        self.initialize_host(&mut host).await?;
        Ok(host.into_router())
    }

    async fn run_application_phase(
        &mut self,
        phase: LifecyclePhase,
        host: &mut ApplicationContext,
        host_capable: usize,
    ) -> Result<()> {
        let started = Instant::now();
        tracing::info!("Running {} hooks ({} modules)...", phase, host_capable);

        let cancel = &self.kernel.cancel;
        for node in self.kernel.registry.iter_mut() {
            let id = node.id();
            let Some(module) = node.instance_mut().as_application() else {
                continue;
            };
            ensure_not_cancelled(cancel, phase, id)?;
            tracing::debug!("{}: {}", phase, id.short_name());

            let outcome = match phase {
                LifecyclePhase::PreApplication => module.pre_application(host, cancel).await,
                LifecyclePhase::Application => module.application(host, cancel).await,
                LifecyclePhase::PostApplication => module.post_application(host, cancel).await,
                other => Err(anyhow::anyhow!("{} is not an application phase", other)),
            };
            outcome.map_err(|e| phase_failed(phase, id, e))?;
        }

        tracing::info!("{} complete in {:?}", phase, started.elapsed());
        Ok(())
    }

    fn host_module_count(&mut self) -> usize {
        self.kernel
            .registry
            .iter_mut()
            .filter_map(|node| node.instance_mut().as_application().map(|_| ()))
            .count()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        self.kernel.registry()
    }

    pub fn graph(&self) -> &ModuleGraph {
        self.kernel.graph()
    }

    pub fn services(&self) -> &ServiceContainer {
        self.kernel.services()
    }

    pub fn state(&self) -> BootstrapState {
        self.kernel.state()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.kernel.cancellation_token()
    }

    pub fn into_services(self) -> Arc<ServiceContainer> {
        self.kernel.into_services()
    }
}
