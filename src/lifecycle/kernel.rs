//! Module kernel
//!
//! Owns the resolved module graph and drives it through the configuration
//! and initialization phases.

use super::{
    BootstrapState, ConfigurationContext, InitializationContext, LifecyclePhase, PhaseFamily,
};
use crate::config::ConfigService;
use crate::di::ServiceContainer;
use crate::error::{BootstrapError, Result};
use crate::module::{
    DependencyResolver, ModuleGraph, ModuleId, ModuleRegistry, ModuleType, validate_module_type,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Runs the configuration and initialization phases over a module graph.
///
/// Building a kernel eagerly resolves the root module. Each phase is then a
/// full, sequential pass over the modules in dependency order, and the first
/// failing hook aborts the whole call.
///
/// # Example
///
/// ```rust,ignore
/// use bootkit::ModuleKernel;
///
/// let mut kernel = ModuleKernel::new::<AppModule>()?;
/// kernel.configure_modules().await?;
/// kernel.initialize_modules().await?;
/// let services = kernel.into_services();
/// ```
pub struct ModuleKernel {
    pub(super) registry: ModuleRegistry,
    resolver: DependencyResolver,
    /// Container while configuration is still registering services.
    services: ServiceContainer,
    /// Container once configuration has finished.
    pub(super) shared: Option<Arc<ServiceContainer>>,
    config: ConfigService,
    graph: Arc<ModuleGraph>,
    pub(super) cancel: CancellationToken,
    pub(super) state: BootstrapState,
    bootstrap_id: Uuid,
}

impl ModuleKernel {
    /// Build a kernel with default settings, loading `Root` and its dependencies.
    pub fn new<Root: ModuleType>() -> Result<Self> {
        Self::builder().build::<Root>()
    }

    pub fn builder() -> ModuleKernelBuilder {
        ModuleKernelBuilder::new()
    }

    /// Load another root module and its dependencies.
    ///
    /// Modules that are already loaded are not constructed again. Only
    /// allowed before configuration starts. Returns the number of modules
    /// added.
    #[tracing::instrument(name = "load_modules", skip_all, fields(bootstrap_id = %self.bootstrap_id))]
    pub fn load_modules(&mut self, root: ModuleId) -> Result<usize> {
        if !matches!(
            self.state,
            BootstrapState::Unresolved | BootstrapState::Resolved
        ) {
            return Err(BootstrapError::InvalidState {
                operation: "load modules",
                state: self.state,
            });
        }

        let loaded = self
            .resolver
            .load_modules(&mut self.registry, root)
            .inspect_err(|e| tracing::error!("Failed to load {}: {}", root.short_name(), e));
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                self.state = BootstrapState::Failed;
                return Err(err);
            }
        };

        self.graph = Arc::new(ModuleGraph::from_registry(&self.registry));
        self.services.register_arc(Arc::clone(&self.graph));
        self.state = BootstrapState::Resolved;

        tracing::info!(
            "Resolved {} ({} new, {} total): {}",
            root.short_name(),
            loaded,
            self.registry.len(),
            self.registry
                .ids()
                .map(|id| id.short_name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(loaded)
    }

    /// Check that `id` names a loadable module type.
    pub fn validate_module_type(&self, id: &ModuleId) -> Result<()> {
        validate_module_type(id)
    }

    /// Run PreConfigure, Configure and PostConfigure, each as a full pass.
    ///
    /// Afterwards the container is frozen and shared with the
    /// initialization phases.
    #[tracing::instrument(name = "configure_modules", skip_all, fields(bootstrap_id = %self.bootstrap_id))]
    pub async fn configure_modules(&mut self) -> Result<()> {
        let family = PhaseFamily::Configuration;
        self.expect_state(family.entry_state(), "configure modules")?;

        for phase in family.phases() {
            if let Err(err) = self.run_configuration_phase(phase).await {
                self.state = BootstrapState::Failed;
                return Err(err);
            }
            self.state = phase.completed_state();
        }

        let services = std::mem::take(&mut self.services);
        self.shared = Some(Arc::new(services));
        Ok(())
    }

    /// Run PreInitialize, Initialize and PostInitialize, each as a full pass.
    #[tracing::instrument(name = "initialize_modules", skip_all, fields(bootstrap_id = %self.bootstrap_id))]
    pub async fn initialize_modules(&mut self) -> Result<()> {
        let family = PhaseFamily::Initialization;
        self.expect_state(family.entry_state(), "initialize modules")?;

        for phase in family.phases() {
            if let Err(err) = self.run_initialization_phase(phase).await {
                self.state = BootstrapState::Failed;
                return Err(err);
            }
            self.state = phase.completed_state();
        }
        Ok(())
    }

    async fn run_configuration_phase(&mut self, phase: LifecyclePhase) -> Result<()> {
        let started = Instant::now();
        tracing::info!("Running {} hooks ({} modules)...", phase, self.registry.len());

        let cancel = &self.cancel;
        let mut ctx = ConfigurationContext::new(&mut self.services, &self.config, &self.graph);
        for node in self.registry.iter_mut() {
            let id = node.id();
            ensure_not_cancelled(cancel, phase, id)?;
            tracing::debug!("{}: {}", phase, id.short_name());

            let module = node.instance_mut();
            let outcome = match phase {
                LifecyclePhase::PreConfigure => module.pre_configure(&mut ctx, cancel).await,
                LifecyclePhase::Configure => module.configure(&mut ctx, cancel).await,
                LifecyclePhase::PostConfigure => module.post_configure(&mut ctx, cancel).await,
                other => Err(anyhow::anyhow!("{} is not a configuration phase", other)),
            };
            outcome.map_err(|e| phase_failed(phase, id, e))?;
        }

        tracing::info!("{} complete in {:?}", phase, started.elapsed());
        Ok(())
    }

    async fn run_initialization_phase(&mut self, phase: LifecyclePhase) -> Result<()> {
        let started = Instant::now();
        tracing::info!("Running {} hooks ({} modules)...", phase, self.registry.len());

        let Some(services) = self.shared.as_ref() else {
            return Err(BootstrapError::InvalidState {
                operation: "initialize modules",
                state: self.state,
            });
        };
        let cancel = &self.cancel;
        let mut ctx = InitializationContext::new(services, &self.config, &self.graph);
        for node in self.registry.iter_mut() {
            let id = node.id();
            ensure_not_cancelled(cancel, phase, id)?;
            tracing::debug!("{}: {}", phase, id.short_name());

            let module = node.instance_mut();
            let outcome = match phase {
                LifecyclePhase::PreInitialize => module.pre_initialize(&mut ctx, cancel).await,
                LifecyclePhase::Initialize => module.initialize(&mut ctx, cancel).await,
                LifecyclePhase::PostInitialize => module.post_initialize(&mut ctx, cancel).await,
                other => Err(anyhow::anyhow!("{} is not an initialization phase", other)),
            };
            outcome.map_err(|e| phase_failed(phase, id, e))?;
        }

        tracing::info!("{} complete in {:?}", phase, started.elapsed());
        Ok(())
    }

    pub(super) fn expect_state(
        &self,
        expected: BootstrapState,
        operation: &'static str,
    ) -> Result<()> {
        if self.state != expected {
            return Err(BootstrapError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Snapshot of the resolved modules, also registered in the container.
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// The service container, whether still being configured or already frozen.
    pub fn services(&self) -> &ServiceContainer {
        self.shared.as_deref().unwrap_or(&self.services)
    }

    /// The frozen container, available once configuration has finished.
    pub fn shared_services(&self) -> Option<Arc<ServiceContainer>> {
        self.shared.clone()
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Token checked between module invocations. Cancelling it aborts the
    /// running phase before the next module.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn bootstrap_id(&self) -> Uuid {
        self.bootstrap_id
    }

    /// Give up the kernel and keep the container.
    pub fn into_services(self) -> Arc<ServiceContainer> {
        match self.shared {
            Some(shared) => shared,
            None => Arc::new(self.services),
        }
    }
}

pub(super) fn ensure_not_cancelled(
    cancel: &CancellationToken,
    phase: LifecyclePhase,
    id: ModuleId,
) -> Result<()> {
    if cancel.is_cancelled() {
        tracing::warn!("{} cancelled before {}", phase, id.short_name());
        return Err(BootstrapError::Cancelled {
            phase,
            module: id.name(),
        });
    }
    Ok(())
}

pub(super) fn phase_failed(
    phase: LifecyclePhase,
    id: ModuleId,
    source: anyhow::Error,
) -> BootstrapError {
    tracing::error!("{} failed for {}: {:#}", phase, id.short_name(), source);
    BootstrapError::PhaseFailed {
        phase,
        module: id.name(),
        source,
    }
}

/// Builder for [`ModuleKernel`].
#[derive(Default)]
pub struct ModuleKernelBuilder {
    config: Option<ConfigService>,
    services: Option<ServiceContainer>,
    cancel: Option<CancellationToken>,
}

impl ModuleKernelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration visible to every hook. Defaults to an empty [`ConfigService`].
    pub fn config(mut self, config: ConfigService) -> Self {
        self.config = Some(config);
        self
    }

    /// Start from a container that already holds host-provided services.
    pub fn services(mut self, services: ServiceContainer) -> Self {
        self.services = Some(services);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build<Root: ModuleType>(self) -> Result<ModuleKernel> {
        self.build_with(ModuleId::of::<Root>())
    }

    /// Build the kernel and resolve `root`.
    pub fn build_with(self, root: ModuleId) -> Result<ModuleKernel> {
        let config = self.config.unwrap_or_default();
        let mut services = self.services.unwrap_or_default();
        services.register(config.clone());

        let mut kernel = ModuleKernel {
            registry: ModuleRegistry::new(),
            resolver: DependencyResolver::new(),
            services,
            shared: None,
            config,
            graph: Arc::new(ModuleGraph::default()),
            cancel: self.cancel.unwrap_or_default(),
            state: BootstrapState::Unresolved,
            bootstrap_id: Uuid::new_v4(),
        };

        tracing::info!(
            bootstrap_id = %kernel.bootstrap_id,
            "Starting bootstrap from {}",
            root.short_name()
        );
        kernel.load_modules(root)?;
        Ok(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{DependsOn, Module};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Shared record of hook invocations, registered in the container up front.
    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl Journal {
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    fn record(services: &ServiceContainer, entry: &str) -> anyhow::Result<()> {
        services.resolve::<Journal>()?.0.lock().unwrap().push(entry.to_string());
        Ok(())
    }

    macro_rules! recording_module {
        ($name:ident $(=> $($dep:ident),+)?) => {
            struct $name;

            impl ModuleType for $name {
                fn create(_deps: &mut DependsOn) -> Self {
                    $($(_deps.module::<$dep>();)+)?
                    $name
                }
            }

            #[async_trait]
            impl Module for $name {
                async fn pre_configure(&mut self, ctx: &mut ConfigurationContext<'_>, _cancel: &CancellationToken) -> anyhow::Result<()> {
                    record(ctx.services(), concat!(stringify!($name), ":PreConfigure"))
                }

                async fn configure(&mut self, ctx: &mut ConfigurationContext<'_>, _cancel: &CancellationToken) -> anyhow::Result<()> {
                    record(ctx.services(), concat!(stringify!($name), ":Configure"))
                }

                async fn post_configure(&mut self, ctx: &mut ConfigurationContext<'_>, _cancel: &CancellationToken) -> anyhow::Result<()> {
                    record(ctx.services(), concat!(stringify!($name), ":PostConfigure"))
                }

                async fn pre_initialize(&mut self, ctx: &mut InitializationContext<'_>, _cancel: &CancellationToken) -> anyhow::Result<()> {
                    record(ctx.services(), concat!(stringify!($name), ":PreInitialize"))
                }

                async fn initialize(&mut self, ctx: &mut InitializationContext<'_>, _cancel: &CancellationToken) -> anyhow::Result<()> {
                    record(ctx.services(), concat!(stringify!($name), ":Initialize"))
                }

                async fn post_initialize(&mut self, ctx: &mut InitializationContext<'_>, _cancel: &CancellationToken) -> anyhow::Result<()> {
                    record(ctx.services(), concat!(stringify!($name), ":PostInitialize"))
                }
            }
        };
    }

    recording_module!(Leaf);
    recording_module!(Root => Leaf);
    recording_module!(Tail);
    recording_module!(CycleA => CycleB);
    recording_module!(CycleB => CycleA);

    #[derive(Debug, thiserror::Error)]
    #[error("flaky module exploded")]
    struct FlakyError;

    struct Flaky;

    impl ModuleType for Flaky {
        fn create(_deps: &mut DependsOn) -> Self {
            Flaky
        }
    }

    #[async_trait]
    impl Module for Flaky {
        async fn pre_configure(
            &mut self,
            _ctx: &mut ConfigurationContext<'_>,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            Err(FlakyError.into())
        }

        async fn configure(
            &mut self,
            ctx: &mut ConfigurationContext<'_>,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            record(ctx.services(), "Flaky:Configure")
        }

        async fn post_configure(
            &mut self,
            ctx: &mut ConfigurationContext<'_>,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            record(ctx.services(), "Flaky:PostConfigure")
        }
    }

    recording_module!(FlakyApp => Leaf, Flaky, Tail);

    struct BrokenInit;

    impl ModuleType for BrokenInit {
        fn create(deps: &mut DependsOn) -> Self {
            deps.module::<Leaf>();
            BrokenInit
        }
    }

    #[async_trait]
    impl Module for BrokenInit {
        async fn initialize(
            &mut self,
            _ctx: &mut InitializationContext<'_>,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            anyhow::bail!("cannot reach database")
        }
    }

    /// Cancels bootstrap from inside its own configure hook.
    struct Interrupter;

    impl ModuleType for Interrupter {
        fn create(deps: &mut DependsOn) -> Self {
            deps.module::<Leaf>();
            Interrupter
        }
    }

    #[async_trait]
    impl Module for Interrupter {
        async fn configure(
            &mut self,
            ctx: &mut ConfigurationContext<'_>,
            cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            record(ctx.services(), "Interrupter:Configure")?;
            cancel.cancel();
            Ok(())
        }
    }

    recording_module!(InterruptedApp => Interrupter, Tail);

    struct Greeting(&'static str);

    struct Greeter;

    impl ModuleType for Greeter {
        fn create(_deps: &mut DependsOn) -> Self {
            Greeter
        }
    }

    #[async_trait]
    impl Module for Greeter {
        async fn configure(
            &mut self,
            ctx: &mut ConfigurationContext<'_>,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            let greeting = ctx.configuration().get_or("GREETING", "hello");
            let greeting: &'static str = Box::leak(greeting.into_boxed_str());
            ctx.services_mut().register(Greeting(greeting));
            Ok(())
        }
    }

    struct GreetingConsumer;

    impl ModuleType for GreetingConsumer {
        fn create(deps: &mut DependsOn) -> Self {
            deps.module::<Greeter>();
            GreetingConsumer
        }
    }

    #[async_trait]
    impl Module for GreetingConsumer {
        async fn pre_configure(
            &mut self,
            ctx: &mut ConfigurationContext<'_>,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            let modules = ctx.modules();
            let me = modules
                .position(&ModuleId::of::<GreetingConsumer>())
                .ok_or_else(|| anyhow::anyhow!("not in graph"))?;
            let greeter = modules
                .position(&ModuleId::of::<Greeter>())
                .ok_or_else(|| anyhow::anyhow!("greeter not in graph"))?;
            anyhow::ensure!(greeter < me, "greeter must load first");
            Ok(())
        }

        async fn initialize(
            &mut self,
            ctx: &mut InitializationContext<'_>,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            let greeting = ctx.services().resolve::<Greeting>()?;
            record(ctx.services(), greeting.0)
        }
    }

    fn kernel_with_journal(root: ModuleId) -> (Result<ModuleKernel>, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let mut services = ServiceContainer::new();
        services.register_arc(Arc::clone(&journal));
        let kernel = ModuleKernel::builder().services(services).build_with(root);
        (kernel, journal)
    }

    fn names(kernel: &ModuleKernel) -> Vec<&'static str> {
        kernel.registry().ids().map(|id| id.short_name()).collect()
    }

    #[test]
    fn test_construction_resolves_root() {
        let (kernel, journal) = kernel_with_journal(ModuleId::of::<Root>());
        let kernel = kernel.unwrap();

        assert_eq!(names(&kernel), vec!["Leaf", "Root"]);
        assert_eq!(kernel.state(), BootstrapState::Resolved);
        assert!(kernel.services().contains::<ModuleGraph>());
        assert!(kernel.services().contains::<ConfigService>());
        assert_eq!(
            kernel.services().resolve::<ModuleGraph>().unwrap().len(),
            2
        );
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_construction_fails_on_cycle() {
        let (kernel, _journal) = kernel_with_journal(ModuleId::of::<CycleA>());
        assert!(matches!(
            kernel,
            Err(BootstrapError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_construction_fails_on_invalid_root() {
        let result = ModuleKernel::builder().build_with(ModuleId::of_type::<String>());
        assert!(matches!(
            result,
            Err(BootstrapError::InvalidModuleType { .. })
        ));
    }

    #[tokio::test]
    async fn test_configure_runs_full_passes_in_order() {
        let (kernel, journal) = kernel_with_journal(ModuleId::of::<Root>());
        let mut kernel = kernel.unwrap();

        kernel.configure_modules().await.unwrap();

        assert_eq!(
            journal.entries(),
            vec![
                "Leaf:PreConfigure",
                "Root:PreConfigure",
                "Leaf:Configure",
                "Root:Configure",
                "Leaf:PostConfigure",
                "Root:PostConfigure",
            ]
        );
        assert_eq!(kernel.state(), BootstrapState::PostConfigured);
        assert!(kernel.shared_services().is_some());
    }

    #[tokio::test]
    async fn test_initialize_runs_full_passes_in_order() {
        let (kernel, journal) = kernel_with_journal(ModuleId::of::<Root>());
        let mut kernel = kernel.unwrap();

        kernel.configure_modules().await.unwrap();
        kernel.initialize_modules().await.unwrap();

        assert_eq!(
            journal.entries()[6..],
            [
                "Leaf:PreInitialize",
                "Root:PreInitialize",
                "Leaf:Initialize",
                "Root:Initialize",
                "Leaf:PostInitialize",
                "Root:PostInitialize",
            ]
        );
        assert_eq!(journal.entries().len(), 12);
        assert_eq!(kernel.state(), BootstrapState::PostInitialized);
    }

    #[tokio::test]
    async fn test_initialize_requires_configuration() {
        let (kernel, journal) = kernel_with_journal(ModuleId::of::<Root>());
        let mut kernel = kernel.unwrap();

        let err = kernel.initialize_modules().await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::InvalidState {
                state: BootstrapState::Resolved,
                ..
            }
        ));
        assert_eq!(kernel.state(), BootstrapState::Resolved);
        assert!(journal.entries().is_empty());
    }

    #[tokio::test]
    async fn test_pre_configure_failure_is_fatal() {
        let (kernel, journal) = kernel_with_journal(ModuleId::of::<FlakyApp>());
        let mut kernel = kernel.unwrap();
        assert_eq!(names(&kernel), vec!["Leaf", "Flaky", "Tail", "FlakyApp"]);

        let err = kernel.configure_modules().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            format!(
                "phase 'PreConfigure' failed for module '{}'; see cause",
                ModuleId::of::<Flaky>().name()
            )
        );
        match &err {
            BootstrapError::PhaseFailed {
                phase,
                module,
                source,
            } => {
                assert_eq!(*phase, LifecyclePhase::PreConfigure);
                assert_eq!(*module, ModuleId::of::<Flaky>().name());
                assert!(source.downcast_ref::<FlakyError>().is_some());
            }
            other => panic!("expected phase failure, got {:?}", other),
        }

        // Nothing after Flaky ran, and no later phase started.
        assert_eq!(journal.entries(), vec!["Leaf:PreConfigure"]);
        assert_eq!(kernel.state(), BootstrapState::Failed);

        assert!(matches!(
            kernel.configure_modules().await,
            Err(BootstrapError::InvalidState {
                state: BootstrapState::Failed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_initialize_failure_stops_later_phases() {
        let (kernel, journal) = kernel_with_journal(ModuleId::of::<BrokenInit>());
        let mut kernel = kernel.unwrap();

        kernel.configure_modules().await.unwrap();
        let err = kernel.initialize_modules().await.unwrap_err();

        assert_eq!(err.phase(), Some(LifecyclePhase::Initialize));
        assert_eq!(err.module(), Some(ModuleId::of::<BrokenInit>().name()));
        assert_eq!(
            std::error::Error::source(&err).unwrap().to_string(),
            "cannot reach database"
        );
        assert_eq!(
            journal.entries()[3..],
            ["Leaf:PreInitialize", "Leaf:Initialize"]
        );
        assert_eq!(kernel.state(), BootstrapState::Failed);
    }

    #[tokio::test]
    async fn test_cancellation_between_modules() {
        let (kernel, journal) = kernel_with_journal(ModuleId::of::<InterruptedApp>());
        let mut kernel = kernel.unwrap();
        assert_eq!(
            names(&kernel),
            vec!["Leaf", "Interrupter", "Tail", "InterruptedApp"]
        );

        let err = kernel.configure_modules().await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.phase(), Some(LifecyclePhase::Configure));
        assert_eq!(err.module(), Some(ModuleId::of::<Tail>().name()));
        assert_eq!(
            journal.entries()[3..],
            ["Leaf:Configure", "Interrupter:Configure"]
        );
        assert_eq!(kernel.state(), BootstrapState::Failed);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        let mut kernel = ModuleKernel::builder()
            .cancellation_token(token.clone())
            .build::<Greeter>()
            .unwrap();

        token.cancel();
        let err = kernel.configure_modules().await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Cancelled {
                phase: LifecyclePhase::PreConfigure,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_services_flow_from_configure_to_initialize() {
        let (kernel, journal) = {
            let journal = Arc::new(Journal::default());
            let mut services = ServiceContainer::new();
            services.register_arc(Arc::clone(&journal));
            let kernel = ModuleKernel::builder()
                .services(services)
                .config(ConfigService::from_pairs([("GREETING", "bonjour")]))
                .build::<GreetingConsumer>();
            (kernel, journal)
        };
        let mut kernel = kernel.unwrap();

        kernel.configure_modules().await.unwrap();
        kernel.initialize_modules().await.unwrap();

        assert_eq!(journal.entries(), vec!["bonjour"]);
        let services = kernel.into_services();
        assert_eq!(services.resolve::<Greeting>().unwrap().0, "bonjour");
    }

    #[tokio::test]
    async fn test_load_modules_only_before_configuration() {
        let (kernel, _journal) = kernel_with_journal(ModuleId::of::<Leaf>());
        let mut kernel = kernel.unwrap();

        assert_eq!(kernel.load_modules(ModuleId::of::<Root>()).unwrap(), 1);
        assert_eq!(kernel.load_modules(ModuleId::of::<Root>()).unwrap(), 0);
        assert_eq!(names(&kernel), vec!["Leaf", "Root"]);
        assert_eq!(kernel.graph().len(), 2);

        kernel.configure_modules().await.unwrap();
        assert!(matches!(
            kernel.load_modules(ModuleId::of::<Tail>()),
            Err(BootstrapError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_failed_load_is_fatal() {
        let (kernel, _journal) = kernel_with_journal(ModuleId::of::<Leaf>());
        let mut kernel = kernel.unwrap();

        assert!(kernel.load_modules(ModuleId::of::<CycleB>()).is_err());
        assert_eq!(names(&kernel), vec!["Leaf"]);
        assert_eq!(kernel.state(), BootstrapState::Failed);
    }

    /// Collects `(span name, bootstrap_id)` for every span that carries the field.
    #[derive(Clone, Default)]
    struct BootstrapSpans(Arc<Mutex<Vec<(String, String)>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for BootstrapSpans {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct BootstrapId(Option<String>);

            impl tracing::field::Visit for BootstrapId {
                fn record_debug(
                    &mut self,
                    field: &tracing::field::Field,
                    value: &dyn std::fmt::Debug,
                ) {
                    if field.name() == "bootstrap_id" {
                        self.0 = Some(format!("{:?}", value));
                    }
                }
            }

            let mut visitor = BootstrapId(None);
            attrs.record(&mut visitor);
            if let Some(id) = visitor.0 {
                self.0
                    .lock()
                    .unwrap()
                    .push((attrs.metadata().name().to_string(), id));
            }
        }
    }

    #[test]
    fn test_load_modules_runs_in_bootstrap_span() {
        use tracing_subscriber::layer::SubscriberExt;

        let (kernel, _journal) = kernel_with_journal(ModuleId::of::<Leaf>());
        let mut kernel = kernel.unwrap();

        let spans = BootstrapSpans::default();
        let subscriber = tracing_subscriber::registry().with(spans.clone());
        let loaded = tracing::subscriber::with_default(subscriber, || {
            kernel.load_modules(ModuleId::of::<Root>())
        });

        assert_eq!(loaded.unwrap(), 1);
        assert_eq!(
            spans.0.lock().unwrap().clone(),
            vec![(
                "load_modules".to_string(),
                kernel.bootstrap_id().to_string()
            )]
        );
    }

    #[test]
    fn test_validate_module_type() {
        let (kernel, _journal) = kernel_with_journal(ModuleId::of::<Leaf>());
        let kernel = kernel.unwrap();

        assert!(kernel.validate_module_type(&ModuleId::of::<Root>()).is_ok());
        assert!(matches!(
            kernel.validate_module_type(&ModuleId::of_type::<String>()),
            Err(BootstrapError::InvalidModuleType { .. })
        ));
        assert!(matches!(
            kernel.validate_module_type(&ModuleId::of_type::<Root>()),
            Err(BootstrapError::InvalidModuleType { .. })
        ));
    }
}
