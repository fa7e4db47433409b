use strum_macros::{Display, EnumIter};

/// One named step of the lifecycle. Each phase is a full pass over the
/// loaded modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum LifecyclePhase {
    PreConfigure,
    Configure,
    PostConfigure,
    PreInitialize,
    Initialize,
    PostInitialize,
    PreApplication,
    Application,
    PostApplication,
}

/// Which context a phase hands to its hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PhaseFamily {
    Configuration,
    Initialization,
    Application,
}

impl PhaseFamily {
    /// The family's phases, in the order they run.
    pub fn phases(self) -> [LifecyclePhase; 3] {
        match self {
            Self::Configuration => LifecyclePhase::CONFIGURATION,
            Self::Initialization => LifecyclePhase::INITIALIZATION,
            Self::Application => LifecyclePhase::APPLICATION,
        }
    }

    /// State a kernel has to be in before the family may run.
    pub fn entry_state(self) -> BootstrapState {
        match self {
            Self::Configuration => BootstrapState::Resolved,
            Self::Initialization => BootstrapState::PostConfigured,
            Self::Application => BootstrapState::PostInitialized,
        }
    }
}

impl LifecyclePhase {
    pub const CONFIGURATION: [LifecyclePhase; 3] =
        [Self::PreConfigure, Self::Configure, Self::PostConfigure];

    pub const INITIALIZATION: [LifecyclePhase; 3] =
        [Self::PreInitialize, Self::Initialize, Self::PostInitialize];

    pub const APPLICATION: [LifecyclePhase; 3] =
        [Self::PreApplication, Self::Application, Self::PostApplication];

    pub fn family(&self) -> PhaseFamily {
        match self {
            Self::PreConfigure | Self::Configure | Self::PostConfigure => {
                PhaseFamily::Configuration
            }
            Self::PreInitialize | Self::Initialize | Self::PostInitialize => {
                PhaseFamily::Initialization
            }
            Self::PreApplication | Self::Application | Self::PostApplication => {
                PhaseFamily::Application
            }
        }
    }

    /// State the kernel is in once this phase has run for every module.
    pub fn completed_state(&self) -> BootstrapState {
        match self {
            Self::PreConfigure => BootstrapState::PreConfigured,
            Self::Configure => BootstrapState::Configured,
            Self::PostConfigure => BootstrapState::PostConfigured,
            Self::PreInitialize => BootstrapState::PreInitialized,
            Self::Initialize => BootstrapState::Initialized,
            Self::PostInitialize => BootstrapState::PostInitialized,
            Self::PreApplication => BootstrapState::PreApplied,
            Self::Application => BootstrapState::Applied,
            Self::PostApplication => BootstrapState::PostApplied,
        }
    }
}

/// Where a kernel is in its linear lifecycle.
///
/// ```text
/// Unresolved → Resolved → PreConfigured → Configured → PostConfigured
///   → PreInitialized → Initialized → PostInitialized
///   → PreApplied → Applied → PostApplied      (host kernels only)
/// ```
///
/// Any failure moves the kernel to `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BootstrapState {
    Unresolved,
    Resolved,
    PreConfigured,
    Configured,
    PostConfigured,
    PreInitialized,
    Initialized,
    PostInitialized,
    PreApplied,
    Applied,
    PostApplied,
    Failed,
}
