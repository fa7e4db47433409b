use crate::lifecycle::{BootstrapState, LifecyclePhase};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Everything that can abort a bootstrap call.
///
/// All variants are fatal: the kernel never retries and never swallows them.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid module type '{type_name}': {reason}")]
    InvalidModuleType {
        type_name: &'static str,
        reason: String,
    },

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<&'static str> },

    #[error("phase '{phase}' failed for module '{module}'; see cause")]
    PhaseFailed {
        phase: LifecyclePhase,
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("phase '{phase}' was cancelled before module '{module}'")]
    Cancelled {
        phase: LifecyclePhase,
        module: &'static str,
    },

    #[error("Cannot {operation} while bootstrap is {state}")]
    InvalidState {
        operation: &'static str,
        state: BootstrapState,
    },

    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },
}

impl BootstrapError {
    /// The phase this error was raised in, if it came from a phase pass.
    pub fn phase(&self) -> Option<LifecyclePhase> {
        match self {
            Self::PhaseFailed { phase, .. } | Self::Cancelled { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The module that failed (or would have run next, for cancellation).
    pub fn module(&self) -> Option<&'static str> {
        match self {
            Self::PhaseFailed { module, .. } | Self::Cancelled { module, .. } => Some(module),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_failure_message() {
        let err = BootstrapError::PhaseFailed {
            phase: LifecyclePhase::PreConfigure,
            module: "FlakyModule",
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(
            err.to_string(),
            "phase 'PreConfigure' failed for module 'FlakyModule'; see cause"
        );
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "boom");
        assert_eq!(err.phase(), Some(LifecyclePhase::PreConfigure));
        assert_eq!(err.module(), Some("FlakyModule"));
    }

    #[test]
    fn test_cycle_message() {
        let err = BootstrapError::CircularDependency {
            cycle: vec!["A", "B", "A"],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
        assert!(err.phase().is_none());
    }
}
