//! Structured error types for numahud
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::{CommandId, CounterKind, CpuId};
use thiserror::Error;

/// Failures reported by a counter engine
#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Failed to open {kind} counter on {cpu}: {source}")]
    Open {
        kind: &'static str,
        cpu: CpuId,
        #[source]
        source: std::io::Error,
    },

    #[error("Counter ioctl failed: {0}")]
    Ioctl(#[source] std::io::Error),

    #[error("Cannot pause {0}: profiling is not running")]
    NotProfiling(CounterKind),

    #[error("Permission denied: opening system-wide counters requires root or perf_event_paranoid <= 0")]
    PermissionDenied,

    #[error("Hardware counters are not supported on this platform")]
    Unsupported,

    #[error("Injected failure: {0}")]
    Injected(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why a view transition was refused
///
/// Any of these aborts only the in-flight transition; the sampling mode and
/// view stack are left as they were before the command.
#[derive(Error, Debug)]
pub enum TransitionError {
    #[error("Failed to start counters: {0}")]
    CounterStartFailed(#[source] CounterError),

    #[error("Failed to pause counter: {0}")]
    CounterPauseFailed(#[source] CounterError),

    #[error("{command} is not available from the {view} view")]
    UnsupportedViewForTransition { command: CommandId, view: &'static str },

    #[error("Nothing selected")]
    NoSelection,

    #[error("{0} reached the view stack without a target")]
    MissingContext(CommandId),
}

impl TransitionError {
    /// Benign, user-visible conditions as opposed to counter or dispatch failures
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, TransitionError::NoSelection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_view_display() {
        let err = TransitionError::UnsupportedViewForTransition {
            command: CommandId::CALLCHAIN,
            view: "overview",
        };
        assert_eq!(err.to_string(), "CMD#12 is not available from the overview view");
    }

    #[test]
    fn test_counter_start_failed_chains_source() {
        let err = TransitionError::CounterStartFailed(CounterError::PermissionDenied);
        assert!(err.to_string().starts_with("Failed to start counters"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_no_selection_is_benign() {
        assert!(TransitionError::NoSelection.is_benign());
        assert!(!TransitionError::MissingContext(CommandId::LATENCY).is_benign());
    }
}
