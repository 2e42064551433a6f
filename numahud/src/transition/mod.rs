//! Sampling-mode transitions
//!
//! Every navigation command runs as pre-op → navigation → op:
//!
//! - a **pre-op** runs against the current view before anything moves; it may
//!   veto the command and may start, stop or pause counters
//! - the **op** performs or finalizes the navigation, copying identity out of
//!   the current view into the command before the view stack reads it
//!
//! [`Coordinator`] implements the individual pre-ops and ops on top of a
//! [`CounterControl`](crate::counters::CounterControl) engine, and
//! [`Dispatcher`] binds them to commands.

pub mod coordinator;
pub mod dispatch;

pub use coordinator::{Coordinator, PlatformTransitions};
pub use dispatch::Dispatcher;

/// Result flag of a pre-op, handed on to the op
///
/// `FreshSession` means a sampling session was started (or a specialised one
/// ended), so the view that becomes current has no valid samples yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Continued,
    FreshSession,
}

impl Outcome {
    #[must_use]
    pub fn is_fresh(self) -> bool {
        self == Outcome::FreshSession
    }

    /// `FreshSession` if either side is
    #[must_use]
    pub fn or(self, other: Outcome) -> Outcome {
        if self.is_fresh() || other.is_fresh() {
            Outcome::FreshSession
        } else {
            Outcome::Continued
        }
    }
}
