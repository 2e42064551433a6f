//! Authoritative sampling mode owned by a counter engine
//!
//! Every engine keeps exactly one `SamplingState`; the mode it reports is the
//! only record of what the hardware is currently programmed to count.

use log::debug;

use crate::domain::{CounterError, CounterKind, SamplingMode};

#[derive(Debug, Default)]
pub struct SamplingState {
    mode: SamplingMode,
}

impl SamplingState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Counter currently isolated for call-chain attribution, if any
    #[must_use]
    pub fn paused(&self) -> Option<CounterKind> {
        match self.mode {
            SamplingMode::CallchainPartial(kind) => Some(kind),
            _ => None,
        }
    }

    /// Forget the active configuration (after everything has been stopped)
    pub fn clear(&mut self) -> SamplingMode {
        debug!("sampling state: {} -> idle", self.mode);
        std::mem::take(&mut self.mode)
    }

    /// Record a freshly started session
    ///
    /// Only `Profiling` and `LowLatency` can be started; callers must have
    /// stopped the previous session first.
    pub fn begin(&mut self, mode: SamplingMode) {
        debug_assert!(
            matches!(mode, SamplingMode::Profiling | SamplingMode::LowLatency),
            "only full sessions can be started"
        );
        debug_assert_eq!(self.mode, SamplingMode::Idle, "previous session still active");
        debug!("sampling state: {} -> {mode}", self.mode);
        self.mode = mode;
    }

    /// Isolate `kind` inside the running profiling session
    ///
    /// Returns the counter that was isolated before, so the engine can
    /// re-enable it. Pausing while already partial moves the isolation.
    ///
    /// # Errors
    /// Returns `CounterError::NotProfiling` when no profiling session runs
    pub fn pause(&mut self, kind: CounterKind) -> Result<Option<CounterKind>, CounterError> {
        let previous = match self.mode {
            SamplingMode::Profiling => None,
            SamplingMode::CallchainPartial(prev) => Some(prev),
            SamplingMode::Idle | SamplingMode::LowLatency => {
                return Err(CounterError::NotProfiling(kind))
            }
        };
        debug!("sampling state: {} -> call-chain({})", self.mode, kind.label());
        self.mode = SamplingMode::CallchainPartial(kind);
        Ok(previous.filter(|prev| *prev != kind))
    }

    /// Undo a pause of `kind`; returns false if `kind` was not the paused counter
    pub fn resume(&mut self, kind: CounterKind) -> bool {
        if self.paused() == Some(kind) {
            debug!("sampling state: {} -> profiling", self.mode);
            self.mode = SamplingMode::Profiling;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_requires_profiling() {
        let mut state = SamplingState::new();
        assert!(matches!(
            state.pause(CounterKind::Clock),
            Err(CounterError::NotProfiling(CounterKind::Clock))
        ));

        state.begin(SamplingMode::LowLatency);
        assert!(state.pause(CounterKind::Clock).is_err());
        assert_eq!(state.mode(), SamplingMode::LowLatency);
    }

    #[test]
    fn test_pause_moves_isolation() {
        let mut state = SamplingState::new();
        state.begin(SamplingMode::Profiling);

        assert_eq!(state.pause(CounterKind::RemoteAccess).unwrap(), None);
        assert_eq!(state.pause(CounterKind::Clock).unwrap(), Some(CounterKind::RemoteAccess));
        assert_eq!(state.mode(), SamplingMode::CallchainPartial(CounterKind::Clock));

        // Same counter again: nothing to re-enable
        assert_eq!(state.pause(CounterKind::Clock).unwrap(), None);
    }

    #[test]
    fn test_resume_only_matching_counter() {
        let mut state = SamplingState::new();
        state.begin(SamplingMode::Profiling);
        state.pause(CounterKind::LocalAccess).unwrap();

        assert!(!state.resume(CounterKind::Clock));
        assert_eq!(state.paused(), Some(CounterKind::LocalAccess));
        assert!(state.resume(CounterKind::LocalAccess));
        assert_eq!(state.mode(), SamplingMode::Profiling);
    }

    #[test]
    fn test_clear_returns_previous() {
        let mut state = SamplingState::new();
        state.begin(SamplingMode::Profiling);
        assert_eq!(state.clear(), SamplingMode::Profiling);
        assert_eq!(state.mode(), SamplingMode::Idle);
    }
}
