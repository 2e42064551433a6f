//! In-memory counter engine
//!
//! Follows the same state machine as the perf engine without touching the
//! hardware. Every call is recorded so tests can assert exactly what the
//! coordinator asked for, and start/pause failures can be injected.

use log::{debug, warn};

use super::{CounterControl, Reading, SamplingState};
use crate::domain::{CounterError, CounterKind, Pid, SamplingMode};

/// One call made against the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterCall {
    StopAll,
    StartProfiling,
    StartLowLatency(Option<Pid>),
    Pause(CounterKind),
    Resume(CounterKind),
}

#[derive(Debug, Default)]
pub struct SimulatedCounters {
    state: SamplingState,
    calls: Vec<CounterCall>,
    fail_next_start: bool,
    fail_next_pause: bool,
    ticks: u64,
}

impl SimulatedCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine already running a profiling session, with the call log empty
    #[must_use]
    pub fn profiling() -> Self {
        let mut counters = Self::new();
        counters.state.begin(SamplingMode::Profiling);
        counters
    }

    /// Engine already running a low-latency session, with the call log empty
    #[must_use]
    pub fn low_latency() -> Self {
        let mut counters = Self::new();
        counters.state.begin(SamplingMode::LowLatency);
        counters
    }

    /// Make the next `start_*` call fail
    pub fn fail_next_start(&mut self) {
        self.fail_next_start = true;
    }

    /// Make the next `pause` call fail
    pub fn fail_next_pause(&mut self) {
        self.fail_next_pause = true;
    }

    #[must_use]
    pub fn calls(&self) -> &[CounterCall] {
        &self.calls
    }

    /// Number of real session starts (profiling or low-latency)
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, CounterCall::StartProfiling | CounterCall::StartLowLatency(_)))
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn take_start_failure(&mut self) -> Result<(), CounterError> {
        if std::mem::take(&mut self.fail_next_start) {
            warn!("simulated counters: injected start failure");
            return Err(CounterError::Injected("start"));
        }
        Ok(())
    }
}

impl CounterControl for SimulatedCounters {
    fn is_profiling_active(&self) -> bool {
        self.state.mode().is_profiling()
    }

    fn is_low_latency_active(&self) -> bool {
        self.state.mode().is_low_latency()
    }

    fn stop_all(&mut self) {
        self.calls.push(CounterCall::StopAll);
        self.state.clear();
    }

    fn start_profiling(&mut self) -> Result<(), CounterError> {
        self.calls.push(CounterCall::StartProfiling);
        self.take_start_failure()?;
        self.state.begin(SamplingMode::Profiling);
        Ok(())
    }

    fn start_low_latency(&mut self, target: Option<Pid>) -> Result<(), CounterError> {
        self.calls.push(CounterCall::StartLowLatency(target));
        self.take_start_failure()?;
        self.state.begin(SamplingMode::LowLatency);
        Ok(())
    }

    fn pause(&mut self, counter: CounterKind) -> Result<(), CounterError> {
        self.calls.push(CounterCall::Pause(counter));
        if std::mem::take(&mut self.fail_next_pause) {
            return Err(CounterError::Injected("pause"));
        }
        self.state.pause(counter)?;
        Ok(())
    }

    fn resume(&mut self, counter: CounterKind) {
        self.calls.push(CounterCall::Resume(counter));
        if !self.state.resume(counter) {
            debug!("simulated counters: {counter} was not paused");
        }
    }

    fn mode(&self) -> SamplingMode {
        self.state.mode()
    }

    fn readings(&mut self) -> Vec<Reading> {
        if !self.state.mode().is_profiling() {
            return Vec::new();
        }
        self.ticks += 1;
        let paused = self.state.paused();
        CounterKind::ALL
            .iter()
            .zip(1u64..)
            .map(|(&kind, weight)| Reading {
                kind,
                value: self.ticks * weight * 1_000,
                running: paused != Some(kind),
            })
            .collect()
    }
}
