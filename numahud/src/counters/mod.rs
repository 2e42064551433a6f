//! Hardware counter engines
//!
//! The transition coordinator drives counters only through the
//! [`CounterControl`] capability:
//! - [`PerfCounters`] - system-wide `perf_event_open(2)` counters (Linux)
//! - [`SimulatedCounters`] - in-memory engine for tests and `--simulate`
//!
//! Each engine owns a [`SamplingState`], the single authoritative record of
//! which configuration is active.

pub mod cpu_utils;
pub mod perf;
pub mod simulated;
pub mod state;

pub use cpu_utils::{online_cpus, online_nodes};
pub use perf::{PerfConfig, PerfCounters};
pub use simulated::{CounterCall, SimulatedCounters};
pub use state::SamplingState;

use crate::domain::{CounterError, CounterKind, Pid, SamplingMode};

/// Current value of one profiling counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub kind: CounterKind,
    pub value: u64,
    /// False while the counter is paused for call-chain attribution
    pub running: bool,
}

/// Start/stop/pause capability over the hardware counters
///
/// Starting a session never stops the current one implicitly; the coordinator
/// calls [`CounterControl::stop_all`] first.
pub trait CounterControl {
    /// True while a profiling session (full or partially paused) runs
    fn is_profiling_active(&self) -> bool;

    fn is_low_latency_active(&self) -> bool;

    /// Stop and release every counter; the engine returns to idle
    fn stop_all(&mut self);

    /// # Errors
    /// Returns an error if any profiling counter cannot be opened or enabled
    fn start_profiling(&mut self) -> Result<(), CounterError>;

    /// Start load-latency sampling, optionally restricted to one process
    ///
    /// # Errors
    /// Returns an error if the latency event cannot be opened or enabled
    fn start_low_latency(&mut self, target: Option<Pid>) -> Result<(), CounterError>;

    /// Pause one counter of the running profiling session
    ///
    /// # Errors
    /// Returns an error if profiling is not running or the counter cannot be disabled
    fn pause(&mut self, counter: CounterKind) -> Result<(), CounterError>;

    /// Resume a counter paused by [`CounterControl::pause`]
    fn resume(&mut self, counter: CounterKind);

    fn mode(&self) -> SamplingMode;

    /// Current counter values for display; empty when nothing is profiled
    fn readings(&mut self) -> Vec<Reading> {
        Vec::new()
    }
}
