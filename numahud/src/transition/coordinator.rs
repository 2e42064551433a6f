//! Pre-ops and ops gating every view transition
//!
//! The coordinator is the only component that starts, stops, pauses or
//! resumes counters. It owns its engine exclusively, so the sampling mode it
//! reports can never be changed behind its back.
//!
//! ## Sampling Modes
//!
//! ```text
//!          enter_profiling            enter_callchain
//!  Idle ─────────────────▶ Profiling ─────────────────▶ CallchainPartial(k)
//!   │                        ▲  │    ◀─────────────────         │
//!   │                        │  │      leave_callchain          │ quick-select
//!   │   enter_low_latency    │  │                               ▼
//!   └──────────────────▶ LowLatency                     CallchainPartial(k')
//! ```
//!
//! Starting a session always stops everything first; pausing and resuming
//! happen inside the running profiling session.

use log::{debug, info, warn};

use crate::command::{counter_for, Command, RegionTarget};
use crate::counters::CounterControl;
use crate::domain::{CounterKind, EntityRef, SamplingMode, TransitionError};
use crate::views::{ViewKind, ViewStack};

use super::Outcome;

/// Transitions that only have an effect on platforms with latency and
/// node-locality maps
///
/// Every method defaults to a successful no-op, so the dispatcher binds them
/// unconditionally and platforms override only what they support.
pub trait PlatformTransitions {
    /// # Errors
    /// Never fails by default
    fn refresh_latency_map(&mut self, _views: &ViewStack, _cmd: &mut Command) -> Result<Outcome, TransitionError> {
        Ok(Outcome::Continued)
    }

    /// # Errors
    /// Never fails by default
    fn fetch_latency_map(&mut self, _views: &ViewStack, _cmd: &mut Command) -> Result<Outcome, TransitionError> {
        Ok(Outcome::Continued)
    }

    /// # Errors
    /// Never fails by default
    fn enter_node_locality(&mut self, _views: &ViewStack, _cmd: &mut Command) -> Result<Outcome, TransitionError> {
        Ok(Outcome::Continued)
    }

    /// # Errors
    /// Never fails by default
    fn refresh_node_locality(&mut self, _views: &ViewStack, _cmd: &mut Command) -> Result<Outcome, TransitionError> {
        Ok(Outcome::Continued)
    }

    /// # Errors
    /// Never fails by default
    fn fetch_node_locality_map(
        &mut self,
        _views: &ViewStack,
        _cmd: &mut Command,
    ) -> Result<Outcome, TransitionError> {
        Ok(Outcome::Continued)
    }

    /// # Errors
    /// Never fails by default
    fn back_to_latency(&mut self, _views: &ViewStack, _cmd: &mut Command) -> Result<Outcome, TransitionError> {
        Ok(Outcome::Continued)
    }

    /// # Errors
    /// Never fails by default
    fn stop_latency_map(
        &mut self,
        _views: &mut ViewStack,
        _cmd: &mut Command,
        _outcome: Outcome,
    ) -> Result<(), TransitionError> {
        Ok(())
    }

    /// # Errors
    /// Never fails by default
    fn stop_node_locality_map(
        &mut self,
        _views: &mut ViewStack,
        _cmd: &mut Command,
        _outcome: Outcome,
    ) -> Result<(), TransitionError> {
        Ok(())
    }
}

/// Linux has no latency or node-locality maps
impl<C: CounterControl> PlatformTransitions for Coordinator<C> {}

/// Owner of the counter engine and implementer of every pre-op and op
#[derive(Debug)]
pub struct Coordinator<C: CounterControl> {
    counters: C,
}

impl<C: CounterControl> Coordinator<C> {
    pub fn new(counters: C) -> Self {
        Self { counters }
    }

    pub fn counters(&self) -> &C {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut C {
        &mut self.counters
    }

    pub fn mode(&self) -> SamplingMode {
        self.counters.mode()
    }

    // ---- pre-ops ----

    /// Make sure a profiling session runs
    ///
    /// A running session (full or partially paused) is left alone.
    ///
    /// # Errors
    /// `CounterStartFailed` if the engine cannot start; the engine is then idle
    pub fn enter_profiling(&mut self) -> Result<Outcome, TransitionError> {
        if self.counters.is_profiling_active() {
            return Ok(Outcome::Continued);
        }

        self.counters.stop_all();
        self.counters.start_profiling().map_err(TransitionError::CounterStartFailed)?;
        info!("Profiling session started");
        Ok(Outcome::FreshSession)
    }

    /// Make sure a low-latency session runs, without a target constraint
    ///
    /// # Errors
    /// `CounterStartFailed` if the engine cannot start; the engine is then idle
    pub fn enter_low_latency(&mut self) -> Result<Outcome, TransitionError> {
        if self.counters.is_low_latency_active() {
            return Ok(Outcome::Continued);
        }

        self.counters.stop_all();
        self.counters.start_low_latency(None).map_err(TransitionError::CounterStartFailed)?;
        info!("Low-latency session started");
        Ok(Outcome::FreshSession)
    }

    /// Copy the monitored entity into the call-chain command and isolate the
    /// remote-access counter
    ///
    /// # Errors
    /// - `UnsupportedViewForTransition` unless a monitor view is current
    /// - `CounterPauseFailed` if the counter cannot be paused
    pub fn enter_callchain(&mut self, views: &ViewStack, cmd: &mut Command) -> Result<Outcome, TransitionError> {
        let target = match *views.current().kind() {
            ViewKind::ProcessMonitor { pid, .. } => EntityRef::process(pid),
            ViewKind::ThreadMonitor { pid, tid } => EntityRef::thread(pid, tid),
            ref other => return Err(unsupported(cmd, other)),
        };
        self.counters.pause(CounterKind::RemoteAccess).map_err(TransitionError::CounterPauseFailed)?;
        fill_entity(cmd, target)?;
        debug!("call-chain of {target}: remote access isolated");
        Ok(Outcome::FreshSession)
    }

    /// Copy the latency view's entity into the access-destination command
    ///
    /// Only the display changes; counters are untouched.
    ///
    /// # Errors
    /// `UnsupportedViewForTransition` unless a latency view is current
    pub fn enter_access_destination(
        &mut self,
        views: &ViewStack,
        cmd: &mut Command,
    ) -> Result<Outcome, TransitionError> {
        let target = match *views.current().kind() {
            ViewKind::LatencyByProcess { pid, .. } => EntityRef::process(pid),
            ViewKind::LatencyByThread { pid, tid, .. } => EntityRef::thread(pid, tid),
            ref other => return Err(unsupported(cmd, other)),
        };
        fill_entity(cmd, target)?;
        Ok(Outcome::Continued)
    }

    /// Resume the counter remembered by the current call-chain view
    ///
    /// Leaving always ends the attribution session, even when nothing was
    /// remembered and the engine is not touched.
    ///
    /// # Errors
    /// `UnsupportedViewForTransition` unless a call-chain view is current
    pub fn leave_callchain(&mut self, views: &ViewStack, cmd: &Command) -> Result<Outcome, TransitionError> {
        let ViewKind::Callchain { counter, .. } = *views.current().kind() else {
            return Err(unsupported(cmd, views.current().kind()));
        };

        if let Some(kind) = counter {
            self.counters.resume(kind);
            debug!("call-chain left: {kind} resumed");
        }
        Ok(Outcome::FreshSession)
    }

    // ---- ops ----

    /// Copy the monitored entity into the latency command and advance
    ///
    /// # Errors
    /// `UnsupportedViewForTransition` unless a monitor view is current
    pub fn finalize_low_latency_entry(
        &mut self,
        views: &mut ViewStack,
        cmd: &mut Command,
        outcome: Outcome,
    ) -> Result<(), TransitionError> {
        let target = match *views.current().kind() {
            ViewKind::ProcessMonitor { pid, .. } => EntityRef::process(pid),
            ViewKind::ThreadMonitor { pid, tid } => EntityRef::thread(pid, tid),
            ref other => return Err(unsupported(cmd, other)),
        };
        fill_entity(cmd, target)?;
        views.advance_to_next_view(cmd, outcome)
    }

    /// Isolate the counter picked by a quick-select key in the call-chain view
    ///
    /// Identifiers outside the quick-select range do nothing.
    ///
    /// # Errors
    /// - `UnsupportedViewForTransition` unless a call-chain view is current
    /// - `CounterPauseFailed` if the counter cannot be paused; the remembered
    ///   counter is then unchanged
    pub fn record_quick_select_counter(
        &mut self,
        views: &mut ViewStack,
        cmd: &Command,
        _outcome: Outcome,
    ) -> Result<(), TransitionError> {
        let Some(kind) = counter_for(cmd.id()) else {
            debug!("quick-select {} maps to no counter", cmd.id());
            return Ok(());
        };

        if !matches!(views.current().kind(), ViewKind::Callchain { .. }) {
            return Err(unsupported(cmd, views.current().kind()));
        }

        self.counters.pause(kind).map_err(TransitionError::CounterPauseFailed)?;
        if let ViewKind::Callchain { counter, .. } = views.current_mut().kind_mut() {
            *counter = Some(kind);
        }
        views.request_refresh();
        Ok(())
    }

    /// Copy the highlighted latency row into the detail command and advance
    ///
    /// # Errors
    /// - `NoSelection` if rows are not loaded or none is highlighted; the view
    ///   stack is unchanged
    /// - `UnsupportedViewForTransition` unless a latency view is current
    pub fn finalize_callchain_detail_entry(
        &mut self,
        views: &mut ViewStack,
        cmd: &mut Command,
        outcome: Outcome,
    ) -> Result<(), TransitionError> {
        let (target, lines) = match views.current().kind() {
            ViewKind::LatencyByProcess { pid, lines } => (EntityRef::process(*pid), lines),
            ViewKind::LatencyByThread { pid, tid, lines } => (EntityRef::thread(*pid, *tid), lines),
            other => return Err(unsupported(cmd, other)),
        };
        let line = lines.selected().ok_or(TransitionError::NoSelection)?;
        let detail = RegionTarget { target, region: line.region };

        match *cmd {
            Command::LatencyCallchain(ref mut slot) => *slot = Some(detail),
            _ => return Err(TransitionError::MissingContext(cmd.id())),
        }
        views.advance_to_next_view(cmd, outcome)
    }

    /// Advance with whatever the pre-op put into the command
    ///
    /// # Errors
    /// `MissingContext` if the pre-op left the command empty
    pub fn next_view(
        &mut self,
        views: &mut ViewStack,
        cmd: &mut Command,
        outcome: Outcome,
    ) -> Result<(), TransitionError> {
        views.advance_to_next_view(cmd, outcome)
    }

    /// Open the process monitor for the highlighted overview row
    ///
    /// # Errors
    /// - `NoSelection` if no process is highlighted
    /// - `UnsupportedViewForTransition` unless the overview is current
    pub fn select_process(
        &mut self,
        views: &mut ViewStack,
        cmd: &mut Command,
        outcome: Outcome,
    ) -> Result<(), TransitionError> {
        let target = match views.current().kind() {
            ViewKind::Overview { processes } => {
                let row = processes.selected().ok_or(TransitionError::NoSelection)?;
                EntityRef::process(row.pid)
            }
            other => return Err(unsupported(cmd, other)),
        };
        fill_entity(cmd, target)?;
        views.advance_to_next_view(cmd, outcome)
    }

    /// Open the thread monitor for the highlighted thread row
    ///
    /// # Errors
    /// - `NoSelection` if no thread is highlighted
    /// - `UnsupportedViewForTransition` unless a process monitor is current
    pub fn select_thread(
        &mut self,
        views: &mut ViewStack,
        cmd: &mut Command,
        outcome: Outcome,
    ) -> Result<(), TransitionError> {
        let target = match views.current().kind() {
            ViewKind::ProcessMonitor { pid, threads } => {
                let row = threads.selected().ok_or(TransitionError::NoSelection)?;
                EntityRef::thread(*pid, row.tid)
            }
            other => return Err(unsupported(cmd, other)),
        };
        fill_entity(cmd, target)?;
        views.advance_to_next_view(cmd, outcome)
    }

    pub fn go_back(&mut self, views: &mut ViewStack, outcome: Outcome) {
        if !views.go_back(outcome) {
            debug!("back: already at the root view");
        }
    }

    pub fn go_home(&mut self, views: &mut ViewStack, outcome: Outcome) {
        views.go_home(outcome);
    }

    pub fn refresh(&mut self, views: &mut ViewStack) {
        views.request_refresh();
    }

    // ---- recovery ----

    /// Bring the engine back to `previous` after a failed transition
    ///
    /// # Errors
    /// `CounterStartFailed` or `CounterPauseFailed` if the mode cannot be
    /// re-established; the engine is then idle or fully profiling
    pub fn restore_mode(&mut self, previous: SamplingMode) -> Result<(), TransitionError> {
        let current = self.counters.mode();
        if current == previous {
            return Ok(());
        }
        warn!("Restoring sampling mode {previous} (was {current})");

        match (current, previous) {
            // Still inside the same profiling session: only the isolation moved
            (SamplingMode::CallchainPartial(kind), SamplingMode::Profiling) => {
                self.counters.resume(kind);
            }
            (SamplingMode::Profiling | SamplingMode::CallchainPartial(_), SamplingMode::CallchainPartial(kind)) => {
                self.counters.pause(kind).map_err(TransitionError::CounterPauseFailed)?;
            }
            (_, SamplingMode::Idle) => self.counters.stop_all(),
            (_, SamplingMode::Profiling) => {
                self.counters.stop_all();
                self.counters.start_profiling().map_err(TransitionError::CounterStartFailed)?;
            }
            (_, SamplingMode::LowLatency) => {
                self.counters.stop_all();
                self.counters.start_low_latency(None).map_err(TransitionError::CounterStartFailed)?;
            }
            (_, SamplingMode::CallchainPartial(kind)) => {
                self.counters.stop_all();
                self.counters.start_profiling().map_err(TransitionError::CounterStartFailed)?;
                self.counters.pause(kind).map_err(TransitionError::CounterPauseFailed)?;
            }
        }
        Ok(())
    }

    /// Stop every counter before exit
    pub fn shutdown(&mut self) {
        self.counters.stop_all();
        info!("Counters stopped");
    }
}

fn fill_entity(cmd: &mut Command, target: EntityRef) -> Result<(), TransitionError> {
    let id = cmd.id();
    let slot = cmd.entity_slot().ok_or(TransitionError::MissingContext(id))?;
    *slot = Some(target);
    Ok(())
}

fn unsupported(cmd: &Command, view: &ViewKind) -> TransitionError {
    TransitionError::UnsupportedViewForTransition { command: cmd.id(), view: view.name() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::{CounterCall, SimulatedCounters};
    use crate::domain::{Pid, Tid};
    use crate::views::RowBuffer;

    #[test]
    fn test_enter_profiling_from_low_latency_stops_first() {
        let mut coord = Coordinator::new(SimulatedCounters::low_latency());
        assert_eq!(coord.enter_profiling().unwrap(), Outcome::FreshSession);
        assert_eq!(
            coord.counters().calls(),
            &[CounterCall::StopAll, CounterCall::StartProfiling]
        );
        assert!(!coord.counters().is_low_latency_active());
    }

    #[test]
    fn test_enter_callchain_rejects_overview() {
        let mut coord = Coordinator::new(SimulatedCounters::profiling());
        let views = ViewStack::new();
        let mut cmd = Command::Callchain(None);

        let err = coord.enter_callchain(&views, &mut cmd).unwrap_err();
        assert!(matches!(err, TransitionError::UnsupportedViewForTransition { view: "overview", .. }));
        assert_eq!(cmd, Command::Callchain(None));
        assert!(coord.counters().calls().is_empty());
    }

    #[test]
    fn test_failed_pause_leaves_command_empty() {
        let mut coord = Coordinator::new(SimulatedCounters::profiling());
        coord.counters_mut().fail_next_pause();
        let views = ViewStack::with_root(ViewKind::ThreadMonitor { pid: Pid(1), tid: Tid(2) });
        let mut cmd = Command::Callchain(None);

        let err = coord.enter_callchain(&views, &mut cmd).unwrap_err();
        assert!(matches!(err, TransitionError::CounterPauseFailed(_)));
        assert_eq!(cmd, Command::Callchain(None));
        assert_eq!(coord.mode(), SamplingMode::Profiling);
    }

    #[test]
    fn test_leave_callchain_outside_callchain_view() {
        let mut coord = Coordinator::new(SimulatedCounters::profiling());
        let views = ViewStack::new();
        assert!(coord.leave_callchain(&views, &Command::Back).is_err());
    }

    #[test]
    fn test_select_process_needs_highlight() {
        let mut coord = Coordinator::new(SimulatedCounters::profiling());
        let mut views = ViewStack::new();
        let mut cmd = Command::MonitorProcess(None);

        let err = coord.select_process(&mut views, &mut cmd, Outcome::Continued).unwrap_err();
        assert!(matches!(err, TransitionError::NoSelection));
        assert_eq!(views.depth(), 1);
    }

    #[test]
    fn test_select_thread_copies_row() {
        let mut coord = Coordinator::new(SimulatedCounters::profiling());
        let threads = RowBuffer::loaded(vec![crate::views::ThreadRow { tid: Tid(5), command: "w".into() }]);
        let mut views = ViewStack::with_root(ViewKind::ProcessMonitor { pid: Pid(4), threads });
        let mut cmd = Command::MonitorThread(None);

        coord.select_thread(&mut views, &mut cmd, Outcome::Continued).unwrap();
        assert_eq!(cmd, Command::MonitorThread(Some(EntityRef::thread(Pid(4), Tid(5)))));
        assert_eq!(*views.current().kind(), ViewKind::ThreadMonitor { pid: Pid(4), tid: Tid(5) });
    }

    #[test]
    fn test_restore_mode_moves_isolation_back() {
        let mut coord = Coordinator::new(SimulatedCounters::profiling());
        coord.counters_mut().pause(CounterKind::Clock).unwrap();
        coord.counters_mut().clear_calls();

        coord.restore_mode(SamplingMode::Profiling).unwrap();
        assert_eq!(coord.mode(), SamplingMode::Profiling);
        assert_eq!(coord.counters().calls(), &[CounterCall::Resume(CounterKind::Clock)]);

        coord.restore_mode(SamplingMode::LowLatency).unwrap();
        assert_eq!(coord.mode(), SamplingMode::LowLatency);
    }

    #[test]
    fn test_platform_stubs_succeed() {
        let mut coord = Coordinator::new(SimulatedCounters::new());
        let mut views = ViewStack::new();
        let mut cmd = Command::LatencyMap;

        assert_eq!(coord.fetch_latency_map(&views, &mut cmd).unwrap(), Outcome::Continued);
        assert_eq!(coord.back_to_latency(&views, &mut cmd).unwrap(), Outcome::Continued);
        coord.stop_node_locality_map(&mut views, &mut cmd, Outcome::Continued).unwrap();
        assert!(coord.counters().calls().is_empty());
        assert_eq!(views.depth(), 1);
    }
}
