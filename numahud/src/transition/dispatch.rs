//! Command table: which pre-op and op each command runs
//!
//! | command             | pre-op                              | op                                |
//! |---------------------|-------------------------------------|-----------------------------------|
//! | Home                | leave call chain, `enter_profiling` | `go_home`                         |
//! | Refresh             |                                     | `refresh`                         |
//! | Back                | depends on the current view         | `go_back`                         |
//! | MonitorProcess      | `enter_profiling`                   | `select_process`                  |
//! | MonitorThread       | `enter_profiling`                   | `select_thread`                   |
//! | Latency             | `enter_low_latency`                 | `finalize_low_latency_entry`      |
//! | AccessDestination   | `enter_access_destination`          | `next_view`                       |
//! | Callchain           | `enter_callchain`                   | `next_view`                       |
//! | LatencyCallchain    |                                     | `finalize_callchain_detail_entry` |
//! | QuickSelect         |                                     | `record_quick_select_counter`     |
//!
//! The latency and node-locality map commands go to [`PlatformTransitions`].

use log::{debug, warn};

use super::{Coordinator, Outcome, PlatformTransitions};
use crate::command::Command;
use crate::counters::CounterControl;
use crate::domain::TransitionError;
use crate::export::TransitionJournal;
use crate::views::{ViewKind, ViewStack};

/// Runs commands through the coordinator and journals each one
#[derive(Debug)]
pub struct Dispatcher<C: CounterControl> {
    coordinator: Coordinator<C>,
    journal: TransitionJournal,
}

impl<C: CounterControl> Dispatcher<C> {
    pub fn new(coordinator: Coordinator<C>) -> Self {
        Self { coordinator, journal: TransitionJournal::new() }
    }

    pub fn coordinator(&self) -> &Coordinator<C> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut Coordinator<C> {
        &mut self.coordinator
    }

    pub fn journal(&self) -> &TransitionJournal {
        &self.journal
    }

    /// Run pre-op then op for `cmd`
    ///
    /// On failure the view stack is as it was before the command, and the
    /// sampling mode is restored if the pre-op had already changed it.
    ///
    /// # Errors
    /// Whatever the failing pre-op or op reported
    pub fn dispatch(&mut self, views: &mut ViewStack, mut cmd: Command) -> Result<Outcome, TransitionError> {
        let mode_before = self.coordinator.mode();
        let view_before = views.current().kind().name();

        let result = self.run(views, &mut cmd);

        if let Err(err) = &result {
            debug!("{} failed: {err}", cmd.name());
            if self.coordinator.mode() != mode_before {
                if let Err(restore_err) = self.coordinator.restore_mode(mode_before) {
                    warn!("Could not restore sampling mode {mode_before}: {restore_err}");
                }
            }
        }

        self.journal.record(
            cmd.name(),
            view_before,
            views.current().kind().name(),
            mode_before,
            self.coordinator.mode(),
            result.as_ref().is_ok_and(|outcome| outcome.is_fresh()),
            result.as_ref().err().map(ToString::to_string),
        );
        result
    }

    fn run(&mut self, views: &mut ViewStack, cmd: &mut Command) -> Result<Outcome, TransitionError> {
        let outcome = pre_op(&mut self.coordinator, views, cmd)?;
        op(&mut self.coordinator, views, cmd, outcome)?;
        Ok(outcome)
    }
}

fn pre_op<C: CounterControl>(
    coord: &mut Coordinator<C>,
    views: &ViewStack,
    cmd: &mut Command,
) -> Result<Outcome, TransitionError> {
    match *cmd {
        Command::Home => {
            let left = if matches!(views.current().kind(), ViewKind::Callchain { .. }) {
                coord.leave_callchain(views, cmd)?
            } else {
                Outcome::Continued
            };
            Ok(left.or(coord.enter_profiling()?))
        }
        Command::Back => back_pre_op(coord, views, cmd),
        Command::Refresh | Command::Quit | Command::LatencyCallchain(_) | Command::QuickSelect(_) => {
            Ok(Outcome::Continued)
        }
        Command::MonitorProcess(_) | Command::MonitorThread(_) => coord.enter_profiling(),
        Command::Latency(_) => coord.enter_low_latency(),
        Command::AccessDestination(_) => coord.enter_access_destination(views, cmd),
        Command::Callchain(_) => coord.enter_callchain(views, cmd),
        Command::LatencyMap => coord.fetch_latency_map(views, cmd),
        Command::LatencyMapRefresh => coord.refresh_latency_map(views, cmd),
        Command::NodeLocality => coord.enter_node_locality(views, cmd),
        Command::NodeLocalityRefresh => coord.refresh_node_locality(views, cmd),
        Command::NodeLocalityMap => coord.fetch_node_locality_map(views, cmd),
        Command::BackToLatency => coord.back_to_latency(views, cmd),
    }
}

/// Leaving a call chain resumes its counter; leaving latency for a
/// profiling view brings profiling back
fn back_pre_op<C: CounterControl>(
    coord: &mut Coordinator<C>,
    views: &ViewStack,
    cmd: &mut Command,
) -> Result<Outcome, TransitionError> {
    let current = views.current().kind();
    if matches!(current, ViewKind::Callchain { .. }) {
        return coord.leave_callchain(views, cmd);
    }

    let returns_to_profiling = views.previous().is_some_and(|prev| prev.kind().is_profiling_view());
    if current.is_latency_view() && returns_to_profiling {
        return coord.enter_profiling();
    }
    Ok(Outcome::Continued)
}

fn op<C: CounterControl>(
    coord: &mut Coordinator<C>,
    views: &mut ViewStack,
    cmd: &mut Command,
    outcome: Outcome,
) -> Result<(), TransitionError> {
    match *cmd {
        Command::Home => coord.go_home(views, outcome),
        Command::Refresh => coord.refresh(views),
        Command::Back => coord.go_back(views, outcome),
        Command::MonitorProcess(_) => coord.select_process(views, cmd, outcome)?,
        Command::MonitorThread(_) => coord.select_thread(views, cmd, outcome)?,
        Command::Latency(_) => coord.finalize_low_latency_entry(views, cmd, outcome)?,
        Command::AccessDestination(_) | Command::Callchain(_) => coord.next_view(views, cmd, outcome)?,
        Command::LatencyCallchain(_) => coord.finalize_callchain_detail_entry(views, cmd, outcome)?,
        Command::QuickSelect(_) => coord.record_quick_select_counter(views, cmd, outcome)?,
        Command::LatencyMap => coord.stop_latency_map(views, cmd, outcome)?,
        Command::NodeLocality => coord.stop_node_locality_map(views, cmd, outcome)?,
        Command::Quit
        | Command::LatencyMapRefresh
        | Command::NodeLocalityRefresh
        | Command::NodeLocalityMap
        | Command::BackToLatency => {}
    }
    Ok(())
}
