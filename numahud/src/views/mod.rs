//! # View stack
//!
//! The navigable pages of the UI. The overview is the permanent root, so there
//! is always a current view while commands are processed.
//!
//! ## View Kinds
//!
//! ```text
//! Overview ──Enter──▶ ProcessMonitor ──Enter──▶ ThreadMonitor
//!                        │    │                   │    │
//!                        │    └──C──▶ Callchain ◀─┘    │
//!                        └──L──▶ LatencyByProcess      └──L──▶ LatencyByThread
//!                                   │     │                       │     │
//!                                   │     └──A──▶ AccessDestination ◀───┘
//!                                   └──Enter──▶ LatencyDetail ◀───Enter┘
//! ```
//!
//! The transition coordinator reads identity out of the current view and
//! writes it into commands; only the stack itself creates or drops views.

pub mod rows;
pub mod source;

pub use rows::{LatencyLine, ProcessRow, RowBuffer, ThreadRow};
pub use source::{ProcFs, ViewSource};

use anyhow::Result;

use crate::command::Command;
use crate::domain::{BufferRegion, CounterKind, EntityRef, Pid, Tid, TransitionError};
use crate::transition::Outcome;

/// Every kind of page that can be current
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    Overview { processes: RowBuffer<ProcessRow> },
    ProcessMonitor { pid: Pid, threads: RowBuffer<ThreadRow> },
    ThreadMonitor { pid: Pid, tid: Tid },
    LatencyByProcess { pid: Pid, lines: RowBuffer<LatencyLine> },
    LatencyByThread { pid: Pid, tid: Tid, lines: RowBuffer<LatencyLine> },
    AccessDestination { target: EntityRef },
    /// `counter` is the counter currently paused for this attribution
    Callchain { target: EntityRef, counter: Option<CounterKind> },
    /// Call chains of one memory area picked from a latency view
    LatencyDetail { target: EntityRef, region: BufferRegion },
}

impl ViewKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Overview { .. } => "overview",
            ViewKind::ProcessMonitor { .. } => "process-monitor",
            ViewKind::ThreadMonitor { .. } => "thread-monitor",
            ViewKind::LatencyByProcess { .. } => "latency-by-process",
            ViewKind::LatencyByThread { .. } => "latency-by-thread",
            ViewKind::AccessDestination { .. } => "access-destination",
            ViewKind::Callchain { .. } => "call-chain",
            ViewKind::LatencyDetail { .. } => "latency-detail",
        }
    }

    /// Views whose data comes from the profiling counters
    #[must_use]
    pub fn is_profiling_view(&self) -> bool {
        matches!(
            self,
            ViewKind::Overview { .. }
                | ViewKind::ProcessMonitor { .. }
                | ViewKind::ThreadMonitor { .. }
                | ViewKind::Callchain { .. }
        )
    }

    #[must_use]
    pub fn is_latency_view(&self) -> bool {
        matches!(self, ViewKind::LatencyByProcess { .. } | ViewKind::LatencyByThread { .. })
    }

    /// Title line for rendering
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            ViewKind::Overview { .. } => "Monitored processes".to_string(),
            ViewKind::ProcessMonitor { pid, .. } => format!("Monitoring {pid}"),
            ViewKind::ThreadMonitor { pid, tid } => format!("Monitoring {pid} {tid}"),
            ViewKind::LatencyByProcess { pid, .. } => format!("Memory latency of {pid}"),
            ViewKind::LatencyByThread { pid, tid, .. } => format!("Memory latency of {pid} {tid}"),
            ViewKind::AccessDestination { target } => format!("Memory access destination of {target}"),
            ViewKind::Callchain { target, counter } => match counter {
                Some(kind) => format!("Call-chain of {target} ({})", kind.label()),
                None => format!("Call-chain of {target}"),
            },
            ViewKind::LatencyDetail { target, region } => {
                format!("Call-chain of {target} accessing {region}")
            }
        }
    }
}

/// A page on the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    kind: ViewKind,
    awaiting_samples: bool,
}

impl View {
    #[must_use]
    pub fn new(kind: ViewKind) -> Self {
        Self { kind, awaiting_samples: false }
    }

    #[must_use]
    pub fn kind(&self) -> &ViewKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ViewKind {
        &mut self.kind
    }

    /// True until the first refresh after a new sampling session started
    #[must_use]
    pub fn is_awaiting_samples(&self) -> bool {
        self.awaiting_samples
    }

    pub fn mark_awaiting_samples(&mut self) {
        self.awaiting_samples = true;
    }

    /// Reload row data from `source` and clear the awaiting flag
    ///
    /// The flag is cleared even when the source fails, so a view whose
    /// entity is gone falls back to the normal refresh interval.
    ///
    /// # Errors
    /// Returns an error if the source cannot provide the rows
    pub fn reload(&mut self, source: &dyn ViewSource) -> Result<()> {
        self.awaiting_samples = false;
        match &mut self.kind {
            ViewKind::Overview { processes } => processes.load(source.processes()?),
            ViewKind::ProcessMonitor { pid, threads } => threads.load(source.threads(*pid)?),
            ViewKind::LatencyByProcess { pid, lines } | ViewKind::LatencyByThread { pid, lines, .. } => {
                lines.load(source.regions(*pid)?);
            }
            ViewKind::ThreadMonitor { .. }
            | ViewKind::AccessDestination { .. }
            | ViewKind::Callchain { .. }
            | ViewKind::LatencyDetail { .. } => {}
        }
        Ok(())
    }

    pub fn scroll_up(&mut self) {
        match &mut self.kind {
            ViewKind::Overview { processes } => processes.scroll_up(),
            ViewKind::ProcessMonitor { threads, .. } => threads.scroll_up(),
            ViewKind::LatencyByProcess { lines, .. } | ViewKind::LatencyByThread { lines, .. } => {
                lines.scroll_up();
            }
            _ => {}
        }
    }

    pub fn scroll_down(&mut self) {
        match &mut self.kind {
            ViewKind::Overview { processes } => processes.scroll_down(),
            ViewKind::ProcessMonitor { threads, .. } => threads.scroll_down(),
            ViewKind::LatencyByProcess { lines, .. } | ViewKind::LatencyByThread { lines, .. } => {
                lines.scroll_down();
            }
            _ => {}
        }
    }
}

/// Navigation stack of views, rooted at the overview
#[derive(Debug, Clone)]
pub struct ViewStack {
    root: View,
    stack: Vec<View>,
}

impl Default for ViewStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStack {
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(ViewKind::Overview { processes: RowBuffer::new() })
    }

    /// Stack whose bottom view is `kind` (tests start from arbitrary views)
    #[must_use]
    pub fn with_root(kind: ViewKind) -> Self {
        Self { root: View::new(kind), stack: Vec::new() }
    }

    #[must_use]
    pub fn current(&self) -> &View {
        self.stack.last().unwrap_or(&self.root)
    }

    pub fn current_mut(&mut self) -> &mut View {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    /// The view that `Back` would return to
    #[must_use]
    pub fn previous(&self) -> Option<&View> {
        match self.stack.len() {
            0 => None,
            1 => Some(&self.root),
            n => self.stack.get(n - 2),
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() + 1
    }

    /// Views from root to current
    pub fn iter(&self) -> impl Iterator<Item = &View> {
        std::iter::once(&self.root).chain(self.stack.iter())
    }

    /// Push the view the command navigates to
    ///
    /// The command's target slot must have been filled by its pre-op or op.
    ///
    /// # Errors
    /// Returns `MissingContext` if the command carries no target, or is not a
    /// navigation command at all
    pub fn advance_to_next_view(&mut self, cmd: &Command, outcome: Outcome) -> Result<(), TransitionError> {
        let kind = match *cmd {
            Command::MonitorProcess(Some(target)) => {
                ViewKind::ProcessMonitor { pid: target.pid, threads: RowBuffer::new() }
            }
            Command::MonitorThread(Some(EntityRef { pid, lwpid: Some(tid) })) => {
                ViewKind::ThreadMonitor { pid, tid }
            }
            Command::Latency(Some(EntityRef { pid, lwpid: None })) => {
                ViewKind::LatencyByProcess { pid, lines: RowBuffer::new() }
            }
            Command::Latency(Some(EntityRef { pid, lwpid: Some(tid) })) => {
                ViewKind::LatencyByThread { pid, tid, lines: RowBuffer::new() }
            }
            Command::AccessDestination(Some(target)) => ViewKind::AccessDestination { target },
            // Entering a call chain always isolates the remote-access counter first
            Command::Callchain(Some(target)) => {
                ViewKind::Callchain { target, counter: Some(CounterKind::RemoteAccess) }
            }
            Command::LatencyCallchain(Some(detail)) => {
                ViewKind::LatencyDetail { target: detail.target, region: detail.region }
            }
            _ => return Err(TransitionError::MissingContext(cmd.id())),
        };

        let mut view = View::new(kind);
        if outcome.is_fresh() {
            view.mark_awaiting_samples();
        }
        log::debug!("view stack: push {} (depth {})", view.kind.name(), self.depth() + 1);
        self.stack.push(view);
        Ok(())
    }

    /// Pop the current view; returns false at the root
    pub fn go_back(&mut self, outcome: Outcome) -> bool {
        let Some(popped) = self.stack.pop() else {
            return false;
        };
        log::debug!("view stack: pop {}", popped.kind.name());
        if outcome.is_fresh() {
            self.current_mut().mark_awaiting_samples();
        }
        true
    }

    /// Drop everything above the root
    pub fn go_home(&mut self, outcome: Outcome) {
        self.stack.clear();
        if outcome.is_fresh() {
            self.root.mark_awaiting_samples();
        }
    }

    /// Ask for the current view to be redrawn from fresh data
    pub fn request_refresh(&mut self) {
        self.current_mut().mark_awaiting_samples();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RegionTarget;

    #[test]
    fn test_root_is_always_current() {
        let mut views = ViewStack::new();
        assert_eq!(views.current().kind().name(), "overview");
        assert!(!views.go_back(Outcome::Continued));
        assert_eq!(views.depth(), 1);
        assert!(views.previous().is_none());
    }

    #[test]
    fn test_advance_builds_view_from_command() {
        let mut views = ViewStack::new();
        let cmd = Command::Latency(Some(EntityRef::thread(Pid(42), Tid(7))));
        views.advance_to_next_view(&cmd, Outcome::FreshSession).unwrap();

        let current = views.current();
        assert!(matches!(
            current.kind(),
            ViewKind::LatencyByThread { pid: Pid(42), tid: Tid(7), lines } if !lines.is_loaded()
        ));
        assert!(current.is_awaiting_samples());
        assert_eq!(views.previous().unwrap().kind().name(), "overview");
    }

    #[test]
    fn test_callchain_view_remembers_remote_access() {
        let mut views = ViewStack::new();
        let cmd = Command::Callchain(Some(EntityRef::process(Pid(9))));
        views.advance_to_next_view(&cmd, Outcome::FreshSession).unwrap();
        assert!(matches!(
            views.current().kind(),
            ViewKind::Callchain { counter: Some(CounterKind::RemoteAccess), .. }
        ));
    }

    #[test]
    fn test_advance_without_target_fails() {
        let mut views = ViewStack::new();
        let err = views.advance_to_next_view(&Command::Callchain(None), Outcome::Continued);
        assert!(matches!(err, Err(TransitionError::MissingContext(_))));

        let err = views.advance_to_next_view(&Command::Refresh, Outcome::Continued);
        assert!(matches!(err, Err(TransitionError::MissingContext(_))));
        assert_eq!(views.depth(), 1);
    }

    #[test]
    fn test_back_marks_previous_awaiting() {
        let mut views = ViewStack::new();
        let target = EntityRef::process(Pid(1));
        views.advance_to_next_view(&Command::MonitorProcess(Some(target)), Outcome::Continued).unwrap();
        let detail = RegionTarget { target, region: BufferRegion { addr: 0x1000, size: 4096 } };
        views.advance_to_next_view(&Command::LatencyCallchain(Some(detail)), Outcome::Continued).unwrap();
        assert_eq!(views.depth(), 3);

        assert!(views.go_back(Outcome::FreshSession));
        assert_eq!(views.current().kind().name(), "process-monitor");
        assert!(views.current().is_awaiting_samples());

        views.go_home(Outcome::Continued);
        assert_eq!(views.depth(), 1);
    }

    /// Every lookup fails, as for a process that has exited
    struct VanishedSource;

    impl ViewSource for VanishedSource {
        fn processes(&self) -> Result<Vec<ProcessRow>> {
            anyhow::bail!("no /proc")
        }

        fn threads(&self, pid: Pid) -> Result<Vec<ThreadRow>> {
            anyhow::bail!("process {pid} exited")
        }

        fn regions(&self, pid: Pid) -> Result<Vec<LatencyLine>> {
            anyhow::bail!("process {pid} exited")
        }
    }

    #[test]
    fn test_failed_reload_stops_awaiting() {
        let mut views = ViewStack::new();
        let cmd = Command::MonitorProcess(Some(EntityRef::process(Pid(77))));
        views.advance_to_next_view(&cmd, Outcome::FreshSession).unwrap();
        assert!(views.current().is_awaiting_samples());

        assert!(views.current_mut().reload(&VanishedSource).is_err());
        assert!(!views.current().is_awaiting_samples());
    }
}
