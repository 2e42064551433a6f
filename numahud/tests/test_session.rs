use anyhow::Result;
use numahud::command::{parse_script, Key};
use numahud::counters::{CounterCall, SimulatedCounters};
use numahud::domain::{BufferRegion, CounterKind, Pid, SamplingMode, Tid};
use numahud::session::Session;
use numahud::views::{LatencyLine, ProcessRow, ThreadRow, ViewKind, ViewSource};

/// Two processes; pid 20 has two threads and one memory area
struct FixtureSource;

impl ViewSource for FixtureSource {
    fn processes(&self) -> Result<Vec<ProcessRow>> {
        Ok(vec![
            ProcessRow { pid: Pid(10), command: "idle".into(), threads: 1 },
            ProcessRow { pid: Pid(20), command: "stream".into(), threads: 2 },
        ])
    }

    fn threads(&self, pid: Pid) -> Result<Vec<ThreadRow>> {
        Ok(vec![
            ThreadRow { tid: Tid(pid.0), command: "main".into() },
            ThreadRow { tid: Tid(pid.0 + 1), command: "worker".into() },
        ])
    }

    fn regions(&self, _pid: Pid) -> Result<Vec<LatencyLine>> {
        Ok(vec![LatencyLine {
            region: BufferRegion { addr: 0x1000, size: 0x4000 },
            perms: "rw-p".into(),
            description: "[heap]".into(),
        }])
    }
}

fn run(session: &mut Session<SimulatedCounters>, script: &str) {
    for key in parse_script(script).unwrap() {
        session.press(key);
        session.tick();
    }
}

fn started() -> Session<SimulatedCounters> {
    let mut session = Session::new(SimulatedCounters::new(), Box::new(FixtureSource));
    session.start().unwrap();
    session
}

#[test]
fn test_drill_down_to_thread_callchain() {
    let mut session = started();

    // Second process, second thread, call chain, quick-select clock
    run(&mut session, "<down><enter><down><enter>c3");

    assert!(matches!(
        session.views().current().kind(),
        ViewKind::Callchain { counter: Some(CounterKind::Clock), .. }
    ));
    assert_eq!(session.mode(), SamplingMode::CallchainPartial(CounterKind::Clock));
    assert_eq!(session.views().depth(), 4);

    run(&mut session, "b");
    assert!(matches!(session.views().current().kind(), ViewKind::ThreadMonitor { pid: Pid(20), tid: Tid(21) }));
    assert_eq!(session.mode(), SamplingMode::Profiling);
}

#[test]
fn test_latency_detail_and_home() {
    let mut session = started();
    run(&mut session, "<enter>l");
    assert_eq!(session.mode(), SamplingMode::LowLatency);
    assert!(matches!(session.views().current().kind(), ViewKind::LatencyByProcess { pid: Pid(10), .. }));

    run(&mut session, "<enter>");
    assert!(matches!(
        session.views().current().kind(),
        ViewKind::LatencyDetail { region: BufferRegion { addr: 0x1000, size: 0x4000 }, .. }
    ));

    run(&mut session, "h");
    assert_eq!(session.views().depth(), 1);
    assert_eq!(session.mode(), SamplingMode::Profiling);
}

#[test]
fn test_unbound_keys_do_not_dispatch() {
    let mut session = started();
    let before = session.journal().len();

    // 'c' is not bound in the overview, digits only in call-chain views
    run(&mut session, "c2x");
    assert_eq!(session.journal().len(), before);
    assert_eq!(session.views().depth(), 1);
}

#[test]
fn test_quit_stops_counters() {
    let mut session = started();
    run(&mut session, "<enter>q");
    assert!(session.should_quit());

    session.shutdown();
    assert_eq!(session.mode(), SamplingMode::Idle);
    assert_eq!(session.counters().calls().last(), Some(&CounterCall::StopAll));
}

#[test]
fn test_journal_written_to_file() {
    let mut session = started();
    run(&mut session, "<enter>c1bq");
    session.shutdown();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.json");
    session.journal().export(std::fs::File::create(&path).unwrap()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let transitions = value["transitions"].as_array().unwrap();
    let commands: Vec<&str> = transitions.iter().map(|t| t["command"].as_str().unwrap()).collect();
    assert_eq!(commands, ["home", "monitor-process", "callchain", "quick-select", "back", "quit"]);
    assert_eq!(transitions[2]["mode_after"], "call-chain(RMA)");
    assert_eq!(transitions[4]["fresh_session"], true);
}

#[test]
fn test_scroll_keys_stay_in_view() {
    let mut session = started();
    session.press(Key::Down);
    session.press(Key::Down);
    match session.views().current().kind() {
        ViewKind::Overview { processes } => assert_eq!(processes.highlight(), Some(1)),
        other => panic!("unexpected view {}", other.name()),
    }
}

/// Lists processes, but every process exits before it can be monitored
struct ExitedSource;

impl ViewSource for ExitedSource {
    fn processes(&self) -> Result<Vec<ProcessRow>> {
        FixtureSource.processes()
    }

    fn threads(&self, pid: Pid) -> Result<Vec<ThreadRow>> {
        anyhow::bail!("process {pid} exited")
    }

    fn regions(&self, pid: Pid) -> Result<Vec<LatencyLine>> {
        anyhow::bail!("process {pid} exited")
    }
}

#[test]
fn test_failed_refresh_returns_to_interval() {
    let mut session = Session::new(SimulatedCounters::new(), Box::new(ExitedSource));
    session.start().unwrap();

    session.press(Key::Enter);
    assert!(matches!(session.views().current().kind(), ViewKind::ProcessMonitor { .. }));

    session.press(Key::Char('r'));
    assert!(session.views().current().is_awaiting_samples());
    for _ in 0..3 {
        session.tick();
    }

    assert!(!session.views().current().is_awaiting_samples());
    assert!(session.status().is_some_and(|s| s.contains("exited")));
}

#[test]
fn test_failed_command_stays_in_view() {
    let mut session = Session::new(SimulatedCounters::new(), Box::new(ExitedSource));
    session.start().unwrap();

    // No thread rows ever load, so selecting one has nothing to pick
    run(&mut session, "<enter>");
    session.press(Key::Enter);

    assert!(matches!(session.views().current().kind(), ViewKind::ProcessMonitor { pid: Pid(10), .. }));
    assert_eq!(session.status(), Some("Nothing selected"));
    assert_eq!(session.journal().records().last().and_then(|r| r.error.as_deref()), Some("Nothing selected"));
}
