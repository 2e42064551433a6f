//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a TID where a
//! PID is expected, and make transition signatures more expressive.

use serde::Serialize;
use std::fmt;

/// Process ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Thread (light-weight process) ID
///
/// A kernel-assigned thread ID. For the main thread it equals the PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Tid(pub u32);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// CPU ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CpuId(pub u32);

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{}", self.0)
    }
}

/// The process (and optionally thread) a view or command is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub pid: Pid,
    /// `None` for process-level views
    pub lwpid: Option<Tid>,
}

impl EntityRef {
    #[must_use]
    pub fn process(pid: Pid) -> Self {
        Self { pid, lwpid: None }
    }

    #[must_use]
    pub fn thread(pid: Pid, tid: Tid) -> Self {
        Self { pid, lwpid: Some(tid) }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lwpid {
            Some(tid) => write!(f, "{} {}", self.pid, tid),
            None => write!(f, "{}", self.pid),
        }
    }
}

/// Address range of a memory buffer in the monitored process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BufferRegion {
    pub addr: u64,
    pub size: u64,
}

impl BufferRegion {
    #[must_use]
    pub fn end(&self) -> u64 {
        self.addr.saturating_add(self.size)
    }
}

impl fmt::Display for BufferRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}+{}K", self.addr, self.size / 1024)
    }
}

/// Hardware counter identity
///
/// The set is fixed; "no counter" is expressed as `Option::<CounterKind>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CounterKind {
    /// Accesses served by a remote NUMA node
    RemoteAccess,
    /// Accesses served by the local NUMA node
    LocalAccess,
    /// CPU clock cycles
    Clock,
    /// Instructions retired
    Instructions,
}

impl CounterKind {
    /// All profiling counters, in display order
    pub const ALL: [CounterKind; 4] = [
        CounterKind::RemoteAccess,
        CounterKind::LocalAccess,
        CounterKind::Clock,
        CounterKind::Instructions,
    ];

    /// Short column label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CounterKind::RemoteAccess => "RMA",
            CounterKind::LocalAccess => "LMA",
            CounterKind::Clock => "CLK",
            CounterKind::Instructions => "IR",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CounterKind::RemoteAccess => "remote-memory-access",
            CounterKind::LocalAccess => "local-memory-access",
            CounterKind::Clock => "clock-cycles",
            CounterKind::Instructions => "instructions-retired",
        };
        f.write_str(name)
    }
}

/// The counter configuration currently programmed into the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SamplingMode {
    /// Nothing running (process start, or after stop-all)
    #[default]
    Idle,
    /// All four profiling counters running
    Profiling,
    /// Memory load-latency sampling
    LowLatency,
    /// Profiling session with exactly one counter paused for call-chain attribution
    CallchainPartial(CounterKind),
}

impl SamplingMode {
    /// True for both full and partially paused profiling sessions
    #[must_use]
    pub fn is_profiling(self) -> bool {
        matches!(self, SamplingMode::Profiling | SamplingMode::CallchainPartial(_))
    }

    #[must_use]
    pub fn is_low_latency(self) -> bool {
        self == SamplingMode::LowLatency
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingMode::Idle => f.write_str("idle"),
            SamplingMode::Profiling => f.write_str("profiling"),
            SamplingMode::LowLatency => f.write_str("low-latency"),
            SamplingMode::CallchainPartial(kind) => write!(f, "call-chain({})", kind.label()),
        }
    }
}

/// Identifier of a user-facing command
///
/// Quick-select identifiers are `1..=4`; everything else names a navigation
/// or control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CommandId(pub u8);

impl CommandId {
    pub const HOME: CommandId = CommandId(0);
    pub const QUICK_1: CommandId = CommandId(1);
    pub const QUICK_2: CommandId = CommandId(2);
    pub const QUICK_3: CommandId = CommandId(3);
    pub const QUICK_4: CommandId = CommandId(4);
    pub const REFRESH: CommandId = CommandId(5);
    pub const BACK: CommandId = CommandId(6);
    pub const QUIT: CommandId = CommandId(7);
    pub const MONITOR_PROCESS: CommandId = CommandId(8);
    pub const MONITOR_THREAD: CommandId = CommandId(9);
    pub const LATENCY: CommandId = CommandId(10);
    pub const ACCESS_DESTINATION: CommandId = CommandId(11);
    pub const CALLCHAIN: CommandId = CommandId(12);
    pub const LATENCY_CALLCHAIN: CommandId = CommandId(13);
    pub const LATENCY_MAP: CommandId = CommandId(14);
    pub const LATENCY_MAP_REFRESH: CommandId = CommandId(15);
    pub const NODE_LOCALITY: CommandId = CommandId(16);
    pub const NODE_LOCALITY_REFRESH: CommandId = CommandId(17);
    pub const NODE_LOCALITY_MAP: CommandId = CommandId(18);
    pub const BACK_TO_LATENCY: CommandId = CommandId(19);
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CMD#{}", self.0)
    }
}
