//! # System-wide perf_event counters
//!
//! Programs the hardware through `perf_event_open(2)`: one counting event per
//! online CPU per counter kind.
//!
//! ## Event Mapping
//!
//! - **RMA**: `HW_CACHE` node read misses (served by a remote node)
//! - **LMA**: `HW_CACHE` node read accesses
//! - **CLK**: `HW_CPU_CYCLES`
//! - **IR**: `HW_INSTRUCTIONS`
//! - **Low latency**: raw load-latency event (`0x1cd`) with `config1` as the
//!   latency threshold in cycles
//!
//! Events are opened disabled and enabled together once every CPU has an fd,
//! so a partially opened session never counts. File descriptors are
//! `OwnedFd`; stopping a session drops them.

#![allow(unsafe_code)] // perf_event_open, ioctl and read on perf fds

use log::{debug, info, warn};
use perf_event_open_sys as perf;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

use super::{CounterControl, Reading, SamplingState};
use crate::domain::{CounterError, CounterKind, CpuId, Pid, SamplingMode};

use perf::bindings::perf_event_attr;

/// Default raw encoding of MEM_TRANS_RETIRED.LOAD_LATENCY on Intel cores
pub const DEFAULT_LATENCY_EVENT: u64 = 0x01cd;
/// Default load-latency threshold in cycles
pub const DEFAULT_LATENCY_THRESHOLD: u64 = 128;

/// Disabled counting event of `type_`/`config`, hypervisor excluded
#[allow(clippy::cast_possible_truncation)]
fn counting_attr(type_: u32, config: u64) -> perf_event_attr {
    let mut attr = perf_event_attr {
        type_,
        size: std::mem::size_of::<perf_event_attr>() as u32,
        config,
        ..Default::default()
    };
    attr.set_disabled(1);
    attr.set_exclude_hv(1);
    attr
}

fn attr_for_counter(kind: CounterKind) -> perf_event_attr {
    use perf::bindings::{
        PERF_COUNT_HW_CACHE_NODE, PERF_COUNT_HW_CACHE_OP_READ, PERF_COUNT_HW_CACHE_RESULT_ACCESS,
        PERF_COUNT_HW_CACHE_RESULT_MISS, PERF_COUNT_HW_CPU_CYCLES, PERF_COUNT_HW_INSTRUCTIONS,
        PERF_TYPE_HARDWARE, PERF_TYPE_HW_CACHE,
    };

    let node_read = |result: u32| {
        u64::from(PERF_COUNT_HW_CACHE_NODE)
            | (u64::from(PERF_COUNT_HW_CACHE_OP_READ) << 8)
            | (u64::from(result) << 16)
    };
    match kind {
        CounterKind::RemoteAccess => {
            counting_attr(PERF_TYPE_HW_CACHE, node_read(PERF_COUNT_HW_CACHE_RESULT_MISS))
        }
        CounterKind::LocalAccess => {
            counting_attr(PERF_TYPE_HW_CACHE, node_read(PERF_COUNT_HW_CACHE_RESULT_ACCESS))
        }
        CounterKind::Clock => counting_attr(PERF_TYPE_HARDWARE, u64::from(PERF_COUNT_HW_CPU_CYCLES)),
        CounterKind::Instructions => {
            counting_attr(PERF_TYPE_HARDWARE, u64::from(PERF_COUNT_HW_INSTRUCTIONS))
        }
    }
}

fn latency_attr(config: &PerfConfig) -> perf_event_attr {
    let mut attr = counting_attr(perf::bindings::PERF_TYPE_RAW, config.latency_event);
    attr.__bindgen_anon_3.config1 = config.latency_threshold;
    attr
}

#[cfg(target_os = "linux")]
fn perf_event_open(attr: &perf_event_attr, pid: i32, cpu: i32) -> io::Result<OwnedFd> {
    use std::os::fd::FromRawFd;

    let mut attr = *attr;
    // SAFETY: attr is a fully initialised perf_event_attr of the size it declares
    let fd = unsafe {
        perf::perf_event_open(
            &mut attr,
            pid,
            cpu,
            -1,
            libc::c_ulong::from(perf::bindings::PERF_FLAG_FD_CLOEXEC),
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: the kernel just returned this descriptor and nothing else owns it
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

#[cfg(not(target_os = "linux"))]
fn perf_event_open(_attr: &perf_event_attr, _pid: i32, _cpu: i32) -> io::Result<OwnedFd> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

fn set_fd_enabled(fd: &OwnedFd, enabled: bool) -> io::Result<()> {
    let request = if enabled { perf::bindings::ENABLE } else { perf::bindings::DISABLE };
    // SAFETY: enable/disable take no argument pointer; fd is a live perf fd
    let ret = unsafe { libc::ioctl(fd.as_raw_fd(), request as libc::c_ulong, 0 as libc::c_ulong) };
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Switch every item on or off, or none of them
///
/// On the first failure the items already switched are put back before the
/// error is returned.
fn toggle_all<T>(
    items: &[T],
    enabled: bool,
    mut toggle: impl FnMut(&T, bool) -> io::Result<()>,
) -> io::Result<()> {
    for (done, item) in items.iter().enumerate() {
        if let Err(e) = toggle(item, enabled) {
            for switched in &items[..done] {
                if let Err(undo) = toggle(switched, !enabled) {
                    warn!("Failed to undo partial counter switch: {undo}");
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

fn read_count(fd: &OwnedFd) -> io::Result<u64> {
    let mut value = 0u64;
    // SAFETY: value is a valid 8-byte buffer; counting fds without read_format yield one u64
    let n = unsafe {
        libc::read(fd.as_raw_fd(), std::ptr::from_mut(&mut value).cast::<libc::c_void>(), 8)
    };
    if n == 8 {
        Ok(value)
    } else if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Err(io::Error::from(io::ErrorKind::UnexpectedEof))
    }
}

fn open_error(kind: &'static str, cpu: CpuId, source: io::Error) -> CounterError {
    match source.raw_os_error() {
        Some(libc::EACCES | libc::EPERM) => CounterError::PermissionDenied,
        Some(libc::ENOSYS) => CounterError::Unsupported,
        _ if source.kind() == io::ErrorKind::Unsupported => CounterError::Unsupported,
        _ => CounterError::Open { kind, cpu, source },
    }
}

/// Tunables for the perf engine
#[derive(Debug, Clone, Copy)]
pub struct PerfConfig {
    /// Raw event code used for low-latency sampling
    pub latency_event: u64,
    /// Minimum load latency (cycles) counted in low-latency mode
    pub latency_threshold: u64,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self { latency_event: DEFAULT_LATENCY_EVENT, latency_threshold: DEFAULT_LATENCY_THRESHOLD }
    }
}

/// One counter kind opened on every online CPU
struct CounterGroup {
    kind: CounterKind,
    fds: Vec<OwnedFd>,
}

impl CounterGroup {
    fn set_enabled(&self, enabled: bool) -> io::Result<()> {
        toggle_all(&self.fds, enabled, set_fd_enabled)
    }

    fn total(&self) -> u64 {
        self.fds
            .iter()
            .filter_map(|fd| match read_count(fd) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Failed to read {} counter: {e}", self.kind.label());
                    None
                }
            })
            .sum()
    }
}

/// Counter engine backed by `perf_event_open(2)`
pub struct PerfCounters {
    cpus: Vec<CpuId>,
    config: PerfConfig,
    profiling: Vec<CounterGroup>,
    latency: Vec<OwnedFd>,
    state: SamplingState,
}

impl PerfCounters {
    #[must_use]
    pub fn new(cpus: Vec<CpuId>, config: PerfConfig) -> Self {
        Self { cpus, config, profiling: Vec::new(), latency: Vec::new(), state: SamplingState::new() }
    }

    fn group(&self, kind: CounterKind) -> Option<&CounterGroup> {
        self.profiling.iter().find(|g| g.kind == kind)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn open_groups(&self) -> Result<Vec<CounterGroup>, CounterError> {
        CounterKind::ALL
            .iter()
            .map(|&kind| {
                let attr = attr_for_counter(kind);
                let fds = self
                    .cpus
                    .iter()
                    .map(|&cpu| {
                        perf_event_open(&attr, -1, cpu.0 as i32)
                            .map_err(|e| open_error(kind.label(), cpu, e))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CounterGroup { kind, fds })
            })
            .collect()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn open_latency(&self, target: Option<Pid>) -> Result<Vec<OwnedFd>, CounterError> {
        let attr = latency_attr(&self.config);

        match target {
            // One event following the process across CPUs
            Some(pid) => {
                let fd = perf_event_open(&attr, pid.0 as i32, -1)
                    .map_err(|e| open_error("load-latency", CpuId(0), e))?;
                Ok(vec![fd])
            }
            None => self
                .cpus
                .iter()
                .map(|&cpu| {
                    perf_event_open(&attr, -1, cpu.0 as i32)
                        .map_err(|e| open_error("load-latency", cpu, e))
                })
                .collect(),
        }
    }
}

impl CounterControl for PerfCounters {
    fn is_profiling_active(&self) -> bool {
        self.state.mode().is_profiling()
    }

    fn is_low_latency_active(&self) -> bool {
        self.state.mode().is_low_latency()
    }

    fn stop_all(&mut self) {
        for group in &self.profiling {
            if let Err(e) = group.set_enabled(false) {
                debug!("Disabling {} before close failed: {e}", group.kind.label());
            }
        }
        self.profiling.clear();
        self.latency.clear();
        self.state.clear();
    }

    fn start_profiling(&mut self) -> Result<(), CounterError> {
        let groups = self.open_groups()?;
        for group in &groups {
            group.set_enabled(true).map_err(CounterError::Ioctl)?;
        }
        info!("Profiling started: {} counters on {} CPUs", groups.len(), self.cpus.len());
        self.profiling = groups;
        self.state.begin(SamplingMode::Profiling);
        Ok(())
    }

    fn start_low_latency(&mut self, target: Option<Pid>) -> Result<(), CounterError> {
        let fds = self.open_latency(target)?;
        toggle_all(&fds, true, set_fd_enabled).map_err(CounterError::Ioctl)?;
        info!(
            "Low-latency sampling started (event 0x{:x}, threshold {} cycles)",
            self.config.latency_event, self.config.latency_threshold
        );
        self.latency = fds;
        self.state.begin(SamplingMode::LowLatency);
        Ok(())
    }

    fn pause(&mut self, counter: CounterKind) -> Result<(), CounterError> {
        if !self.state.mode().is_profiling() {
            return Err(CounterError::NotProfiling(counter));
        }
        let previous = self.state.paused().filter(|prev| *prev != counter);

        // Hardware first: the state only moves once every fd has switched
        if let Some(group) = self.group(counter) {
            group.set_enabled(false).map_err(CounterError::Ioctl)?;
        }
        if let Some(group) = previous.and_then(|prev| self.group(prev)) {
            if let Err(e) = group.set_enabled(true) {
                if let Some(paused) = self.group(counter) {
                    if let Err(undo) = paused.set_enabled(true) {
                        warn!("Failed to re-enable {counter}: {undo}");
                    }
                }
                return Err(CounterError::Ioctl(e));
            }
        }
        self.state.pause(counter)?;
        debug!("Paused {counter}");
        Ok(())
    }

    fn resume(&mut self, counter: CounterKind) {
        if self.state.paused() != Some(counter) {
            debug!("{counter} was not paused, nothing to resume");
            return;
        }
        if let Some(group) = self.group(counter) {
            if let Err(e) = group.set_enabled(true) {
                warn!("Failed to resume {counter}: {e}");
                return;
            }
        }
        self.state.resume(counter);
    }

    fn mode(&self) -> SamplingMode {
        self.state.mode()
    }

    fn readings(&mut self) -> Vec<Reading> {
        let paused = self.state.paused();
        self.profiling
            .iter()
            .map(|g| Reading { kind: g.kind, value: g.total(), running: paused != Some(g.kind) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_cache_encoding() {
        let rma = attr_for_counter(CounterKind::RemoteAccess);
        let lma = attr_for_counter(CounterKind::LocalAccess);
        assert_eq!(rma.type_, perf::bindings::PERF_TYPE_HW_CACHE);
        assert_eq!(rma.config, 0x1_0006);
        assert_eq!(lma.config, 0x0_0006);
        assert_eq!(rma.disabled(), 1);
        assert_eq!(rma.exclude_hv(), 1);
    }

    #[test]
    fn test_latency_attr_carries_threshold() {
        let config = PerfConfig { latency_event: 0x1cd, latency_threshold: 64 };
        let attr = latency_attr(&config);
        assert_eq!(attr.type_, perf::bindings::PERF_TYPE_RAW);
        assert_eq!(attr.config, 0x1cd);
        // SAFETY: config1 is the member latency_attr wrote
        assert_eq!(unsafe { attr.__bindgen_anon_3.config1 }, 64);
    }

    #[test]
    fn test_toggle_all_undoes_partial_switch() {
        use std::cell::RefCell;

        // Third CPU refuses to disable
        let switched = RefCell::new(Vec::new());
        let result = toggle_all(&[0, 1, 2, 3], false, |cpu, enabled| {
            if *cpu == 2 && !enabled {
                return Err(io::Error::from_raw_os_error(libc::EBADF));
            }
            switched.borrow_mut().push((*cpu, enabled));
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(switched.into_inner(), [(0, false), (1, false), (0, true), (1, true)]);
    }

    #[test]
    fn test_toggle_all_switches_everything() {
        let mut seen = Vec::new();
        toggle_all(&[4, 5], true, |cpu, enabled| {
            seen.push((*cpu, enabled));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, [(4, true), (5, true)]);
    }

    #[test]
    fn test_permission_errors_are_classified() {
        let err = open_error("RMA", CpuId(0), io::Error::from_raw_os_error(libc::EACCES));
        assert!(matches!(err, CounterError::PermissionDenied));

        let err = open_error("RMA", CpuId(3), io::Error::from_raw_os_error(libc::ENOENT));
        assert!(matches!(err, CounterError::Open { cpu: CpuId(3), .. }));
    }

    #[test]
    fn test_pause_without_session_fails() {
        let mut counters = PerfCounters::new(vec![CpuId(0)], PerfConfig::default());
        assert!(matches!(
            counters.pause(CounterKind::RemoteAccess),
            Err(CounterError::NotProfiling(_))
        ));
        assert_eq!(counters.mode(), SamplingMode::Idle);
        assert!(counters.readings().is_empty());
    }
}
