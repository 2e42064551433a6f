//! Where view rows come from
//!
//! [`ProcFs`] reads the live system from `/proc`; tests and `--simulate` use
//! their own [`ViewSource`] implementations.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use super::rows::{LatencyLine, ProcessRow, ThreadRow};
use crate::domain::{BufferRegion, Pid, Tid};

/// Supplier of the rows shown by list views
pub trait ViewSource {
    /// # Errors
    /// Returns an error if the process list cannot be read
    fn processes(&self) -> Result<Vec<ProcessRow>>;

    /// # Errors
    /// Returns an error if the thread list of `pid` cannot be read
    fn threads(&self, pid: Pid) -> Result<Vec<ThreadRow>>;

    /// # Errors
    /// Returns an error if the memory areas of `pid` cannot be read
    fn regions(&self, pid: Pid) -> Result<Vec<LatencyLine>>;
}

/// Live system rows read from procfs
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ViewSource for ProcFs {
    fn processes(&self) -> Result<Vec<ProcessRow>> {
        let proc_dir = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?;

        let mut rows = Vec::new();
        for entry in proc_dir.flatten() {
            let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
                continue;
            };

            // Kernel threads have no exe link and cannot be profiled per process
            if fs::read_link(entry.path().join("exe")).is_err() {
                continue;
            }

            let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
                continue;
            };
            let Ok(command) = extract_comm(&stat) else {
                continue;
            };

            let threads = fs::read_dir(entry.path().join("task")).map_or(0, Iterator::count);
            rows.push(ProcessRow { pid: Pid(pid), command, threads });
        }

        rows.sort_by_key(|row| row.pid);
        Ok(rows)
    }

    fn threads(&self, pid: Pid) -> Result<Vec<ThreadRow>> {
        let task_dir = self.root.join(pid.0.to_string()).join("task");
        let entries = fs::read_dir(&task_dir)
            .with_context(|| format!("Failed to read {}", task_dir.display()))?;

        let mut rows = Vec::new();
        for entry in entries.flatten() {
            let Ok(tid) = entry.file_name().to_string_lossy().parse::<u32>() else {
                continue;
            };
            // Threads may exit between listing and reading comm
            let Ok(comm) = fs::read_to_string(entry.path().join("comm")) else {
                continue;
            };
            rows.push(ThreadRow { tid: Tid(tid), command: comm.trim().to_string() });
        }

        rows.sort_by_key(|row| row.tid);
        Ok(rows)
    }

    fn regions(&self, pid: Pid) -> Result<Vec<LatencyLine>> {
        let maps_path = self.root.join(pid.0.to_string()).join("maps");
        let maps = fs::read_to_string(&maps_path)
            .with_context(|| format!("Failed to read {}", maps_path.display()))?;
        parse_maps(&maps)
    }
}

/// Extract the command name from `/proc/<pid>/stat`: "pid (comm) state ..."
fn extract_comm(stat_line: &str) -> Result<String> {
    let open = stat_line.find('(').context("Invalid stat format")?;
    let close = stat_line.rfind(')').context("Invalid stat format")?;
    if open >= close {
        bail!("Invalid stat format");
    }
    Ok(stat_line[open + 1..close].to_string())
}

/// Parse `/proc/<pid>/maps` content into latency rows
///
/// Each line is "start-end perms offset dev inode [pathname]". Lines that do
/// not carry a valid range are skipped.
///
/// # Errors
/// Returns an error if a range field is present but is not hexadecimal
pub fn parse_maps(content: &str) -> Result<Vec<LatencyLine>> {
    let mut lines = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            continue;
        }
        let Some((start, end)) = parts[0].split_once('-') else {
            continue;
        };
        let start = u64::from_str_radix(start, 16).context("Failed to parse range start")?;
        let end = u64::from_str_radix(end, 16).context("Failed to parse range end")?;
        if end <= start {
            continue;
        }

        lines.push(LatencyLine {
            region: BufferRegion { addr: start, size: end - start },
            perms: parts[1].to_string(),
            description: parts.get(5..).map(|rest| rest.join(" ")).unwrap_or_default(),
        });
    }

    Ok(lines)
}
