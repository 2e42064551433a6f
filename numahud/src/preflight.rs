//! Pre-flight checks for numahud
//!
//! Validates system requirements before opening hardware counters.
//! Provides clear, actionable error messages when requirements aren't met.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};
use log::warn;
use std::path::Path;

use crate::counters::online_nodes;

/// Oldest kernel with the perf node-cache events numahud relies on
const MIN_KERNEL_VERSION: (u32, u32) = (3, 16);

const PARANOID_PATH: &str = "/proc/sys/kernel/perf_event_paranoid";

/// Run all pre-flight checks before the perf engine starts
///
/// # Errors
/// Returns the first failed requirement with a hint on how to fix it
pub fn run_preflight_checks(quiet: bool) -> Result<()> {
    check_privileges()?;
    check_kernel_version()?;
    check_numa(quiet)?;
    Ok(())
}

/// System-wide counters need root or `perf_event_paranoid <= 0`
fn check_privileges() -> Result<()> {
    if unsafe { libc::geteuid() } == 0 {
        return Ok(());
    }

    let level = std::fs::read_to_string(PARANOID_PATH)
        .ok()
        .and_then(|s| parse_paranoid(&s));
    if level.is_some_and(|l| l <= 0) {
        return Ok(());
    }

    bail!(
        "Permission denied: numahud requires root privileges to open system-wide counters.\n\n\
         Run with: sudo numahud ...\n\
         or lower {PARANOID_PATH} to 0 (current: {})",
        level.map_or_else(|| "unknown".to_string(), |l| l.to_string())
    );
}

fn parse_paranoid(content: &str) -> Option<i32> {
    content.trim().parse().ok()
}

fn check_kernel_version() -> Result<()> {
    let version_str = std::fs::read_to_string("/proc/version")
        .context("Failed to read kernel version from /proc/version")?;

    // "Linux version 6.1.0-arch1-1 ..."
    let release = version_str.split_whitespace().nth(2).unwrap_or("unknown");
    let Some((major, minor)) = parse_kernel_release(release) else {
        // Can't parse, assume it's fine
        return Ok(());
    };

    if (major, minor) < MIN_KERNEL_VERSION {
        bail!(
            "Kernel version {major}.{minor} is too old.\n\n\
             numahud requires Linux {}.{} or newer for NUMA node cache events.\n\
             Current kernel: {release}",
            MIN_KERNEL_VERSION.0,
            MIN_KERNEL_VERSION.1,
        );
    }

    Ok(())
}

/// `(major, minor)` of a release string like `5.15.0-generic`
fn parse_kernel_release(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts
        .next()?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    Some((major, minor))
}

/// A machine without NUMA nodes in sysfs cannot be monitored
fn check_numa(quiet: bool) -> Result<()> {
    if !Path::new("/sys/devices/system/node").exists() {
        bail!(
            "NUMA topology not found: /sys/devices/system/node is missing.\n\n\
             The kernel must be built with CONFIG_NUMA."
        );
    }

    let nodes = online_nodes()?;
    if nodes.len() < 2 && !quiet {
        warn!("Only {} NUMA node online, remote accesses will read zero", nodes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kernel_release() {
        assert_eq!(parse_kernel_release("5.15.0-generic"), Some((5, 15)));
        assert_eq!(parse_kernel_release("6.1rc2"), Some((6, 1)));
        assert_eq!(parse_kernel_release("unknown"), None);
    }

    #[test]
    fn test_parse_paranoid() {
        assert_eq!(parse_paranoid("2\n"), Some(2));
        assert_eq!(parse_paranoid("-1\n"), Some(-1));
        assert_eq!(parse_paranoid("x"), None);
    }

    #[test]
    fn test_kernel_version_check() {
        // Don't assert success since the test might run on an old kernel
        let _ = check_kernel_version();
    }
}
