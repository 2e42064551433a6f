//! CPU and NUMA topology helpers
//!
//! Utilities for querying online CPUs and nodes from the /sys filesystem.

use anyhow::{Context, Result};
use std::fs;

use crate::domain::CpuId;

const CPU_ONLINE: &str = "/sys/devices/system/cpu/online";
const NODE_ONLINE: &str = "/sys/devices/system/node/online";

/// Get list of online CPU IDs from /sys/devices/system/cpu/online
///
/// # Errors
/// Returns an error if the file cannot be read or parsed
pub fn online_cpus() -> Result<Vec<CpuId>> {
    let content = fs::read_to_string(CPU_ONLINE).with_context(|| format!("Failed to read {CPU_ONLINE}"))?;
    Ok(parse_range_list(&content)?.into_iter().map(CpuId).collect())
}

/// Get list of online NUMA node IDs from /sys/devices/system/node/online
///
/// # Errors
/// Returns an error if the file cannot be read or parsed
pub fn online_nodes() -> Result<Vec<u32>> {
    let content =
        fs::read_to_string(NODE_ONLINE).with_context(|| format!("Failed to read {NODE_ONLINE}"))?;
    parse_range_list(&content)
}

/// Parse a kernel range list like "0-3" or "0-3,8-11" or "5"
///
/// # Errors
/// Returns an error if any entry is not a number or a `start-end` range
pub fn parse_range_list(content: &str) -> Result<Vec<u32>> {
    let mut ids = Vec::new();

    for range in content.trim().split(',').filter(|r| !r.is_empty()) {
        if let Some((start, end)) = range.split_once('-') {
            let start: u32 = start.parse().with_context(|| format!("Bad range start in {range:?}"))?;
            let end: u32 = end.parse().with_context(|| format!("Bad range end in {range:?}"))?;
            ids.extend(start..=end);
        } else {
            ids.push(range.parse().with_context(|| format!("Bad id {range:?}"))?);
        }
    }

    Ok(ids)
}
