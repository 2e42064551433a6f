//! User commands
//!
//! A [`Command`] is created by the key map with an empty target slot; pre-ops
//! and ops fill the slot from the current view before the view stack reads it
//! to build the next view.

pub mod counter_map;
pub mod keymap;

pub use counter_map::counter_for;
pub use keymap::{command_for_key, parse_script, Key};

use crate::domain::{BufferRegion, CommandId, EntityRef};

/// Target of a drill-down from a latency row into its call chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionTarget {
    pub target: EntityRef,
    pub region: BufferRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Home,
    Refresh,
    Back,
    Quit,
    /// Open the process monitor for the highlighted overview row
    MonitorProcess(Option<EntityRef>),
    /// Open the thread monitor for the highlighted thread row
    MonitorThread(Option<EntityRef>),
    Latency(Option<EntityRef>),
    AccessDestination(Option<EntityRef>),
    Callchain(Option<EntityRef>),
    LatencyCallchain(Option<RegionTarget>),
    /// Quick-select key in the call-chain view; carries the raw identifier
    QuickSelect(CommandId),
    LatencyMap,
    LatencyMapRefresh,
    NodeLocality,
    NodeLocalityRefresh,
    NodeLocalityMap,
    BackToLatency,
}

impl Command {
    #[must_use]
    pub fn id(&self) -> CommandId {
        match self {
            Command::Home => CommandId::HOME,
            Command::Refresh => CommandId::REFRESH,
            Command::Back => CommandId::BACK,
            Command::Quit => CommandId::QUIT,
            Command::MonitorProcess(_) => CommandId::MONITOR_PROCESS,
            Command::MonitorThread(_) => CommandId::MONITOR_THREAD,
            Command::Latency(_) => CommandId::LATENCY,
            Command::AccessDestination(_) => CommandId::ACCESS_DESTINATION,
            Command::Callchain(_) => CommandId::CALLCHAIN,
            Command::LatencyCallchain(_) => CommandId::LATENCY_CALLCHAIN,
            Command::QuickSelect(id) => *id,
            Command::LatencyMap => CommandId::LATENCY_MAP,
            Command::LatencyMapRefresh => CommandId::LATENCY_MAP_REFRESH,
            Command::NodeLocality => CommandId::NODE_LOCALITY,
            Command::NodeLocalityRefresh => CommandId::NODE_LOCALITY_REFRESH,
            Command::NodeLocalityMap => CommandId::NODE_LOCALITY_MAP,
            Command::BackToLatency => CommandId::BACK_TO_LATENCY,
        }
    }

    /// Human-readable name for status lines and the journal
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Home => "home",
            Command::Refresh => "refresh",
            Command::Back => "back",
            Command::Quit => "quit",
            Command::MonitorProcess(_) => "monitor-process",
            Command::MonitorThread(_) => "monitor-thread",
            Command::Latency(_) => "latency",
            Command::AccessDestination(_) => "access-destination",
            Command::Callchain(_) => "callchain",
            Command::LatencyCallchain(_) => "latency-callchain",
            Command::QuickSelect(_) => "quick-select",
            Command::LatencyMap => "latency-map",
            Command::LatencyMapRefresh => "latency-map-refresh",
            Command::NodeLocality => "node-locality",
            Command::NodeLocalityRefresh => "node-locality-refresh",
            Command::NodeLocalityMap => "node-locality-map",
            Command::BackToLatency => "back-to-latency",
        }
    }

    /// Entity slot of commands that carry one
    pub fn entity_slot(&mut self) -> Option<&mut Option<EntityRef>> {
        match self {
            Command::MonitorProcess(slot)
            | Command::MonitorThread(slot)
            | Command::Latency(slot)
            | Command::AccessDestination(slot)
            | Command::Callchain(slot) => Some(slot),
            _ => None,
        }
    }
}
