//! # numahud - NUMA Hardware Counter Monitor
//!
//! numahud shows which processes and threads access remote NUMA memory, how
//! long their loads take, and which call chains cause the traffic. Data comes
//! from hardware performance counters, and only a few of them can be
//! programmed at once, so every step of navigation may have to reprogram them.
//!
//! ## Architecture Overview
//!
//! ```text
//!  key ──▶ keymap ──▶ Command ──▶ Dispatcher ──▶ pre-op ──▶ op ──▶ ViewStack
//!                                     │            │        │
//!                                     │            ▼        ▼
//!                                     │        Coordinator (owns engine)
//!                                     │            │
//!                                     ▼            ▼
//!                                  Journal    CounterControl
//!                                             ├─ PerfCounters (perf_event_open)
//!                                             └─ SimulatedCounters
//! ```
//!
//! ## Module Structure
//!
//! - [`transition`]: the pre-op/op protocol and the command table
//! - [`counters`]: counter engines and the owned sampling state
//! - [`views`]: view stack, row buffers and the `/proc` data source
//! - [`command`]: commands, key bindings, quick-select counter table
//! - [`session`]: loop state shared by the TUI and headless runs
//! - [`export`]: JSON transition journal
//! - [`tui`]: terminal UI
//! - [`cli`], [`preflight`], [`domain`]: arguments, system checks, core types
//!
//! ## Key Concepts
//!
//! - **Sampling mode**: exactly one of idle, profiling, low-latency, or
//!   profiling with one counter paused for call-chain attribution
//! - **Pre-op / op**: guard run before a navigation command, and the action
//!   that performs or finalizes it
//! - **Fresh session**: a transition that (re)started sampling; the view that
//!   becomes current waits for new samples

pub mod cli;
pub mod command;
pub mod counters;
pub mod domain;
pub mod export;
pub mod preflight;
pub mod session;
pub mod transition;
pub mod tui;
pub mod views;
