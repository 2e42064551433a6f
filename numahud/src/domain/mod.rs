//! Domain model for numahud
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Self-documenting transition signatures
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{
    BufferRegion, CommandId, CounterKind, CpuId, EntityRef, Pid, SamplingMode, Tid,
};

pub use errors::{CounterError, TransitionError};
