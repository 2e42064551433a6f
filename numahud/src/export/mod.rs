//! Transition journal export
//!
//! Every dispatched command is recorded with the view and sampling mode on
//! both sides of it. `--dump FILE` writes the journal as JSON on exit.

pub mod journal;

pub use journal::{TransitionJournal, TransitionRecord};
