use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::io::Write;

use crate::domain::SamplingMode;

/// Format version written into every journal
pub const JOURNAL_VERSION: u32 = 1;

/// Records kept by default; older ones are dropped first
pub const DEFAULT_JOURNAL_LIMIT: usize = 10_000;

/// One dispatched command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub seq: u64,
    pub command: &'static str,
    pub view_before: &'static str,
    pub view_after: &'static str,
    /// Modes are written in their display form, e.g. `call-chain(RMA)`
    pub mode_before: String,
    pub mode_after: String,
    pub fresh_session: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `3 callchain: process-monitor -> call-chain [profiling -> call-chain(RMA)] fresh`
impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} -> {} [{} -> {}]",
            self.seq, self.command, self.view_before, self.view_after, self.mode_before, self.mode_after
        )?;
        if self.fresh_session {
            f.write_str(" fresh")?;
        }
        if let Some(error) = &self.error {
            write!(f, " error: {error}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct JournalDocument<'a> {
    version: u32,
    /// Oldest transitions no longer in `transitions`
    dropped: u64,
    transitions: &'a [TransitionRecord],
}

/// Ordered record of the most recent transitions the dispatcher ran
///
/// A long TUI session would otherwise grow without bound, so only the last
/// `limit` records are kept. Sequence numbers keep counting across drops.
#[derive(Debug)]
pub struct TransitionJournal {
    records: Vec<TransitionRecord>,
    next_seq: u64,
    limit: usize,
}

impl Default for TransitionJournal {
    fn default() -> Self {
        Self::with_limit(DEFAULT_JOURNAL_LIMIT)
    }
}

impl TransitionJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal keeping at most `limit` records (at least one)
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self { records: Vec::new(), next_seq: 0, limit: limit.max(1) }
    }

    /// Append a transition; the sequence number is assigned here
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        command: &'static str,
        view_before: &'static str,
        view_after: &'static str,
        mode_before: SamplingMode,
        mode_after: SamplingMode,
        fresh_session: bool,
        error: Option<String>,
    ) -> &TransitionRecord {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.records.len() >= self.limit {
            self.records.remove(0);
        }
        self.records.push(TransitionRecord {
            seq,
            command,
            view_before,
            view_after,
            mode_before: mode_before.to_string(),
            mode_after: mode_after.to_string(),
            fresh_session,
            error,
        });
        &self.records[self.records.len() - 1]
    }

    #[must_use]
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    /// Records with a sequence number of at least `seq`
    pub fn since(&self, seq: u64) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter().filter(move |r| r.seq >= seq)
    }

    /// Sequence number the next record will get
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Number of records dropped to stay within the limit
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.next_seq - self.records.len() as u64
    }

    /// Records currently kept
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the journal as pretty-printed JSON to any writer
    ///
    /// # Errors
    /// Returns an error if serialization or the writer fails
    pub fn export<W: Write>(&self, writer: W) -> Result<()> {
        let document =
            JournalDocument { version: JOURNAL_VERSION, dropped: self.dropped(), transitions: &self.records };
        serde_json::to_writer_pretty(writer, &document).context("Failed to write journal JSON")?;
        Ok(())
    }
}
