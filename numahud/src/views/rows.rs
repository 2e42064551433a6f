//! Row data shown in list views and the scrollable buffer that holds it

use crate::domain::{BufferRegion, Pid, Tid};

/// One process in the overview list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRow {
    pub pid: Pid,
    pub command: String,
    pub threads: usize,
}

/// One thread in the process monitor list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub tid: Tid,
    pub command: String,
}

/// One memory area in a latency view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyLine {
    pub region: BufferRegion,
    pub perms: String,
    /// Backing file, `[heap]`, `[stack]`, or empty for anonymous memory
    pub description: String,
}

/// Scrollable rows with an optional highlighted row
///
/// The buffer stays unloaded until the first sample arrives, and the
/// highlight is `None` whenever there is nothing to point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBuffer<T> {
    rows: Option<Vec<T>>,
    highlight: Option<usize>,
}

impl<T> Default for RowBuffer<T> {
    fn default() -> Self {
        Self { rows: None, highlight: None }
    }
}

impl<T> RowBuffer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer already holding `rows`, with the first row highlighted
    #[must_use]
    pub fn loaded(rows: Vec<T>) -> Self {
        let mut buffer = Self::new();
        buffer.load(rows);
        buffer
    }

    /// Replace the rows, keeping the highlight on screen
    pub fn load(&mut self, rows: Vec<T>) {
        self.highlight = match (rows.len(), self.highlight) {
            (0, _) => None,
            (len, Some(h)) => Some(h.min(len - 1)),
            (_, None) => Some(0),
        };
        self.rows = Some(rows);
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.rows.is_some()
    }

    #[must_use]
    pub fn rows(&self) -> &[T] {
        self.rows.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    /// Set or clear the highlight; out-of-range indexes clear it
    pub fn set_highlight(&mut self, highlight: Option<usize>) {
        self.highlight = highlight.filter(|&h| h < self.rows().len());
    }

    /// The highlighted row, if the buffer is loaded and a row is highlighted
    #[must_use]
    pub fn selected(&self) -> Option<&T> {
        self.rows.as_ref()?.get(self.highlight?)
    }

    pub fn scroll_up(&mut self) {
        if let Some(h) = self.highlight {
            self.highlight = Some(h.saturating_sub(1));
        }
    }

    pub fn scroll_down(&mut self) {
        let len = self.rows().len();
        self.highlight = match self.highlight {
            Some(h) if h + 1 < len => Some(h + 1),
            None if len > 0 => Some(0),
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unloaded_buffer_has_no_selection() {
        let buffer: RowBuffer<u32> = RowBuffer::new();
        assert!(!buffer.is_loaded());
        assert!(buffer.rows().is_empty());
        assert_eq!(buffer.selected(), None);
    }

    #[test]
    fn test_load_highlights_first_row() {
        let buffer = RowBuffer::loaded(vec![10, 20, 30]);
        assert_eq!(buffer.highlight(), Some(0));
        assert_eq!(buffer.selected(), Some(&10));
    }

    #[test]
    fn test_reload_clamps_highlight() {
        let mut buffer = RowBuffer::loaded(vec![1, 2, 3, 4]);
        buffer.set_highlight(Some(3));
        buffer.load(vec![1, 2]);
        assert_eq!(buffer.highlight(), Some(1));

        buffer.load(vec![]);
        assert_eq!(buffer.highlight(), None);
        assert!(buffer.is_loaded());
        assert_eq!(buffer.selected(), None);
    }

    #[test]
    fn test_scroll_bounds() {
        let mut buffer = RowBuffer::loaded(vec!['a', 'b']);
        buffer.scroll_up();
        assert_eq!(buffer.highlight(), Some(0));
        buffer.scroll_down();
        buffer.scroll_down();
        assert_eq!(buffer.highlight(), Some(1));

        buffer.set_highlight(None);
        assert_eq!(buffer.selected(), None);
        buffer.scroll_down();
        assert_eq!(buffer.highlight(), Some(0));
    }

    #[test]
    fn test_set_highlight_out_of_range_clears() {
        let mut buffer = RowBuffer::loaded(vec![1]);
        buffer.set_highlight(Some(5));
        assert_eq!(buffer.highlight(), None);
    }
}
