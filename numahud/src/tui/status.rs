use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{gauge_bar, mode_color, CAUTION_AMBER, HUD_GREEN, INFO_DIM};
use crate::counters::Reading;
use crate::domain::SamplingMode;

/// Sampling mode plus the share of each profiling counter
pub struct StatusPanel {
    mode: SamplingMode,
    /// (label, value, share of total in percent, running)
    counters: Vec<(&'static str, u64, f64, bool)>,
}

impl StatusPanel {
    #[allow(clippy::cast_precision_loss)]
    pub fn new(mode: SamplingMode, readings: &[Reading]) -> Self {
        let total: u64 = readings.iter().map(|r| r.value).sum();
        let counters = readings
            .iter()
            .map(|r| {
                let share = if total > 0 { r.value as f64 * 100.0 / total as f64 } else { 0.0 };
                (r.kind.label(), r.value, share, r.running)
            })
            .collect();
        Self { mode, counters }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let color = mode_color(self.mode);
        let mut lines = vec![
            Line::from(Span::styled(
                format!(" {}", self.mode),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        if self.counters.is_empty() {
            lines.push(Line::from(Span::styled(" no counter data", Style::default().fg(INFO_DIM))));
        }

        for &(label, value, share, running) in &self.counters {
            let bar_color = if running { HUD_GREEN } else { CAUTION_AMBER };
            let state = if running { "" } else { " paused" };
            lines.push(Line::from(vec![
                Span::styled(format!(" {label:<4}"), Style::default().fg(INFO_DIM)),
                Span::styled(format!("{value:>12}"), Style::default().fg(bar_color)),
                Span::styled(state, Style::default().fg(CAUTION_AMBER)),
            ]));
            lines.push(Line::from(vec![
                Span::raw("      "),
                Span::styled(gauge_bar(share, 10), Style::default().fg(bar_color)),
                Span::styled(format!(" {share:.0}%"), Style::default().fg(bar_color)),
            ]));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Counters")
                .border_style(Style::default().fg(color)),
        );

        f.render_widget(paragraph, area);
    }
}
