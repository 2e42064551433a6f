//! # Terminal User Interface (TUI)
//!
//! Interactive terminal UI using `ratatui` around a [`Session`].
//!
//! ## Layout
//!
//! - **Header** - sampling mode, stack depth, title of the current view
//! - **View** - rows of the current view with the highlighted row marked
//! - **Counters** - current counter values and which one is paused
//! - **Status bar** - key bindings and the last transition error
//!
//! The view is reloaded every `interval`, and immediately after a transition
//! that started a new sampling session.

#![allow(clippy::too_many_lines)]

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use std::io;
use std::time::{Duration, Instant};

mod status;
mod theme;

use status::StatusPanel;
use theme::{mode_color, CAUTION_AMBER, CRITICAL_RED, HUD_GREEN, INFO_DIM, SEL_LEFT, SEL_RIGHT};

use crate::command::Key;
use crate::counters::CounterControl;
use crate::session::Session;
use crate::views::{View, ViewKind};

const STYLE_HEADING: Style = Style::new().fg(HUD_GREEN).add_modifier(Modifier::BOLD);
const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
const STYLE_TEXT: Style = Style::new().fg(ratatui::style::Color::White);

/// Translate a terminal key into a session key
fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc | KeyCode::Backspace => Some(Key::Esc),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        _ => None,
    }
}

/// Column header and row lines of a view, plus the index of the highlighted line
fn view_lines(view: &View) -> (Line<'static>, Vec<Line<'static>>, Option<usize>) {
    fn row_line(selected: bool, text: String) -> Line<'static> {
        let (l, r) = if selected { (SEL_LEFT, SEL_RIGHT) } else { (" ", " ") };
        let style = if selected { STYLE_TEXT.add_modifier(Modifier::BOLD | Modifier::REVERSED) } else { STYLE_TEXT };
        Line::from(vec![
            Span::styled(l, STYLE_KEY),
            Span::styled(text, style),
            Span::styled(r, STYLE_KEY),
        ])
    }

    fn note(text: String) -> Vec<Line<'static>> {
        vec![Line::from(Span::styled(text, STYLE_DIM))]
    }

    match view.kind() {
        ViewKind::Overview { processes } => {
            let header = Line::from(Span::styled(format!(" {:>8}  {:<24} {:>7}", "PID", "COMMAND", "THREADS"), STYLE_HEADING));
            let lines = processes
                .rows()
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    row_line(processes.highlight() == Some(i), format!("{:>8}  {:<24} {:>7}", p.pid.0, p.command, p.threads))
                })
                .collect();
            (header, lines, processes.highlight())
        }
        ViewKind::ProcessMonitor { threads, .. } => {
            let header = Line::from(Span::styled(format!(" {:>8}  {:<24}", "TID", "COMMAND"), STYLE_HEADING));
            let lines = threads
                .rows()
                .iter()
                .enumerate()
                .map(|(i, t)| row_line(threads.highlight() == Some(i), format!("{:>8}  {:<24}", t.tid.0, t.command)))
                .collect();
            (header, lines, threads.highlight())
        }
        ViewKind::LatencyByProcess { lines, .. } | ViewKind::LatencyByThread { lines, .. } => {
            let header = Line::from(Span::styled(
                format!(" {:<18} {:>10}  {:<5} {}", "ADDR", "SIZE", "PERM", "DESC"),
                STYLE_HEADING,
            ));
            let rows = lines
                .rows()
                .iter()
                .enumerate()
                .map(|(i, l)| {
                    row_line(
                        lines.highlight() == Some(i),
                        format!(
                            "0x{:016x} {:>9}K  {:<5} {}",
                            l.region.addr,
                            l.region.size / 1024,
                            l.perms,
                            l.description
                        ),
                    )
                })
                .collect();
            (header, rows, lines.highlight())
        }
        ViewKind::ThreadMonitor { pid, tid } => {
            (Line::from(""), note(format!(" Counters of {pid} {tid} are shown on the right")), None)
        }
        ViewKind::AccessDestination { target } => {
            (Line::from(""), note(format!(" NUMA node of memory accessed by {target}")), None)
        }
        ViewKind::Callchain { counter, .. } => {
            let which = counter.map_or_else(|| "no counter".to_string(), |k| k.to_string());
            (Line::from(""), note(format!(" Attributing {which}; keys 1-4 pick RMA, LMA, CLK, IR")), None)
        }
        ViewKind::LatencyDetail { region, .. } => {
            (Line::from(""), note(format!(" Call chains accessing {region}")), None)
        }
    }
}

/// Run the interactive UI until the user quits
///
/// # Errors
/// Returns an error if the terminal cannot be set up or drawn to
pub fn run_live<C: CounterControl>(session: &mut Session<C>, interval: Duration) -> Result<()> {
    // -------------------------------------------------------------------------
    // Terminal Setup
    // -------------------------------------------------------------------------
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut last_refresh = Instant::now();

    // -------------------------------------------------------------------------
    // Main Event Loop
    // -------------------------------------------------------------------------
    loop {
        if last_refresh.elapsed() >= interval || session.views().current().is_awaiting_samples() {
            session.tick();
            last_refresh = Instant::now();
        }

        let mode = session.mode();
        let current = session.views().current();
        let status_panel = StatusPanel::new(mode, session.readings());
        let (column_header, lines, highlight) = view_lines(current);

        terminal.draw(|f| {
            let outer = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
                .split(f.area());

            let header = Paragraph::new(Line::from(vec![
                Span::styled("NUMAHUD", STYLE_HEADING),
                Span::styled(" | ", STYLE_DIM),
                Span::styled(format!("[{mode}]"), Style::new().fg(mode_color(mode)).add_modifier(Modifier::BOLD)),
                Span::styled(" | ", STYLE_DIM),
                Span::styled(format!("depth {}", session.views().depth()), STYLE_DIM),
                Span::styled(" | ", STYLE_DIM),
                Span::styled(current.kind().title(), Style::new().fg(HUD_GREEN)),
            ]))
            .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(mode_color(mode))));
            f.render_widget(header, outer[0]);

            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(outer[1]);

            // Keep the highlighted row on screen
            let visible = usize::from(cols[0].height.saturating_sub(3));
            let offset = highlight.map_or(0, |h| (h + 1).saturating_sub(visible));
            let mut body = vec![column_header.clone()];
            if current.is_awaiting_samples() {
                body.push(Line::from(Span::styled(" waiting for samples...", STYLE_DIM)));
            } else {
                body.extend(lines.iter().skip(offset).take(visible).cloned());
            }
            let view = Paragraph::new(body).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("[ {} ]", current.kind().name().to_uppercase()))
                    .border_style(Style::default().fg(HUD_GREEN)),
            );
            f.render_widget(view, cols[0]);
            status_panel.render(f, cols[1]);

            let mut status_line = vec![
                Span::styled("Q", STYLE_KEY),
                Span::styled(":Quit ", STYLE_DIM),
                Span::styled("H", STYLE_KEY),
                Span::styled(":Home ", STYLE_DIM),
                Span::styled("B", STYLE_KEY),
                Span::styled(":Back ", STYLE_DIM),
                Span::styled("R", STYLE_KEY),
                Span::styled(":Refresh ", STYLE_DIM),
                Span::styled("Enter", STYLE_KEY),
                Span::styled(":Select ", STYLE_DIM),
                Span::styled("L", STYLE_KEY),
                Span::styled(":Latency ", STYLE_DIM),
                Span::styled("C", STYLE_KEY),
                Span::styled(":Call-chain ", STYLE_DIM),
            ];
            if let Some(message) = session.status() {
                status_line.push(Span::styled(format!("[{message}]"), Style::new().fg(CRITICAL_RED)));
            }
            let status = Paragraph::new(Line::from(status_line))
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(HUD_GREEN)));
            f.render_widget(status, outer[2]);
        })?;

        // Handle keyboard input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(key) = map_key(key.code) {
                        session.press(key);
                    }
                }
            }
        }

        if session.should_quit() {
            break;
        }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CounterKind, EntityRef, Pid};
    use crate::views::{ProcessRow, RowBuffer};

    #[test]
    fn test_map_key() {
        assert_eq!(map_key(KeyCode::Char('Q')), Some(Key::Char('q')));
        assert_eq!(map_key(KeyCode::Backspace), Some(Key::Esc));
        assert_eq!(map_key(KeyCode::Tab), None);
    }

    #[test]
    fn test_view_lines_mark_highlight() {
        let processes = RowBuffer::loaded(vec![
            ProcessRow { pid: Pid(1), command: "init".into(), threads: 1 },
            ProcessRow { pid: Pid(2), command: "app".into(), threads: 4 },
        ]);
        let view = View::new(ViewKind::Overview { processes });
        let (_, lines, highlight) = view_lines(&view);
        assert_eq!(lines.len(), 2);
        assert_eq!(highlight, Some(0));
        assert_eq!(lines[0].spans[0].content, SEL_LEFT);
        assert_eq!(lines[1].spans[0].content, " ");
    }

    #[test]
    fn test_callchain_view_names_counter() {
        let view = View::new(ViewKind::Callchain {
            target: EntityRef::process(Pid(3)),
            counter: Some(CounterKind::Clock),
        });
        let (_, lines, highlight) = view_lines(&view);
        assert!(highlight.is_none());
        assert!(lines[0].spans[0].content.contains(&CounterKind::Clock.to_string()));
    }
}
