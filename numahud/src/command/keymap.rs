//! Key bindings per view
//!
//! Global keys work everywhere; the rest depend on the current view so a
//! command is only produced where its transition is supported.

use crate::domain::CommandId;
use crate::views::ViewKind;

use super::Command;

/// Input key, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Up,
    Down,
}

/// Command bound to `key` in `view`, if any
#[must_use]
pub fn command_for_key(view: &ViewKind, key: Key) -> Option<Command> {
    match key {
        Key::Char('q') => return Some(Command::Quit),
        Key::Char('h') => return Some(Command::Home),
        Key::Char('r') => return Some(Command::Refresh),
        Key::Char('b') | Key::Esc => return Some(Command::Back),
        _ => {}
    }

    match (view, key) {
        (ViewKind::Overview { .. }, Key::Enter) => Some(Command::MonitorProcess(None)),

        (ViewKind::ProcessMonitor { .. }, Key::Enter) => Some(Command::MonitorThread(None)),
        (ViewKind::ProcessMonitor { .. } | ViewKind::ThreadMonitor { .. }, Key::Char('l')) => {
            Some(Command::Latency(None))
        }
        (ViewKind::ProcessMonitor { .. } | ViewKind::ThreadMonitor { .. }, Key::Char('c')) => {
            Some(Command::Callchain(None))
        }

        (ViewKind::LatencyByProcess { .. } | ViewKind::LatencyByThread { .. }, key) => match key {
            Key::Enter => Some(Command::LatencyCallchain(None)),
            Key::Char('a') => Some(Command::AccessDestination(None)),
            Key::Char('m') => Some(Command::LatencyMap),
            Key::Char('n') => Some(Command::NodeLocality),
            _ => None,
        },

        (ViewKind::Callchain { .. }, Key::Char(c)) => {
            let digit = c.to_digit(10)?;
            u8::try_from(digit).ok().map(|id| Command::QuickSelect(CommandId(id)))
        }

        _ => None,
    }
}

/// Parse a headless key script
///
/// Plain characters are keys; `<enter>`, `<esc>`, `<up>` and `<down>` name
/// the special keys. Whitespace separates nothing and is skipped.
///
/// # Errors
/// Returns the unknown name if a `<...>` token is not recognised or unclosed
pub fn parse_script(script: &str) -> Result<Vec<Key>, String> {
    let mut keys = Vec::new();
    let mut chars = script.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '<' => {
                let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
                let key = match name.to_ascii_lowercase().as_str() {
                    "enter" => Key::Enter,
                    "esc" => Key::Esc,
                    "up" => Key::Up,
                    "down" => Key::Down,
                    _ => return Err(name),
                };
                keys.push(key);
            }
            c => keys.push(Key::Char(c)),
        }
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CounterKind, EntityRef, Pid, Tid};
    use crate::views::RowBuffer;

    fn overview() -> ViewKind {
        ViewKind::Overview { processes: RowBuffer::new() }
    }

    #[test]
    fn test_global_keys() {
        let views = [
            overview(),
            ViewKind::ThreadMonitor { pid: Pid(1), tid: Tid(2) },
            ViewKind::Callchain { target: EntityRef::process(Pid(1)), counter: None },
        ];
        for view in &views {
            assert_eq!(command_for_key(view, Key::Char('q')), Some(Command::Quit));
            assert_eq!(command_for_key(view, Key::Char('h')), Some(Command::Home));
            assert_eq!(command_for_key(view, Key::Esc), Some(Command::Back));
        }
    }

    #[test]
    fn test_callchain_only_from_monitor_views() {
        let monitor = ViewKind::ProcessMonitor { pid: Pid(9), threads: RowBuffer::new() };
        assert_eq!(command_for_key(&monitor, Key::Char('c')), Some(Command::Callchain(None)));
        assert_eq!(command_for_key(&overview(), Key::Char('c')), None);
    }

    #[test]
    fn test_latency_view_bindings() {
        let latency = ViewKind::LatencyByProcess { pid: Pid(9), lines: RowBuffer::new() };
        assert_eq!(command_for_key(&latency, Key::Enter), Some(Command::LatencyCallchain(None)));
        assert_eq!(command_for_key(&latency, Key::Char('a')), Some(Command::AccessDestination(None)));
        assert_eq!(command_for_key(&latency, Key::Char('m')), Some(Command::LatencyMap));
        assert_eq!(command_for_key(&latency, Key::Char('c')), None);
    }

    #[test]
    fn test_digits_in_callchain_view_are_quick_select() {
        let view = ViewKind::Callchain {
            target: EntityRef::process(Pid(1)),
            counter: Some(CounterKind::RemoteAccess),
        };
        assert_eq!(command_for_key(&view, Key::Char('3')), Some(Command::QuickSelect(CommandId(3))));
        assert_eq!(command_for_key(&view, Key::Char('0')), Some(Command::QuickSelect(CommandId(0))));
        assert_eq!(command_for_key(&view, Key::Char('x')), None);
    }

    #[test]
    fn test_parse_script() {
        let keys = parse_script("<enter> c 2 <ESC>q").unwrap();
        assert_eq!(
            keys,
            vec![Key::Enter, Key::Char('c'), Key::Char('2'), Key::Esc, Key::Char('q')]
        );
        assert_eq!(parse_script("<tab>"), Err("tab".to_string()));
    }
}
