//! Quick-select command → counter lookup

use crate::domain::{CommandId, CounterKind};

/// Counters selected by quick-select identifiers 1, 2, 3, 4, in that order
const QUICK_SELECT_COUNTERS: [CounterKind; 4] = [
    CounterKind::RemoteAccess,
    CounterKind::LocalAccess,
    CounterKind::Clock,
    CounterKind::Instructions,
];

/// Counter selected by a quick-select identifier, or `None` outside `1..=4`
#[must_use]
pub fn counter_for(id: CommandId) -> Option<CounterKind> {
    let index = id.0.checked_sub(CommandId::QUICK_1.0)?;
    QUICK_SELECT_COUNTERS.get(usize::from(index)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_select_order() {
        assert_eq!(counter_for(CommandId::QUICK_1), Some(CounterKind::RemoteAccess));
        assert_eq!(counter_for(CommandId::QUICK_2), Some(CounterKind::LocalAccess));
        assert_eq!(counter_for(CommandId::QUICK_3), Some(CounterKind::Clock));
        assert_eq!(counter_for(CommandId::QUICK_4), Some(CounterKind::Instructions));
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert_eq!(counter_for(CommandId(0)), None);
        assert_eq!(counter_for(CommandId(5)), None);
        assert_eq!(counter_for(CommandId(u8::MAX)), None);
    }
}
