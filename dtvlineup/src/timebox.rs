//! Time-box extraction: carve a block of programming out of a lineup
//!
//! Extraction is greedy and order-preserving. The first item that would push
//! the running total over the budget ends the block, even if later items
//! would still fit.

use crate::item::TimedItem;
use crate::time::MS_PER_MINUTE;

/// Result of [`take_first_fitting_with_remainder`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBox {
    /// Longest prefix fitting the budget
    pub items: Vec<TimedItem>,
    /// Cumulative duration of `items`
    pub total_ms: u64,
    /// Every item not in `items`, in original order
    pub remainder: Vec<TimedItem>,
}

impl TimeBox {
    /// Budget left unused by the extracted prefix
    pub fn shortfall_ms(&self, budget_ms: u64) -> u64 {
        budget_ms.saturating_sub(self.total_ms)
    }
}

/// Length and duration of the longest prefix fitting `budget_ms`
fn fitting_prefix(items: &[TimedItem], budget_ms: u64) -> (usize, u64) {
    let mut running_total: u64 = 0;
    for (index, item) in items.iter().enumerate() {
        match running_total.checked_add(item.duration_ms()) {
            Some(next) if next <= budget_ms => running_total = next,
            _ => return (index, running_total),
        }
    }
    (items.len(), running_total)
}

/// Copies the longest prefix of `items` fitting in `minutes`
///
/// Returns the prefix and its cumulative duration in milliseconds.
pub fn take_first_fitting(items: &[TimedItem], minutes: u64) -> (Vec<TimedItem>, u64) {
    let (len, total) = fitting_prefix(items, minutes.saturating_mul(MS_PER_MINUTE));
    (items[..len].to_vec(), total)
}

/// Splits `items` into the longest prefix fitting in `minutes` and the rest
pub fn take_first_fitting_with_remainder(items: Vec<TimedItem>, minutes: u64) -> TimeBox {
    take_first_fitting_ms(items, minutes.saturating_mul(MS_PER_MINUTE))
}

/// Same as [`take_first_fitting_with_remainder`] with a budget in milliseconds
pub fn take_first_fitting_ms(mut items: Vec<TimedItem>, budget_ms: u64) -> TimeBox {
    let (len, total_ms) = fitting_prefix(&items, budget_ms);
    let remainder = items.split_off(len);
    TimeBox {
        items,
        total_ms,
        remainder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lineup() -> Vec<TimedItem> {
        vec![
            TimedItem::episode("X", 1, 1, 1_800_000),
            TimedItem::episode("X", 1, 2, 1_800_000),
            TimedItem::movie("C", 3_600_000),
        ]
    }

    #[test]
    fn test_take_first_fitting_thirty_minutes() {
        let items = lineup();
        let (prefix, total) = take_first_fitting(&items, 30);
        assert_eq!(prefix, vec![items[0].clone()]);
        assert_eq!(total, 1_800_000);

        let boxed = take_first_fitting_with_remainder(items.clone(), 30);
        assert_eq!(boxed.items, prefix);
        assert_eq!(boxed.total_ms, 1_800_000);
        assert_eq!(boxed.remainder, items[1..].to_vec());
    }

    #[test]
    fn test_no_backtracking_past_overflow() {
        let items = vec![
            TimedItem::movie("A", 10 * MS_PER_MINUTE),
            TimedItem::movie("B", 50 * MS_PER_MINUTE),
            TimedItem::movie("C", MS_PER_MINUTE),
        ];
        let boxed = take_first_fitting_with_remainder(items, 30);
        assert_eq!(boxed.items.len(), 1);
        assert_eq!(boxed.remainder.len(), 2);
        assert_eq!(boxed.shortfall_ms(30 * MS_PER_MINUTE), 20 * MS_PER_MINUTE);
    }

    #[test]
    fn test_oversized_first_item() {
        let items = vec![TimedItem::movie("Long", 120 * MS_PER_MINUTE)];
        let boxed = take_first_fitting_with_remainder(items.clone(), 60);
        assert!(boxed.items.is_empty());
        assert_eq!(boxed.total_ms, 0);
        assert_eq!(boxed.remainder, items);
    }

    #[test]
    fn test_prefix_and_remainder_partition_input() {
        let items = lineup();
        for minutes in [0, 29, 30, 60, 119, 120, 1000] {
            let boxed = take_first_fitting_with_remainder(items.clone(), minutes);
            let mut rebuilt = boxed.items.clone();
            rebuilt.extend(boxed.remainder.clone());
            assert_eq!(rebuilt, items, "minutes = {}", minutes);
        }
    }

    #[test]
    fn test_larger_budget_extends_prefix() {
        let items = lineup();
        let mut previous: Vec<TimedItem> = Vec::new();
        for minutes in [0, 30, 45, 60, 90, 120, 240] {
            let (prefix, _) = take_first_fitting(&items, minutes);
            assert!(prefix.starts_with(&previous));
            previous = prefix;
        }
        assert_eq!(previous, items);
    }
}
