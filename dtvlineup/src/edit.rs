//! Lineup edits: filters, repetition and episode selection
//!
//! Small pure functions over a lineup. The channel editor wraps each of them
//! in a fetch/persist round trip.

use crate::error::{Error, Result};
use crate::item::{IdentityKey, TimedItem};
use crate::ordering::remove_duplicates;
use crate::time::MS_PER_HOUR;
use crate::timebox::take_first_fitting_ms;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

// ============================================================================
// Filters
// ============================================================================

/// Drops every redirect, keeping programs and offline pads
pub fn remove_redirects(items: Vec<TimedItem>) -> Vec<TimedItem> {
    items.into_iter().filter(|item| !item.is_redirect()).collect()
}

/// Keeps the first redirect to each target channel
pub fn remove_duplicate_redirects(items: Vec<TimedItem>) -> Vec<TimedItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match item.identity_key() {
            Some(IdentityKey::Channel(channel)) => seen.insert(channel),
            _ => true,
        })
        .collect()
}

/// Drops redirects and season-0 episodes
pub fn remove_specials(items: Vec<TimedItem>) -> Vec<TimedItem> {
    items
        .into_iter()
        .filter(|item| !item.is_redirect() && item.season() != Some(0))
        .collect()
}

/// Drops offline pads, keeping redirects
pub fn remove_offline_pads(items: Vec<TimedItem>) -> Vec<TimedItem> {
    items.into_iter().filter(|item| !item.is_offline_pad()).collect()
}

/// Drops the episodes of a show, or of a single season when `season` is given
pub fn delete_show(items: Vec<TimedItem>, show: &str, season: Option<u32>) -> Vec<TimedItem> {
    items
        .into_iter()
        .filter(|item| {
            if item.show_title() != Some(show) {
                return true;
            }
            match season {
                Some(season) => item.season() != Some(season),
                None => false,
            }
        })
        .collect()
}

// ============================================================================
// Repetition
// ============================================================================

/// Rotates right by `shift` positions
///
/// `rotate([A, B, C], 1)` is `[C, A, B]`; the shift wraps around the length.
pub fn rotate(mut items: Vec<TimedItem>, shift: usize) -> Vec<TimedItem> {
    if !items.is_empty() {
        let shift = shift % items.len();
        items.rotate_right(shift);
    }
    items
}

/// Empty lineup able to hold `times` copies of `items`
fn repeat_buffer(items: &[TimedItem], times: usize) -> Result<Vec<TimedItem>> {
    let too_large = Error::RepeatCountTooLarge { len: items.len(), times };
    let len = items.len().checked_mul(times).ok_or(too_large)?;
    let mut lineup = Vec::new();
    lineup
        .try_reserve_exact(len)
        .map_err(|_| Error::RepeatCountTooLarge { len: items.len(), times })?;
    Ok(lineup)
}

/// The lineup repeated `times` times, in order
pub fn replicate(items: &[TimedItem], times: usize) -> Result<Vec<TimedItem>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let mut lineup = repeat_buffer(items, times)?;
    for _ in 0..times {
        lineup.extend_from_slice(items);
    }
    Ok(lineup)
}

/// The lineup repeated `times` times, each copy shuffled independently
pub fn replicate_and_shuffle<R: Rng + ?Sized>(
    items: &[TimedItem],
    times: usize,
    rng: &mut R,
) -> Result<Vec<TimedItem>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let mut lineup = repeat_buffer(items, times)?;
    for _ in 0..times {
        let mut copy = items.to_vec();
        copy.shuffle(rng);
        lineup.extend(copy);
    }
    Ok(lineup)
}

/// Builds a block of reruns
///
/// The lineup is de-duplicated, the first `length_hours` of programs are
/// taken, padded with dead air to exactly `length_hours`, and the block is
/// repeated `times` times.
pub fn reruns(items: Vec<TimedItem>, length_hours: u32, times: usize) -> Result<Vec<TimedItem>> {
    let budget_ms = u64::from(length_hours) * MS_PER_HOUR;
    let block = take_first_fitting_ms(remove_duplicates(items), budget_ms);
    let shortfall = block.shortfall_ms(budget_ms);

    let mut programs = block.items;
    if shortfall > 0 {
        programs.push(TimedItem::offline(shortfall));
    }
    replicate(&programs, times)
}

// ============================================================================
// Episode selection
// ============================================================================

/// First `count` items
pub fn take_episode_count(mut items: Vec<TimedItem>, count: usize) -> Vec<TimedItem> {
    items.truncate(count);
    items
}

/// Items walked in order until the running total reaches `duration_ms`
///
/// An item that would push the selection past `duration_ms` is skipped unless
/// `allow_overtime` is set. Skipped items still count toward the walk, so the
/// walk stops after at most the same number of items either way.
pub fn take_episode_duration(items: Vec<TimedItem>, duration_ms: u64, allow_overtime: bool) -> Vec<TimedItem> {
    let mut selected = Vec::new();
    let mut walked: u64 = 0;

    for item in items {
        if walked >= duration_ms {
            break;
        }
        let duration = item.duration_ms();
        let overflows = walked.saturating_add(duration) > duration_ms;
        walked = walked.saturating_add(duration);
        if !overflows || allow_overtime {
            selected.push(item);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::total_duration_ms;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(items: &[TimedItem]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn channel() -> Vec<TimedItem> {
        vec![
            TimedItem::episode("X", 0, 1, 10),
            TimedItem::episode("X", 1, 1, 10),
            TimedItem::episode("X", 2, 1, 10),
            TimedItem::redirect(4, 20),
            TimedItem::movie("M", 30),
            TimedItem::offline(5),
            TimedItem::redirect(4, 20),
            TimedItem::redirect(5, 20),
            TimedItem::episode("Y", 1, 1, 10),
        ]
    }

    #[test]
    fn test_remove_redirects_keeps_pads() {
        let out = remove_redirects(channel());
        assert_eq!(out.len(), 6);
        assert!(out.iter().any(TimedItem::is_offline_pad));
    }

    #[test]
    fn test_remove_duplicate_redirects() {
        let out = remove_duplicate_redirects(channel());
        assert_eq!(out.iter().filter(|i| i.redirect_channel() == Some(4)).count(), 1);
        assert_eq!(out.iter().filter(|i| i.redirect_channel() == Some(5)).count(), 1);
        assert_eq!(out.len(), channel().len() - 1);
    }

    #[test]
    fn test_remove_specials() {
        let out = remove_specials(channel());
        assert_eq!(
            names(&out),
            vec!["X - s1e1", "X - s2e1", "M", "Offline(5 ms)", "Y - s1e1"]
        );
    }

    #[test]
    fn test_remove_offline_pads() {
        let out = remove_offline_pads(channel());
        assert!(out.iter().all(|i| !i.is_offline_pad()));
        assert_eq!(out.iter().filter(|i| i.is_redirect()).count(), 3);
    }

    #[test]
    fn test_delete_show_whole() {
        let out = delete_show(channel(), "X", None);
        assert!(out.iter().all(|i| i.show_title() != Some("X")));
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn test_delete_show_single_season_only() {
        // Only season 1 goes; seasons 0 and 2 stay
        let out = delete_show(channel(), "X", Some(1));
        let seasons: Vec<u32> = out
            .iter()
            .filter(|i| i.show_title() == Some("X"))
            .filter_map(TimedItem::season)
            .collect();
        assert_eq!(seasons, vec![0, 2]);
        assert_eq!(out.len(), channel().len() - 1);
    }

    #[test]
    fn test_rotate() {
        let items = vec![
            TimedItem::movie("A", 1),
            TimedItem::movie("B", 1),
            TimedItem::movie("C", 1),
        ];
        assert_eq!(names(&rotate(items.clone(), 1)), vec!["C", "A", "B"]);
        assert_eq!(rotate(items.clone(), 3), items);
        assert_eq!(names(&rotate(items, 5)), vec!["B", "C", "A"]);
        assert!(rotate(Vec::new(), 2).is_empty());
    }

    #[test]
    fn test_replicate() {
        let items = vec![TimedItem::movie("A", 1), TimedItem::movie("B", 2)];
        assert_eq!(names(&replicate(&items, 3).unwrap()), vec!["A", "B", "A", "B", "A", "B"]);
        assert!(replicate(&items, 0).unwrap().is_empty());
        assert!(replicate(&[], usize::MAX).unwrap().is_empty());

        let mut rng = StdRng::seed_from_u64(11);
        let shuffled = replicate_and_shuffle(&items, 4, &mut rng).unwrap();
        assert_eq!(shuffled.len(), 8);
        for chunk in shuffled.chunks(2) {
            let mut chunk = names(chunk);
            chunk.sort();
            assert_eq!(chunk, vec!["A", "B"]);
        }
    }

    #[test]
    fn test_replicate_count_overflow() {
        let items = vec![TimedItem::movie("A", 1), TimedItem::movie("B", 2)];
        assert!(matches!(
            replicate(&items, usize::MAX),
            Err(Error::RepeatCountTooLarge { len: 2, .. })
        ));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(replicate_and_shuffle(&items, usize::MAX, &mut rng).is_err());
        assert!(reruns(items, 1, usize::MAX).is_err());
    }

    #[test]
    fn test_reruns_block() {
        let hour = MS_PER_HOUR;
        let items = vec![
            TimedItem::movie("A", hour).with_rating_key("a"),
            TimedItem::movie("A", hour).with_rating_key("a"),
            TimedItem::movie("B", hour / 2).with_rating_key("b"),
            TimedItem::movie("C", 2 * hour).with_rating_key("c"),
        ];
        let out = reruns(items, 2, 2).unwrap();
        assert_eq!(
            out,
            vec![
                TimedItem::movie("A", hour).with_rating_key("a"),
                TimedItem::movie("B", hour / 2).with_rating_key("b"),
                TimedItem::offline(hour / 2),
                TimedItem::movie("A", hour).with_rating_key("a"),
                TimedItem::movie("B", hour / 2).with_rating_key("b"),
                TimedItem::offline(hour / 2),
            ]
        );
        assert_eq!(total_duration_ms(&out), 4 * hour);
    }

    #[test]
    fn test_take_episode_count() {
        assert_eq!(take_episode_count(channel(), 2).len(), 2);
        assert_eq!(take_episode_count(channel(), 100).len(), channel().len());
    }

    #[test]
    fn test_take_episode_duration() {
        let items = vec![
            TimedItem::movie("A", 40),
            TimedItem::movie("B", 50),
            TimedItem::movie("C", 5),
        ];
        // B overflows and is skipped, the walk then reaches 90 and stops
        assert_eq!(names(&take_episode_duration(items.clone(), 60, false)), vec!["A"]);
        assert_eq!(
            names(&take_episode_duration(items.clone(), 60, true)),
            vec!["A", "B"]
        );
        assert_eq!(take_episode_duration(items.clone(), 1000, false), items);
        assert!(take_episode_duration(items, 0, true).is_empty());
    }
}
