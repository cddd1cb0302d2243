//! Padding: align program boundaries to a wall-clock grid
//!
//! After every item an offline pad is inserted so the next item starts on a
//! grid boundary. The grid phase depends on whether "now" is in the first or
//! second half of the hour, which matters for grids that do not divide 30.

use crate::item::TimedItem;
use crate::time::{Clock, MS_PER_MINUTE};
use chrono::{DateTime, Timelike, Utc};
use tracing::debug;

/// Grid interval used when the caller passes 0
pub const HOURLY_MINUTES: u32 = 60;

/// Grid length in milliseconds for a grid of `minutes`, phased on `now`
///
/// `0` means hourly.
pub fn grid_length_ms(minutes: u32, now: DateTime<Utc>) -> u64 {
    let minutes = if minutes == 0 { HOURLY_MINUTES } else { minutes };
    let phase = if now.minute() >= 30 { 30 } else { 0 };
    (u64::from(minutes) + u64::from(phase % minutes)) * MS_PER_MINUTE
}

/// Milliseconds of padding needed after an item of `item_ms`
///
/// The result is in `[0, grid_length_ms)`; an item already ending on a
/// boundary needs no pad.
pub fn needed_flex_time(item_ms: u64, minutes: u32, now: DateTime<Utc>) -> u64 {
    let grid = grid_length_ms(minutes, now);
    let remainder = grid - (item_ms % grid);
    if remainder == grid {
        0
    } else {
        remainder
    }
}

/// Rebuilds a lineup as `[item, pad?, item, pad?, ...]`
///
/// Existing offline pads are stripped first; redirects are kept and padded
/// like any other item.
pub fn pad_times<C: Clock + ?Sized>(items: Vec<TimedItem>, minutes: u32, clock: &C) -> Vec<TimedItem> {
    let now = clock.now_utc();
    let mut padded = Vec::with_capacity(items.len() * 2);
    let mut pads = 0usize;

    for item in items.into_iter().filter(|item| !item.is_offline_pad()) {
        let needed = needed_flex_time(item.duration_ms(), minutes, now);
        padded.push(item);
        if needed > 0 {
            padded.push(TimedItem::offline(needed));
            pads += 1;
        }
    }

    debug!(
        minutes,
        grid_ms = grid_length_ms(minutes, now),
        pads,
        "Padded lineup to grid"
    );
    padded
}
