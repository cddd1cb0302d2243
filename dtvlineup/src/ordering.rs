//! Ordering strategies
//!
//! Every strategy consumes a lineup and returns a new one. Strategies that
//! only reorder are duration-preserving permutations; [`by_duration`],
//! [`balance_shows`] and [`remove_duplicates`] also filter.
//!
//! Random strategies take the random source as a parameter, so a seeded
//! `StdRng` gives reproducible lineups.

use crate::edit::rotate;
use crate::error::{Error, Result};
use crate::grouping::{ShowGroup, ShowQueue};
use crate::item::TimedItem;
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Default margin used by [`balance_shows`]
pub const DEFAULT_MARGIN_OF_CORRECTION: f64 = 0.1;

/// Release date format
const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Items with a title key sorted by it, untitled items appended in original order
pub fn alphabetical(items: Vec<TimedItem>) -> Vec<TimedItem> {
    let (mut titled, untitled): (Vec<_>, Vec<_>) =
        items.into_iter().partition(|item| item.sort_title().is_some());

    // sort_by est stable : les ex aequo gardent leur ordre
    titled.sort_by(|a, b| a.sort_title().cmp(&b.sort_title()));
    titled.extend(untitled);
    titled
}

/// Dated items ascending by release date, undated items appended alphabetically
///
/// A malformed date is a caller bug and fails the whole call.
pub fn by_release_date(items: Vec<TimedItem>) -> Result<Vec<TimedItem>> {
    let mut dated = Vec::new();
    let mut undated = Vec::new();

    for item in items {
        match item.release_date() {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw, RELEASE_DATE_FORMAT).map_err(|source| {
                    Error::InvalidReleaseDate {
                        date: raw.to_string(),
                        source,
                    }
                })?;
                dated.push((date, item));
            }
            None => undated.push(item),
        }
    }

    dated.sort_by_key(|(date, _)| *date);
    let mut sorted: Vec<TimedItem> = dated.into_iter().map(|(_, item)| item).collect();
    sorted.extend(alphabetical(undated));
    Ok(sorted)
}

/// Shows in show → season → episode order, then non-shows alphabetically
pub fn by_season_order(items: Vec<TimedItem>) -> Vec<TimedItem> {
    let (group, non_shows) = ShowGroup::split(items);
    let mut sorted = group.into_season_order();
    sorted.extend(alphabetical(non_shows));
    sorted
}

/// Non-redirect items ascending by duration; redirects are dropped
pub fn by_duration(items: Vec<TimedItem>) -> Vec<TimedItem> {
    let mut sorted: Vec<TimedItem> = items.into_iter().filter(|item| !item.is_redirect()).collect();
    sorted.sort_by_key(TimedItem::duration_ms);
    sorted
}

/// Uniform random permutation
pub fn randomly<R: Rng + ?Sized>(mut items: Vec<TimedItem>, rng: &mut R) -> Vec<TimedItem> {
    items.shuffle(rng);
    items
}

/// Interleaves shows cyclically
///
/// Each show keeps its season/episode order, rotated to a random starting
/// episode. At every step the next item comes from the show pool or the
/// (shuffled) non-show pool with probability proportional to the number of
/// items left in each pool; a show pick takes the next episode of a uniformly
/// chosen non-empty show.
pub fn cyclical_shuffle<R: Rng + ?Sized>(items: Vec<TimedItem>, rng: &mut R) -> Vec<TimedItem> {
    let total = items.len();
    let (group, mut non_shows) = ShowGroup::split(items);
    non_shows.shuffle(rng);
    let mut non_shows: VecDeque<TimedItem> = non_shows.into();

    let mut queues: Vec<VecDeque<TimedItem>> = group
        .into_arrival_queues()
        .into_iter()
        .map(|queue| {
            let episodes: Vec<TimedItem> = queue.episodes.into();
            let shift = rng.random_range(0..episodes.len());
            VecDeque::from(rotate(episodes, shift))
        })
        .collect();
    let mut remaining_episodes: usize = queues.iter().map(VecDeque::len).sum();

    let mut lineup = Vec::with_capacity(total);
    while remaining_episodes + non_shows.len() > 0 {
        let pick_show = rng.random_range(0..remaining_episodes + non_shows.len()) < remaining_episodes;
        if pick_show {
            let index = rng.random_range(0..queues.len());
            if let Some(episode) = queues[index].pop_front() {
                lineup.push(episode);
                remaining_episodes -= 1;
            }
            if queues[index].is_empty() {
                queues.remove(index);
            }
        } else if let Some(item) = non_shows.pop_front() {
            lineup.push(item);
        }
    }

    lineup
}

/// Alternates shows in blocks of up to `block_length` episodes
///
/// Without `randomize`, shows take turns in order of first appearance, each
/// contributing `block_length` episodes per round. With `randomize`, a random
/// show contributes a random 1..=`block_length` episodes per turn. Non-show
/// items are appended at the end in their original order.
pub fn block_shuffle<R: Rng + ?Sized>(
    items: Vec<TimedItem>,
    block_length: usize,
    randomize: bool,
    rng: &mut R,
) -> Result<Vec<TimedItem>> {
    if block_length == 0 {
        return Err(Error::InvalidBlockLength(block_length));
    }

    let (group, non_shows) = ShowGroup::split(items);
    let mut queues: Vec<ShowQueue> = group.into_arrival_queues();
    let mut lineup = Vec::with_capacity(queues.iter().map(ShowQueue::len).sum::<usize>() + non_shows.len());

    if randomize {
        while !queues.is_empty() {
            let index = rng.random_range(0..queues.len());
            let queue = &mut queues[index];
            let count = rng.random_range(1..=block_length).min(queue.len());
            lineup.extend(queue.episodes.drain(..count));
            if queue.is_empty() {
                queues.remove(index);
            }
        }
    } else {
        while !queues.is_empty() {
            for queue in queues.iter_mut() {
                let count = block_length.min(queue.len());
                lineup.extend(queue.episodes.drain(..count));
            }
            queues.retain(|queue| !queue.is_empty());
        }
    }

    lineup.extend(non_shows);
    Ok(lineup)
}

/// Trims every show to roughly the length of the shortest one
///
/// Each show, in season/episode order, keeps episodes while its running
/// duration stays within `(1 + margin_of_correction)` times the shortest
/// show's total; the first episode over the limit ends that show. Shows are
/// emitted alphabetically, followed by the non-shows sorted alphabetically.
pub fn balance_shows(items: Vec<TimedItem>, margin_of_correction: f64) -> Result<Vec<TimedItem>> {
    if !margin_of_correction.is_finite() || margin_of_correction < 0.0 {
        return Err(Error::InvalidMargin(margin_of_correction));
    }

    let (group, non_shows) = ShowGroup::split(items);
    let queues = group.into_sorted_queues();
    let shortest = queues.iter().map(ShowQueue::duration_ms).min().unwrap_or(0);
    let within_margin = |potential: u64| match shortest {
        0 => potential == 0,
        _ => potential as f64 / shortest as f64 <= 1.0 + margin_of_correction,
    };

    let mut lineup = Vec::new();
    for queue in queues {
        let mut running: u64 = 0;
        let before = lineup.len();
        for episode in queue.episodes {
            let potential = running + episode.duration_ms();
            if !within_margin(potential) {
                break;
            }
            running = potential;
            lineup.push(episode);
        }
        debug!(
            show = %queue.title,
            kept = lineup.len() - before,
            running_ms = running,
            "Balanced show"
        );
    }

    lineup.extend(alphabetical(non_shows));
    Ok(lineup)
}

/// Drops redirects and every repeat of a catalog key
///
/// The first occurrence of each key is kept; items without a key are always
/// kept.
pub fn remove_duplicates(items: Vec<TimedItem>) -> Vec<TimedItem> {
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.is_redirect())
        .filter(|item| match item.rating_key() {
            Some(key) => seen.insert(key.to_string()),
            None => true,
        })
        .collect()
}

/// A named ordering strategy, selectable from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OrderingStrategy {
    Alphabetical,
    ReleaseDate,
    SeasonOrder,
    Duration,
    Random,
    CyclicalShuffle,
    BlockShuffle {
        block_length: usize,
        #[serde(default)]
        randomize: bool,
    },
    BalanceShows {
        #[serde(default = "default_margin")]
        margin_of_correction: f64,
    },
    RemoveDuplicates,
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN_OF_CORRECTION
}

impl OrderingStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            OrderingStrategy::Alphabetical => "alphabetical",
            OrderingStrategy::ReleaseDate => "release_date",
            OrderingStrategy::SeasonOrder => "season_order",
            OrderingStrategy::Duration => "duration",
            OrderingStrategy::Random => "random",
            OrderingStrategy::CyclicalShuffle => "cyclical_shuffle",
            OrderingStrategy::BlockShuffle { .. } => "block_shuffle",
            OrderingStrategy::BalanceShows { .. } => "balance_shows",
            OrderingStrategy::RemoveDuplicates => "remove_duplicates",
        }
    }

    /// `true` when the strategy uses the random source
    pub fn is_random(&self) -> bool {
        match self {
            OrderingStrategy::Random | OrderingStrategy::CyclicalShuffle => true,
            OrderingStrategy::BlockShuffle { randomize, .. } => *randomize,
            _ => false,
        }
    }

    /// Applies the strategy to a lineup
    pub fn apply<R: Rng + ?Sized>(&self, items: Vec<TimedItem>, rng: &mut R) -> Result<Vec<TimedItem>> {
        let input_len = items.len();
        let output = match self {
            OrderingStrategy::Alphabetical => alphabetical(items),
            OrderingStrategy::ReleaseDate => by_release_date(items)?,
            OrderingStrategy::SeasonOrder => by_season_order(items),
            OrderingStrategy::Duration => by_duration(items),
            OrderingStrategy::Random => randomly(items, rng),
            OrderingStrategy::CyclicalShuffle => cyclical_shuffle(items, rng),
            OrderingStrategy::BlockShuffle {
                block_length,
                randomize,
            } => block_shuffle(items, *block_length, *randomize, rng)?,
            OrderingStrategy::BalanceShows {
                margin_of_correction,
            } => balance_shows(items, *margin_of_correction)?,
            OrderingStrategy::RemoveDuplicates => remove_duplicates(items),
        };
        debug!(
            strategy = self.name(),
            input = input_len,
            output = output.len(),
            "Applied ordering strategy"
        );
        Ok(output)
    }
}
