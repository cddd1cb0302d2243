//! Show grouping: show → season → episode
//!
//! [`ShowGroup::split`] sorts a flat lineup into a typed nested structure and
//! a list of everything that is not a groupable episode. Seasons and episodes
//! are kept in `BTreeMap`s so numeric order never depends on arrival order;
//! the first-appearance order of shows is tracked separately because block
//! shuffle walks shows in that order.

use crate::item::TimedItem;
use std::collections::{BTreeMap, VecDeque};

type Seasons = BTreeMap<u32, BTreeMap<u32, TimedItem>>;

/// Episodes of several shows, indexed by show title, season and episode number
#[derive(Debug, Clone, Default)]
pub struct ShowGroup {
    shows: BTreeMap<String, Seasons>,
    arrival: Vec<String>,
}

/// Episodes of one show in season/episode order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowQueue {
    pub title: String,
    pub episodes: VecDeque<TimedItem>,
}

impl ShowQueue {
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Total duration of the queued episodes
    pub fn duration_ms(&self) -> u64 {
        self.episodes.iter().map(TimedItem::duration_ms).sum()
    }
}

impl ShowGroup {
    /// Splits a lineup into its show grouping and the non-show items
    ///
    /// An item is grouped when it is an episode with both a season and an
    /// episode number. A later episode with the same (show, season, episode)
    /// triple replaces the earlier one. Non-show items keep their relative
    /// order.
    pub fn split(items: Vec<TimedItem>) -> (ShowGroup, Vec<TimedItem>) {
        let mut group = ShowGroup::default();
        let mut non_shows = Vec::new();

        for item in items {
            let slot = item
                .show_slot()
                .map(|(show, season, episode)| (show.to_string(), season, episode));
            let Some((show, season, episode)) = slot else {
                non_shows.push(item);
                continue;
            };
            if !group.shows.contains_key(&show) {
                group.arrival.push(show.clone());
            }
            group
                .shows
                .entry(show)
                .or_default()
                .entry(season)
                .or_default()
                .insert(episode, item);
        }

        (group, non_shows)
    }

    /// Groups a lineup, discarding the non-show items
    pub fn from_items(items: Vec<TimedItem>) -> ShowGroup {
        Self::split(items).0
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn show_count(&self) -> usize {
        self.shows.len()
    }

    pub fn episode_count(&self) -> usize {
        self.shows
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Show titles in order of first appearance
    pub fn show_titles(&self) -> impl Iterator<Item = &str> {
        self.arrival.iter().map(String::as_str)
    }

    /// Season numbers of a show, ascending
    pub fn seasons(&self, show: &str) -> Vec<u32> {
        self.shows
            .get(show)
            .map(|seasons| seasons.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, show: &str, season: u32, episode: u32) -> Option<&TimedItem> {
        self.shows.get(show)?.get(&season)?.get(&episode)
    }

    /// Total duration of every episode of a show
    pub fn show_duration_ms(&self, show: &str) -> Option<u64> {
        self.shows.get(show).map(|seasons| {
            seasons
                .values()
                .flat_map(BTreeMap::values)
                .map(TimedItem::duration_ms)
                .sum()
        })
    }

    /// Total duration of one season of a show
    pub fn season_duration_ms(&self, show: &str, season: u32) -> Option<u64> {
        self.shows
            .get(show)?
            .get(&season)
            .map(|episodes| episodes.values().map(TimedItem::duration_ms).sum())
    }

    /// Flattens to shows alphabetically, then seasons and episodes ascending
    pub fn into_season_order(self) -> Vec<TimedItem> {
        self.into_sorted_queues()
            .into_iter()
            .flat_map(|queue| queue.episodes)
            .collect()
    }

    /// One queue per show, shows sorted alphabetically
    pub fn into_sorted_queues(self) -> Vec<ShowQueue> {
        self.shows
            .into_iter()
            .map(|(title, seasons)| Self::queue(title, seasons))
            .collect()
    }

    /// One queue per show, shows in order of first appearance
    pub fn into_arrival_queues(mut self) -> Vec<ShowQueue> {
        let arrival = std::mem::take(&mut self.arrival);
        arrival
            .into_iter()
            .filter_map(|title| {
                let seasons = self.shows.remove(&title)?;
                Some(Self::queue(title, seasons))
            })
            .collect()
    }

    fn queue(title: String, seasons: Seasons) -> ShowQueue {
        ShowQueue {
            title,
            episodes: seasons.into_values().flat_map(BTreeMap::into_values).collect(),
        }
    }
}
