//! Lineup store: where channel and filler lineups live
//!
//! The engine itself never does I/O. A [`LineupStore`] fetches the current
//! lineup of a channel or filler list and replaces it atomically once a new
//! one has been computed. [`MemoryLineupStore`] keeps everything in memory.

use crate::error::{Error, Result};
use crate::item::{total_duration_ms, TimedItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Programs of a channel and the instant the first one starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineup {
    #[serde(rename = "programs")]
    pub items: Vec<TimedItem>,
    pub start_time: DateTime<Utc>,
}

impl Lineup {
    pub fn new(items: Vec<TimedItem>, start_time: DateTime<Utc>) -> Self {
        Self { items, start_time }
    }

    /// Cumulative duration of the lineup
    pub fn duration_ms(&self) -> u64 {
        total_duration_ms(&self.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Backing store of channel and filler lineups
///
/// `replace_channel_lineup` is all-or-nothing: items and start time are
/// written together, and the store derives the cumulative duration.
#[async_trait]
pub trait LineupStore: Send + Sync {
    /// Current lineup of a channel
    async fn channel_lineup(&self, channel: u32) -> Result<Lineup>;

    /// Replaces the lineup of a channel
    async fn replace_channel_lineup(&self, channel: u32, lineup: Lineup) -> Result<()>;

    /// Numbers of every channel the store knows about
    async fn channel_numbers(&self) -> Result<Vec<u32>>;

    /// Content of a filler list
    async fn filler_content(&self, filler: &str) -> Result<Vec<TimedItem>>;

    /// Replaces the content of a filler list
    async fn replace_filler_content(&self, filler: &str, items: Vec<TimedItem>) -> Result<()>;
}

#[derive(Debug, Default)]
struct StoreState {
    channels: BTreeMap<u32, StoredChannel>,
    fillers: BTreeMap<String, Vec<TimedItem>>,
}

#[derive(Debug, Clone)]
struct StoredChannel {
    lineup: Lineup,
    duration_ms: u64,
}

impl StoredChannel {
    fn new(lineup: Lineup) -> Self {
        let duration_ms = lineup.duration_ms();
        Self { lineup, duration_ms }
    }
}

/// In-memory [`LineupStore`]
#[derive(Debug, Default)]
pub struct MemoryLineupStore {
    state: RwLock<StoreState>,
}

impl MemoryLineupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites a channel
    pub async fn insert_channel(&self, channel: u32, lineup: Lineup) {
        let mut state = self.state.write().await;
        state.channels.insert(channel, StoredChannel::new(lineup));
    }

    /// Adds or overwrites a filler list
    pub async fn insert_filler(&self, filler: impl Into<String>, items: Vec<TimedItem>) {
        let mut state = self.state.write().await;
        state.fillers.insert(filler.into(), items);
    }

    /// Cumulative duration recorded for a channel
    pub async fn recorded_duration(&self, channel: u32) -> Option<u64> {
        let state = self.state.read().await;
        state.channels.get(&channel).map(|c| c.duration_ms)
    }
}

#[async_trait]
impl LineupStore for MemoryLineupStore {
    async fn channel_lineup(&self, channel: u32) -> Result<Lineup> {
        let state = self.state.read().await;
        state
            .channels
            .get(&channel)
            .map(|c| c.lineup.clone())
            .ok_or(Error::ChannelNotFound(channel))
    }

    async fn replace_channel_lineup(&self, channel: u32, lineup: Lineup) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .channels
            .get_mut(&channel)
            .ok_or(Error::ChannelNotFound(channel))?;
        *stored = StoredChannel::new(lineup);
        debug!(
            channel,
            items = stored.lineup.items.len(),
            duration_ms = stored.duration_ms,
            "Stored channel lineup"
        );
        Ok(())
    }

    async fn channel_numbers(&self) -> Result<Vec<u32>> {
        let state = self.state.read().await;
        Ok(state.channels.keys().copied().collect())
    }

    async fn filler_content(&self, filler: &str) -> Result<Vec<TimedItem>> {
        let state = self.state.read().await;
        state
            .fillers
            .get(filler)
            .cloned()
            .ok_or_else(|| Error::FillerListNotFound(filler.to_string()))
    }

    async fn replace_filler_content(&self, filler: &str, items: Vec<TimedItem>) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .fillers
            .get_mut(filler)
            .ok_or_else(|| Error::FillerListNotFound(filler.to_string()))?;
        *stored = items;
        Ok(())
    }
}
