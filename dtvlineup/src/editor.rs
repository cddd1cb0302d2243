//! Channel and filler editors
//!
//! An editor fetches a lineup from its [`LineupStore`], runs one engine
//! operation on it and writes the result back. Operations answer
//! `Ok(false)` when the computed lineup is empty and nothing was written,
//! `Ok(true)` when the new lineup was persisted.

use crate::edit;
use crate::error::{Error, Result};
use crate::item::TimedItem;
use crate::night::NightBlock;
use crate::ordering::{self, OrderingStrategy, DEFAULT_MARGIN_OF_CORRECTION};
use crate::padding::pad_times;
use crate::store::{Lineup, LineupStore};
use crate::time::{Clock, SystemClock, TimeShift};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Tunables shared by the editors
#[derive(Debug, Clone, PartialEq)]
pub struct LineupOptions {
    /// Margin used by balance shows
    pub margin_of_correction: f64,
    /// Episodes per block in block shuffle
    pub block_length: usize,
    /// Random block sizes in block shuffle
    pub randomize_blocks: bool,
    /// Grid interval used by padding, 0 for hourly
    pub pad_minutes: u32,
    /// Seed of the random source; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for LineupOptions {
    fn default() -> Self {
        Self {
            margin_of_correction: DEFAULT_MARGIN_OF_CORRECTION,
            block_length: 1,
            randomize_blocks: false,
            pad_minutes: 30,
            seed: None,
        }
    }
}

impl LineupOptions {
    /// Random source for the random strategies
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

// ============================================================================
// ChannelEditor
// ============================================================================

/// Runs engine operations against the channels of a store
pub struct ChannelEditor<S: LineupStore, C: Clock = SystemClock> {
    store: Arc<S>,
    clock: C,
    options: LineupOptions,
    rng: Mutex<StdRng>,
}

impl<S: LineupStore> ChannelEditor<S, SystemClock> {
    /// Editor on the system clock with default options
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock, LineupOptions::default())
    }
}

impl<S: LineupStore, C: Clock> ChannelEditor<S, C> {
    pub fn with_clock(store: Arc<S>, clock: C, options: LineupOptions) -> Self {
        let rng = Mutex::new(options.rng());
        Self {
            store,
            clock,
            options,
            rng,
        }
    }

    pub fn options(&self) -> &LineupOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetches a channel, rewrites its items and persists the result
    ///
    /// The start time is kept unless `rewrite` returns a new one.
    async fn rewrite<F>(&self, channel: u32, operation: &'static str, rewrite: F) -> Result<bool>
    where
        F: FnOnce(Vec<TimedItem>, &mut StdRng) -> Result<(Vec<TimedItem>, Option<DateTime<Utc>>)>,
    {
        let lineup = self.store.channel_lineup(channel).await?;
        let before = lineup.items.len();

        let (items, start_time) = {
            let mut rng = self.rng.lock().await;
            rewrite(lineup.items, &mut *rng)?
        };

        if items.is_empty() {
            debug!(channel, operation, "Empty lineup, nothing written");
            return Ok(false);
        }

        let lineup = Lineup::new(items, start_time.unwrap_or(lineup.start_time));
        info!(
            channel,
            operation,
            before,
            after = lineup.items.len(),
            duration_ms = lineup.duration_ms(),
            "Replacing channel lineup"
        );
        self.store.replace_channel_lineup(channel, lineup).await?;
        Ok(true)
    }

    /// Same as [`rewrite`](Self::rewrite) for operations that keep the start time
    async fn reorder<F>(&self, channel: u32, operation: &'static str, reorder: F) -> Result<bool>
    where
        F: FnOnce(Vec<TimedItem>, &mut StdRng) -> Result<Vec<TimedItem>>,
    {
        self.rewrite(channel, operation, |items, rng| Ok((reorder(items, rng)?, None)))
            .await
    }

    // ------------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------------

    /// Applies any ordering strategy to a channel
    pub async fn apply_strategy(&self, channel: u32, strategy: &OrderingStrategy) -> Result<bool> {
        self.reorder(channel, strategy.name(), |items, rng| strategy.apply(items, rng))
            .await
    }

    pub async fn sort_alphabetically(&self, channel: u32) -> Result<bool> {
        self.apply_strategy(channel, &OrderingStrategy::Alphabetical).await
    }

    pub async fn sort_by_release_date(&self, channel: u32) -> Result<bool> {
        self.apply_strategy(channel, &OrderingStrategy::ReleaseDate).await
    }

    pub async fn sort_by_season_order(&self, channel: u32) -> Result<bool> {
        self.apply_strategy(channel, &OrderingStrategy::SeasonOrder).await
    }

    pub async fn sort_by_duration(&self, channel: u32) -> Result<bool> {
        self.apply_strategy(channel, &OrderingStrategy::Duration).await
    }

    pub async fn sort_randomly(&self, channel: u32) -> Result<bool> {
        self.apply_strategy(channel, &OrderingStrategy::Random).await
    }

    pub async fn cyclical_shuffle(&self, channel: u32) -> Result<bool> {
        self.apply_strategy(channel, &OrderingStrategy::CyclicalShuffle).await
    }

    /// Block shuffle with the configured block length and randomization
    pub async fn block_shuffle(&self, channel: u32) -> Result<bool> {
        let strategy = OrderingStrategy::BlockShuffle {
            block_length: self.options.block_length,
            randomize: self.options.randomize_blocks,
        };
        self.apply_strategy(channel, &strategy).await
    }

    /// Balance shows with the configured margin
    pub async fn balance_shows(&self, channel: u32) -> Result<bool> {
        let strategy = OrderingStrategy::BalanceShows {
            margin_of_correction: self.options.margin_of_correction,
        };
        self.apply_strategy(channel, &strategy).await
    }

    /// Removes duplicate programs, and every redirect with them
    pub async fn remove_duplicate_programs(&self, channel: u32) -> Result<bool> {
        self.apply_strategy(channel, &OrderingStrategy::RemoveDuplicates).await
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    pub async fn remove_redirects(&self, channel: u32) -> Result<bool> {
        self.reorder(channel, "remove_redirects", |items, _| Ok(edit::remove_redirects(items)))
            .await
    }

    pub async fn remove_duplicate_redirects(&self, channel: u32) -> Result<bool> {
        self.reorder(channel, "remove_duplicate_redirects", |items, _| {
            Ok(edit::remove_duplicate_redirects(items))
        })
        .await
    }

    pub async fn remove_specials(&self, channel: u32) -> Result<bool> {
        self.reorder(channel, "remove_specials", |items, _| Ok(edit::remove_specials(items)))
            .await
    }

    pub async fn remove_offline_pads(&self, channel: u32) -> Result<bool> {
        self.reorder(channel, "remove_offline_pads", |items, _| {
            Ok(edit::remove_offline_pads(items))
        })
        .await
    }

    /// Deletes a show, or one of its seasons
    pub async fn delete_show(&self, channel: u32, show: &str, season: Option<u32>) -> Result<bool> {
        self.reorder(channel, "delete_show", |items, _| {
            Ok(edit::delete_show(items, show, season))
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Repetition
    // ------------------------------------------------------------------------

    pub async fn replicate(&self, channel: u32, times: usize) -> Result<bool> {
        self.reorder(channel, "replicate", |items, _| edit::replicate(&items, times))
            .await
    }

    pub async fn replicate_and_shuffle(&self, channel: u32, times: usize) -> Result<bool> {
        self.reorder(channel, "replicate_and_shuffle", |items, rng| {
            edit::replicate_and_shuffle(&items, times, rng)
        })
        .await
    }

    /// Replaces the lineup with a repeated block of reruns starting at `start_time`
    pub async fn add_reruns(
        &self,
        channel: u32,
        start_time: DateTime<Utc>,
        length_hours: u32,
        times: usize,
    ) -> Result<bool> {
        if start_time > self.clock.now_utc() {
            return Err(Error::StartTimeInFuture);
        }
        self.rewrite(channel, "add_reruns", |items, _| {
            Ok((edit::reruns(items, length_hours, times)?, Some(start_time)))
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Episode selection
    // ------------------------------------------------------------------------

    /// Appends the first `count` of `episodes` to a channel
    pub async fn add_episode_count(&self, channel: u32, episodes: Vec<TimedItem>, count: usize) -> Result<bool> {
        let selected = edit::take_episode_count(episodes, count);
        if selected.is_empty() {
            return Ok(false);
        }
        self.reorder(channel, "add_episode_count", |mut items, _| {
            items.extend(selected);
            Ok(items)
        })
        .await
    }

    /// Appends about `duration_ms` worth of `episodes` to a channel
    pub async fn add_episode_duration(
        &self,
        channel: u32,
        episodes: Vec<TimedItem>,
        duration_ms: u64,
        allow_overtime: bool,
    ) -> Result<bool> {
        let selected = edit::take_episode_duration(episodes, duration_ms, allow_overtime);
        if selected.is_empty() {
            return Ok(false);
        }
        self.reorder(channel, "add_episode_duration", |mut items, _| {
            items.extend(selected);
            Ok(items)
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Grid and night blocks
    // ------------------------------------------------------------------------

    /// Pads programs so each one starts on a `minutes` grid
    pub async fn pad_times(&self, channel: u32, minutes: u32) -> Result<bool> {
        self.reorder(channel, "pad_times", |items, _| Ok(pad_times(items, minutes, &self.clock)))
            .await
    }

    /// Pads programs on the configured grid
    pub async fn pad_times_default(&self, channel: u32) -> Result<bool> {
        self.pad_times(channel, self.options.pad_minutes).await
    }

    async fn night_block(&self, night_channel: u32, start_hour: u32, end_hour: u32) -> Result<NightBlock> {
        let block = NightBlock::new(night_channel, start_hour, end_hour)?;
        let known = self.store.channel_numbers().await?;
        block.validate_target(&known)?;
        Ok(block)
    }

    /// Redirects the channel to `night_channel` between `start_hour` and `end_hour`
    ///
    /// The channel restarts at the end of the most recent night block.
    pub async fn add_channel_at_night(
        &self,
        channel: u32,
        night_channel: u32,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<bool> {
        let block = self.night_block(night_channel, start_hour, end_hour).await?;
        self.rewrite(channel, "add_channel_at_night", |items, _| {
            let composition = block.compose(items, &self.clock)?;
            Ok((composition.items, composition.start_time))
        })
        .await
    }

    /// Same as [`add_channel_at_night`](Self::add_channel_at_night), keeping
    /// the channel's start time
    pub async fn add_channel_at_night_alt(
        &self,
        channel: u32,
        night_channel: u32,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<bool> {
        let block = self.night_block(night_channel, start_hour, end_hour).await?;
        let channel_start = self.store.channel_lineup(channel).await?.start_time;
        self.rewrite(channel, "add_channel_at_night_alt", |items, _| {
            let composition = block.compose_from(items, channel_start, &self.clock)?;
            Ok((composition.items, composition.start_time))
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Start time
    // ------------------------------------------------------------------------

    /// Moves the channel start time forward
    pub async fn fast_forward(&self, channel: u32, shift: TimeShift) -> Result<bool> {
        let lineup = self.store.channel_lineup(channel).await?;
        let start_time = shift.apply(lineup.start_time)?;
        info!(channel, from = %lineup.start_time, to = %start_time, "Shifting channel start time");
        self.store
            .replace_channel_lineup(channel, Lineup::new(lineup.items, start_time))
            .await?;
        Ok(true)
    }

    /// Moves the channel start time backward
    pub async fn rewind(&self, channel: u32, shift: TimeShift) -> Result<bool> {
        self.fast_forward(channel, shift.negated()).await
    }
}

// ============================================================================
// FillerEditor
// ============================================================================

/// Runs engine operations against the filler lists of a store
pub struct FillerEditor<S: LineupStore> {
    store: Arc<S>,
    rng: Mutex<StdRng>,
}

impl<S: LineupStore> FillerEditor<S> {
    pub fn new(store: Arc<S>, options: &LineupOptions) -> Self {
        Self {
            store,
            rng: Mutex::new(options.rng()),
        }
    }

    async fn rewrite<F>(&self, filler: &str, operation: &'static str, rewrite: F) -> Result<bool>
    where
        F: FnOnce(Vec<TimedItem>, &mut StdRng) -> Vec<TimedItem>,
    {
        let items = self.store.filler_content(filler).await?;
        let items = {
            let mut rng = self.rng.lock().await;
            rewrite(items, &mut *rng)
        };
        if items.is_empty() {
            debug!(filler, operation, "Empty filler list, nothing written");
            return Ok(false);
        }
        info!(filler, operation, items = items.len(), "Replacing filler content");
        self.store.replace_filler_content(filler, items).await?;
        Ok(true)
    }

    pub async fn sort_by_duration(&self, filler: &str) -> Result<bool> {
        self.rewrite(filler, "sort_by_duration", |items, _| ordering::by_duration(items))
            .await
    }

    pub async fn sort_randomly(&self, filler: &str) -> Result<bool> {
        self.rewrite(filler, "sort_randomly", |items, rng| ordering::randomly(items, rng))
            .await
    }

    pub async fn remove_duplicates(&self, filler: &str) -> Result<bool> {
        self.rewrite(filler, "remove_duplicates", |items, _| ordering::remove_duplicates(items))
            .await
    }
}
