//! # dtvlineup - Moteur de séquencement des lineups de chaînes
//!
//! This crate turns the flat list of programs of a dizqueTV-style channel
//! into a new lineup:
//! - Ordering strategies (alphabetical, release date, season order, duration,
//!   random, cyclical shuffle, block shuffle, balance shows, de-duplication)
//! - Time-box extraction of the first N minutes of programs
//! - Padding so programs start on a wall-clock grid
//! - Night blocks redirecting the channel to another one every night
//! - Filters, repetition, reruns and start-time shifts
//!
//! # Architecture
//!
//! - **TimedItem** : one entry of a lineup (movie, episode, track, redirect, offline pad)
//! - **ordering / timebox / padding / night / edit** : pure functions over `Vec<TimedItem>`
//! - **LineupStore** : async seam to wherever lineups are stored
//! - **ChannelEditor / FillerEditor** : fetch, compute, persist
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use std::sync::Arc;
//! use dtvlineup::{ChannelEditor, Lineup, MemoryLineupStore, TimedItem};
//!
//! # #[tokio::main]
//! # async fn main() -> dtvlineup::Result<()> {
//! let store = Arc::new(MemoryLineupStore::new());
//! store
//!     .insert_channel(
//!         1,
//!         Lineup::new(
//!             vec![
//!                 TimedItem::episode("Show", 1, 2, 1_320_000),
//!                 TimedItem::episode("Show", 1, 1, 1_320_000),
//!                 TimedItem::movie("Movie", 5_400_000),
//!             ],
//!             chrono::Utc::now(),
//!         ),
//!     )
//!     .await;
//!
//! let editor = ChannelEditor::new(store);
//! editor.sort_by_season_order(1).await?;
//! editor.pad_times(1, 30).await?;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod edit;
pub mod editor;
pub mod grouping;
pub mod item;
pub mod night;
pub mod ordering;
pub mod padding;
pub mod store;
pub mod time;
pub mod timebox;

#[cfg(feature = "dtvconfig")]
mod config_ext;

// Réexports publics
pub use editor::{ChannelEditor, FillerEditor, LineupOptions};
pub use error::{Error, Result};
pub use grouping::{ShowGroup, ShowQueue};
pub use item::{total_duration_ms, Episode, IdentityKey, ItemKind, Media, OfflinePad, Redirect, TimedItem};
pub use night::{NightBlock, NightComposition};
pub use ordering::OrderingStrategy;
pub use padding::{needed_flex_time, pad_times};
pub use store::{Lineup, LineupStore, MemoryLineupStore};
pub use time::{Clock, FixedClock, SystemClock, TimeShift};
pub use timebox::{take_first_fitting, take_first_fitting_with_remainder, TimeBox};

#[cfg(feature = "dtvconfig")]
pub use config_ext::LineupConfigExt;
