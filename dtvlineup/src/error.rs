//! Error types for the lineup engine

/// Result type alias for lineup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building or applying a lineup
///
/// Every variant except the store lookups, [`Error::Store`] and
/// [`Error::Other`] is a configuration error: it is raised before any output
/// sequence exists and retrying the same call cannot succeed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An hour parameter is outside 0..=23
    #[error("{name} must be between 0 and 23, got {value}")]
    InvalidHour { name: &'static str, value: u32 },

    /// Start and end hour are equal, which would describe a 24-hour night block
    #[error("Cannot add a 24-hour channel at night (start_hour == end_hour == {hour})")]
    FullDayNightBlock { hour: u32 },

    /// Redirect target channel is not known to the lineup store
    #[error("Channel #{0} does not exist")]
    UnknownChannel(u32),

    /// Release date string is not a `YYYY-MM-DD` date
    #[error("Invalid release date '{date}': {source}")]
    InvalidReleaseDate {
        date: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Block shuffle needs at least one episode per block
    #[error("block_length must be at least 1, got {0}")]
    InvalidBlockLength(usize),

    /// Balance margin must be a finite, non-negative ratio
    #[error("margin_of_correction must be finite and >= 0, got {0}")]
    InvalidMargin(f64),

    /// A single item is longer than the daytime block it must fit in
    #[error("Program of {duration_ms} ms does not fit in a {block_ms} ms day block")]
    ProgramExceedsBlock { duration_ms: u64, block_ms: u64 },

    /// Repeating the lineup would not fit in memory
    #[error("Cannot repeat {len} items {times} times")]
    RepeatCountTooLarge { len: usize, times: usize },

    /// Reruns cannot be anchored in the future
    #[error("Cannot use a start time in the future")]
    StartTimeInFuture,

    /// Malformed `HH:MM[:SS]` time string
    #[error("Invalid time string '{0}', expected HH:MM or HH:MM:SS")]
    InvalidTimeString(String),

    /// Time shift overflows the representable date range
    #[error("Time shift out of range")]
    InvalidTimeShift,

    /// Channel not found in the lineup store
    #[error("Channel not found: {0}")]
    ChannelNotFound(u32),

    /// Filler list not found in the lineup store
    #[error("Filler list not found: {0}")]
    FillerListNotFound(String),

    /// Lineup store failure
    #[error("Lineup store error: {0}")]
    Store(String),

    /// Configuration error (from dtvconfig/anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a lineup store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// `true` for errors caused by the call's own parameters
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            Error::ChannelNotFound(_)
                | Error::FillerListNotFound(_)
                | Error::Store(_)
                | Error::Other(_)
        )
    }
}
