//! Extension de dtvconfig pour les réglages de lineup
//!
//! [`LineupConfigExt`] adds typed accessors for the `lineup` section of the
//! configuration. Getters persist the default value when the key is absent.
//!
//! ```no_run
//! use dtvconfig::get_config;
//! use dtvlineup::LineupConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config()?;
//! let options = config.lineup_options()?;
//! println!("padding grid: {} minutes", options.pad_minutes);
//! # Ok(())
//! # }
//! ```

use crate::editor::LineupOptions;
use crate::ordering::DEFAULT_MARGIN_OF_CORRECTION;
use anyhow::Result;
use dtvconfig::Config;
use serde_yaml::{Number, Value};
use tracing::warn;

/// Default block length of block shuffle
pub const DEFAULT_BLOCK_LENGTH: usize = 1;

/// Default padding grid in minutes
pub const DEFAULT_PAD_MINUTES: u32 = 30;

const MARGIN_KEY: &[&str] = &["lineup", "balance", "margin_of_correction"];
const BLOCK_LENGTH_KEY: &[&str] = &["lineup", "block_shuffle", "block_length"];
const RANDOMIZE_KEY: &[&str] = &["lineup", "block_shuffle", "randomize"];
const PAD_MINUTES_KEY: &[&str] = &["lineup", "padding", "minutes"];
const SEED_KEY: &[&str] = &["lineup", "random", "seed"];

/// Trait d'extension pour gérer les réglages de lineup dans dtvconfig
pub trait LineupConfigExt {
    // ========================================================================
    // Balance shows
    // ========================================================================

    fn get_margin_of_correction(&self) -> Result<f64>;

    fn set_margin_of_correction(&self, margin: f64) -> Result<()>;

    // ========================================================================
    // Block shuffle
    // ========================================================================

    fn get_block_length(&self) -> Result<usize>;

    fn set_block_length(&self, block_length: usize) -> Result<()>;

    fn get_randomize_blocks(&self) -> Result<bool>;

    fn set_randomize_blocks(&self, randomize: bool) -> Result<()>;

    // ========================================================================
    // Padding
    // ========================================================================

    /// Grid interval in minutes, 0 meaning hourly
    fn get_pad_minutes(&self) -> Result<u32>;

    fn set_pad_minutes(&self, minutes: u32) -> Result<()>;

    // ========================================================================
    // Random source
    // ========================================================================

    /// Seed of the random strategies, `None` for OS entropy
    fn get_random_seed(&self) -> Result<Option<u64>>;

    fn set_random_seed(&self, seed: Option<u64>) -> Result<()>;

    /// Every lineup setting bundled for the editors
    ///
    /// Configuration failures surface as [`crate::Error::Other`].
    fn lineup_options(&self) -> crate::Result<LineupOptions>;
}

impl LineupConfigExt for Config {
    fn get_margin_of_correction(&self) -> Result<f64> {
        match self.get_value(MARGIN_KEY) {
            Ok(Value::Number(n)) if n.as_f64().is_some_and(|m| m.is_finite() && m >= 0.0) => {
                Ok(n.as_f64().unwrap_or(DEFAULT_MARGIN_OF_CORRECTION))
            }
            Ok(other) if !other.is_null() => {
                warn!(value = ?other, "Invalid margin_of_correction, using default");
                Ok(DEFAULT_MARGIN_OF_CORRECTION)
            }
            _ => {
                self.set_margin_of_correction(DEFAULT_MARGIN_OF_CORRECTION)?;
                Ok(DEFAULT_MARGIN_OF_CORRECTION)
            }
        }
    }

    fn set_margin_of_correction(&self, margin: f64) -> Result<()> {
        self.set_value(MARGIN_KEY, Value::Number(Number::from(margin)))
    }

    fn get_block_length(&self) -> Result<usize> {
        match self.get_value(BLOCK_LENGTH_KEY) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|v| usize::try_from(v).ok()) {
                Some(length) if length > 0 => Ok(length),
                _ => {
                    warn!(value = %n, "Invalid block_length, using default");
                    Ok(DEFAULT_BLOCK_LENGTH)
                }
            },
            _ => {
                self.set_block_length(DEFAULT_BLOCK_LENGTH)?;
                Ok(DEFAULT_BLOCK_LENGTH)
            }
        }
    }

    fn set_block_length(&self, block_length: usize) -> Result<()> {
        self.set_value(BLOCK_LENGTH_KEY, Value::Number(Number::from(block_length as u64)))
    }

    fn get_randomize_blocks(&self) -> Result<bool> {
        match self.get_value(RANDOMIZE_KEY) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => {
                self.set_randomize_blocks(false)?;
                Ok(false)
            }
        }
    }

    fn set_randomize_blocks(&self, randomize: bool) -> Result<()> {
        self.set_value(RANDOMIZE_KEY, Value::Bool(randomize))
    }

    fn get_pad_minutes(&self) -> Result<u32> {
        match self.get_value(PAD_MINUTES_KEY) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
                Some(minutes) => Ok(minutes),
                None => {
                    warn!(value = %n, "Invalid padding minutes, using default");
                    Ok(DEFAULT_PAD_MINUTES)
                }
            },
            _ => {
                self.set_pad_minutes(DEFAULT_PAD_MINUTES)?;
                Ok(DEFAULT_PAD_MINUTES)
            }
        }
    }

    fn set_pad_minutes(&self, minutes: u32) -> Result<()> {
        self.set_value(PAD_MINUTES_KEY, Value::Number(Number::from(minutes)))
    }

    fn get_random_seed(&self) -> Result<Option<u64>> {
        match self.get_value(SEED_KEY) {
            Ok(Value::Number(n)) => match n.as_u64() {
                Some(seed) => Ok(Some(seed)),
                None => {
                    warn!(value = %n, "Invalid random seed, using OS entropy");
                    Ok(None)
                }
            },
            Ok(Value::Null) => Ok(None),
            _ => {
                self.set_random_seed(None)?;
                Ok(None)
            }
        }
    }

    fn set_random_seed(&self, seed: Option<u64>) -> Result<()> {
        let value = match seed {
            Some(seed) => Value::Number(Number::from(seed)),
            None => Value::Null,
        };
        self.set_value(SEED_KEY, value)
    }

    fn lineup_options(&self) -> crate::Result<LineupOptions> {
        Ok(LineupOptions {
            margin_of_correction: self.get_margin_of_correction()?,
            block_length: self.get_block_length()?,
            randomize_blocks: self.get_randomize_blocks()?,
            pad_minutes: self.get_pad_minutes()?,
            seed: self.get_random_seed()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_embedded_yaml() {
        let config = Config::from_yaml_str("{}").unwrap();
        let options = config.lineup_options().unwrap();
        assert_eq!(options, LineupOptions::default());
    }

    #[test]
    fn test_external_values() {
        let config = Config::from_yaml_str(
            "lineup:\n  balance:\n    margin_of_correction: 0.25\n  block_shuffle:\n    block_length: 3\n    randomize: true\n  padding:\n    minutes: 15\n  random:\n    seed: 99\n",
        )
        .unwrap();
        let options = config.lineup_options().unwrap();
        assert_eq!(options.margin_of_correction, 0.25);
        assert_eq!(options.block_length, 3);
        assert!(options.randomize_blocks);
        assert_eq!(options.pad_minutes, 15);
        assert_eq!(options.seed, Some(99));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_yaml_str(
            "lineup:\n  balance:\n    margin_of_correction: -1.0\n  block_shuffle:\n    block_length: 0\n",
        )
        .unwrap();
        assert_eq!(config.get_margin_of_correction().unwrap(), DEFAULT_MARGIN_OF_CORRECTION);
        assert_eq!(config.get_block_length().unwrap(), DEFAULT_BLOCK_LENGTH);
    }

    #[test]
    fn test_setters_round_trip() {
        let config = Config::from_yaml_str("{}").unwrap();
        config.set_pad_minutes(20).unwrap();
        config.set_random_seed(Some(5)).unwrap();
        assert_eq!(config.get_pad_minutes().unwrap(), 20);
        assert_eq!(config.get_random_seed().unwrap(), Some(5));
        config.set_random_seed(None).unwrap();
        assert_eq!(config.get_random_seed().unwrap(), None);
    }
}
