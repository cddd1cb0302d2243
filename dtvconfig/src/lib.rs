//! # dtvlineup configuration module
//!
//! This module provides configuration management for dtvlineup, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Typed access to configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use dtvconfig::get_config;
//! use serde_yaml::Value;
//!
//! let config = get_config()?;
//!
//! // Read a value
//! let minutes = config.get_value(&["lineup", "padding", "minutes"])?;
//!
//! // Update a value (persisted to config.yaml)
//! config.set_value(&["lineup", "padding", "minutes"], Value::from(15))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, info};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("dtvlineup.yaml");

lazy_static! {
    static ref CONFIG: std::result::Result<Arc<Config>, String> = Config::load_config("")
        .map(Arc::new)
        .map_err(|e| e.to_string());
}

const ENV_CONFIG_DIR: &str = "DTVLINEUP_CONFIG";
const ENV_PREFIX: &str = "DTVLINEUP_CONFIG__";
const CONFIG_DIR_NAME: &str = ".dtvlineup";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Configuration manager for dtvlineup
///
/// The configuration is a YAML tree. Keys are case-insensitive and stored
/// lowercased. A configuration loaded from a directory writes every change
/// back to `config.yaml`; one built with [`Config::from_yaml_str`] lives in
/// memory only.
#[derive(Debug)]
pub struct Config {
    config_dir: Option<PathBuf>,
    path: Option<PathBuf>,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            data: Mutex::new(self.lock().clone()),
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
        }
    }
}

impl Config {
    /// Directory named by the caller, then `$DTVLINEUP_CONFIG`, then
    /// `./.dtvlineup`, then `~/.dtvlineup`; `./.dtvlineup` when none exists
    fn find_config_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }
        if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %dir, "Config directory taken from environment");
            return PathBuf::from(dir);
        }
        let local = PathBuf::from(CONFIG_DIR_NAME);
        if local.exists() {
            return local;
        }
        home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME))
            .filter(|dir| dir.exists())
            .unwrap_or(local)
    }

    /// Creates the directory if needed and checks that it is writable
    fn prepare_config_dir(dir: &Path) -> Result<()> {
        if dir.exists() && !dir.is_dir() {
            return Err(anyhow!("{} exists and is not a directory", dir.display()));
        }
        fs::create_dir_all(dir)?;

        let marker = dir.join(".write_test");
        fs::write(&marker, b"")?;
        fs::remove_file(&marker)?;
        Ok(())
    }

    /// Resolves the configuration directory, creating it when missing
    ///
    /// A non-empty `directory` wins; otherwise `DTVLINEUP_CONFIG`, then
    /// `.dtvlineup` in the working directory, then `.dtvlineup` in the home
    /// directory are tried.
    pub fn config_dir(directory: &str) -> Result<PathBuf> {
        let dir = Self::find_config_dir(directory);
        Self::prepare_config_dir(&dir)?;
        Ok(dir)
    }

    /// Loads `config.yaml` from the configuration directory
    ///
    /// The file is laid over the embedded defaults, `DTVLINEUP_CONFIG__*`
    /// variables are applied on top, and the result is written back so the
    /// file always lists every known key.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        let path = config_dir.join(CONFIG_FILE_NAME);
        info!(config_file = %path.display(), "Loading lineup configuration");

        let external = if path.is_file() {
            serde_yaml::from_slice(&fs::read(&path)?)?
        } else {
            debug!(config_file = %path.display(), "No config file yet, starting from defaults");
            Value::Mapping(Mapping::new())
        };

        let config = Self::build(Some(config_dir), Some(path), &external)?;
        config.save()?;
        Ok(config)
    }

    /// Builds an in-memory configuration from a YAML document
    ///
    /// Defaults and environment overrides are applied as in
    /// [`Config::load_config`], but nothing is ever written to disk.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let external = match yaml.trim() {
            "" => Value::Mapping(Mapping::new()),
            text => serde_yaml::from_str(text)?,
        };
        Self::build(None, None, &external)
    }

    fn build(config_dir: Option<PathBuf>, path: Option<PathBuf>, external: &Value) -> Result<Self> {
        let mut tree: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        overlay(&mut tree, external);
        let mut tree = normalize_keys(tree);

        for (var, path, value) in env_overrides() {
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            match insert_at(&mut tree, &path, value) {
                Ok(()) => debug!(env_var = %var, "Applied configuration override"),
                Err(e) => debug!(env_var = %var, error = %e, "Ignored configuration override"),
            }
        }

        Ok(Config {
            config_dir,
            path,
            data: Mutex::new(tree),
        })
    }

    /// Directory holding `config.yaml`, if this configuration is file-backed
    pub fn directory(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    // Un verrou empoisonné garde des données valides : on les reprend
    fn lock(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes the tree to `config.yaml`; a no-op for in-memory configurations
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(&*self.lock())?;
        fs::write(path, yaml)?;
        debug!(config_file = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Stores `value` under `path` (e.g. `&["lineup", "padding", "minutes"]`)
    ///
    /// Missing sections are created on the way. File-backed configurations
    /// are saved immediately.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        insert_at(&mut self.lock(), path, value)?;
        self.save()
    }

    /// Value stored under `path`, or an error naming the first missing key
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        lookup(&self.lock(), path).cloned()
    }

    /// Value stored under `path`, deserialized into `T`
    pub fn get_as<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        serde_yaml::from_value(self.get_value(path)?)
            .map_err(|e| anyhow!("Invalid value at {}: {}", path.join("."), e))
    }
}

/// Returns the global configuration instance
///
/// The configuration is lazily loaded on first access. A load failure is
/// remembered and reported on every call.
pub fn get_config() -> Result<Arc<Config>> {
    match &*CONFIG {
        Ok(config) => Ok(config.clone()),
        Err(e) => Err(anyhow!("Failed to load dtvlineup configuration: {}", e)),
    }
}

fn section_key(key: &str) -> Value {
    Value::String(key.to_lowercase())
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().enumerate().try_fold(root, |node, (depth, key)| {
        let map = node
            .as_mapping()
            .ok_or_else(|| anyhow!("Path {} is not a section", path[..depth].join(".")))?;
        map.get(&section_key(key))
            .ok_or_else(|| anyhow!("Path {} does not exist", path[..=depth].join(".")))
    })
}

fn insert_at(root: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((leaf, sections)) = path.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for (depth, key) in sections.iter().enumerate() {
        let map = node
            .as_mapping_mut()
            .ok_or_else(|| anyhow!("Path {} is not a section", path[..depth].join(".")))?;
        let child = map
            .entry(section_key(key))
            .or_insert(Value::Mapping(Mapping::new()));
        // Une feuille nulle devient une section
        if child.is_null() {
            *child = Value::Mapping(Mapping::new());
        }
        node = child;
    }

    node.as_mapping_mut()
        .ok_or_else(|| anyhow!("Path {} is not a section", sections.join(".")))?
        .insert(section_key(leaf), value);
    Ok(())
}

/// `DTVLINEUP_CONFIG__LINEUP__PADDING__MINUTES=15` style overrides
///
/// Values are parsed as YAML scalars, falling back to plain strings.
fn env_overrides() -> Vec<(String, Vec<String>, Value)> {
    env::vars()
        .filter_map(|(var, raw)| {
            let path = var
                .strip_prefix(ENV_PREFIX)?
                .split("__")
                .map(str::to_string)
                .collect();
            let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            Some((var, path, value))
        })
        .collect()
}

/// Lowercases every string key, recursively
fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, child)| {
                    let key = match key {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, normalize_keys(child))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Lays `external` over `base`: sections merge key by key, anything else
/// is replaced
fn overlay(base: &mut Value, external: &Value) {
    match (base, external) {
        (Value::Mapping(base_map), Value::Mapping(external_map)) => {
            for (key, value) in external_map {
                if let Some(slot) = base_map.get_mut(key) {
                    overlay(slot, value);
                } else {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
