//! Configuration system for the memory controller model.
//!
//! This module defines all configuration structures and enums used to parameterize the
//! controller and its reference backing memory. It provides:
//! 1. **Defaults:** Baseline constants (queue depth, starvation threshold, cache geometry, DRAM timing).
//! 2. **Structures:** Controller and backing-memory configuration, deserialisable from JSON.
//! 3. **Key/Value Sources:** The `Key Value` text format and the [`ConfigSource`] trait used to
//!    override individual settings by their verbatim key names.
//!
//! Use `Config::default()`, [`Config::from_json`], or layer a [`KeyValueConfig`] on top with
//! [`ControllerConfig::set_config`].

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

/// Default configuration constants.
///
/// These values define the baseline controller when a setting is not explicitly overridden.
mod defaults {
    /// Maximum number of requests waiting in the transaction queue.
    pub const QUEUE_SIZE: usize = 32;

    /// Number of times a request may be bypassed before it is force-scheduled.
    pub const STARVATION_THRESHOLD: u64 = 4;

    /// Cache capacity exponent: the cache holds `2^n` lines (1024 lines).
    pub const CACHE_SIZE_EXPONENT: u32 = 10;

    /// Cycles to service a read from the front-end cache.
    pub const CACHE_LATENCY: u64 = 2;

    /// Cache line size in bytes.
    pub const CACHE_LINE: usize = crate::common::DEFAULT_LINE_BYTES;

    /// Seed for the random eviction policy's generator.
    pub const EVICTION_SEED: u64 = 2021;

    /// Largest supported cache size exponent.
    pub const MAX_CACHE_SIZE_EXPONENT: u32 = 32;

    /// Number of banks in the reference backing memory.
    pub const BANKS: usize = 8;

    /// Row size in bytes of the reference backing memory (2 KiB).
    pub const ROW_BYTES: u64 = 2048;

    /// CAS (Column Access Strobe) latency in cycles.
    pub const T_CAS: u64 = 14;

    /// RAS (Row Access Strobe) latency in cycles.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in cycles.
    pub const T_PRE: u64 = 14;
}

/// Configuration key for the starvation threshold.
pub const KEY_STARVATION_THRESHOLD: &str = "StarvationThreshold";
/// Configuration key for the transaction queue depth.
pub const KEY_QUEUE_SIZE: &str = "QueueSize";
/// Configuration key for the cache capacity exponent.
pub const KEY_CACHE_SIZE_EXPONENT: &str = "CacheSizeExponent";
/// Configuration key for the cache hit latency.
pub const KEY_CACHE_LATENCY: &str = "CacheLatency";
/// Configuration key for the cache line size.
pub const KEY_CACHE_LINE_SIZE: &str = "CacheLineSize";
/// Configuration key for the eviction policy.
pub const KEY_CACHE_EVICTION: &str = "CacheEviction";
/// Configuration key for the random eviction seed.
pub const KEY_CACHE_SEED: &str = "CacheSeed";

/// Cache eviction disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvictionKind {
    /// Least Recently Used eviction.
    ///
    /// Evicts the line that was read or written least recently.
    #[default]
    #[serde(alias = "Lru", alias = "lru")]
    Lru,
    /// Random eviction.
    ///
    /// Evicts a uniformly chosen resident line.
    #[serde(alias = "Random", alias = "random")]
    Random,
}

impl FromStr for EvictionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LRU" => Ok(Self::Lru),
            "RANDOM" => Ok(Self::Random),
            _ => Err(()),
        }
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use memsched_core::config::{Config, EvictionKind};
///
/// let json = r#"{
///     "controller": {
///         "QueueSize": 16,
///         "StarvationThreshold": 8,
///         "CacheEviction": "Random"
///     },
///     "memory": { "banks": 4 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.controller.queue_size, 16);
/// assert_eq!(config.controller.eviction, EvictionKind::Random);
/// assert_eq!(config.memory.banks, 4);
/// assert_eq!(config.memory.t_cas, 14);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduler and cache settings.
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Reference backing memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed JSON, or any validation error.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        self.memory.validate()
    }
}

/// Scheduler and front-end cache configuration.
///
/// Field names serialise under the controller's verbatim configuration keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Bypass count after which a request is force-scheduled.
    #[serde(rename = "StarvationThreshold", default = "ControllerConfig::default_starvation")]
    pub starvation_threshold: u64,

    /// Maximum number of queued requests before `issue` pushes back.
    #[serde(rename = "QueueSize", default = "ControllerConfig::default_queue_size")]
    pub queue_size: usize,

    /// The cache holds `2^cache_size_exponent` lines.
    #[serde(rename = "CacheSizeExponent", default = "ControllerConfig::default_size_exponent")]
    pub cache_size_exponent: u32,

    /// Cache hit latency in cycles.
    #[serde(rename = "CacheLatency", default = "ControllerConfig::default_cache_latency")]
    pub cache_latency: u64,

    /// Cache line size in bytes.
    #[serde(rename = "CacheLineSize", default = "ControllerConfig::default_line")]
    pub cache_line_bytes: usize,

    /// Eviction policy.
    #[serde(rename = "CacheEviction", default)]
    pub eviction: EvictionKind,

    /// Seed for the random eviction policy.
    #[serde(rename = "CacheSeed", default = "ControllerConfig::default_seed")]
    pub eviction_seed: u64,
}

impl ControllerConfig {
    /// Returns the default starvation threshold.
    const fn default_starvation() -> u64 {
        defaults::STARVATION_THRESHOLD
    }

    /// Returns the default queue depth.
    const fn default_queue_size() -> usize {
        defaults::QUEUE_SIZE
    }

    /// Returns the default cache size exponent.
    const fn default_size_exponent() -> u32 {
        defaults::CACHE_SIZE_EXPONENT
    }

    /// Returns the default cache hit latency.
    const fn default_cache_latency() -> u64 {
        defaults::CACHE_LATENCY
    }

    /// Returns the default line size.
    const fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    /// Returns the default eviction seed.
    const fn default_seed() -> u64 {
        defaults::EVICTION_SEED
    }

    /// Cache capacity in lines (`2^cache_size_exponent`, saturating).
    pub fn max_lines(&self) -> usize {
        1usize
            .checked_shl(self.cache_size_exponent)
            .unwrap_or(usize::MAX)
    }

    /// Overrides every setting present in `source`, keyed by its verbatim name.
    ///
    /// Keys absent from the source keep their current value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if a present key does not parse, or a validation error
    /// for the resulting configuration.
    pub fn set_config(&mut self, source: &dyn ConfigSource) -> Result<(), ConfigError> {
        if let Some(v) = lookup(source, KEY_STARVATION_THRESHOLD)? {
            self.starvation_threshold = v;
        }
        if let Some(v) = lookup(source, KEY_QUEUE_SIZE)? {
            self.queue_size = v;
        }
        if let Some(v) = lookup(source, KEY_CACHE_SIZE_EXPONENT)? {
            self.cache_size_exponent = v;
        }
        if let Some(v) = lookup(source, KEY_CACHE_LATENCY)? {
            self.cache_latency = v;
        }
        if let Some(v) = lookup(source, KEY_CACHE_LINE_SIZE)? {
            self.cache_line_bytes = v;
        }
        if let Some(v) = lookup(source, KEY_CACHE_EVICTION)? {
            self.eviction = v;
        }
        if let Some(v) = lookup(source, KEY_CACHE_SEED)? {
            self.eviction_seed = v;
        }
        self.validate()
    }

    /// Checks the controller settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] for a zero queue, zero line size, or oversized cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_size == 0 {
            return Err(ConfigError::OutOfRange {
                key: KEY_QUEUE_SIZE,
                reason: "queue must hold at least one request".into(),
            });
        }
        if self.cache_line_bytes == 0 {
            return Err(ConfigError::OutOfRange {
                key: KEY_CACHE_LINE_SIZE,
                reason: "line size must be non-zero".into(),
            });
        }
        if self.cache_size_exponent > defaults::MAX_CACHE_SIZE_EXPONENT {
            return Err(ConfigError::OutOfRange {
                key: KEY_CACHE_SIZE_EXPONENT,
                reason: format!(
                    "{} exceeds the maximum of {}",
                    self.cache_size_exponent,
                    defaults::MAX_CACHE_SIZE_EXPONENT
                ),
            });
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            starvation_threshold: defaults::STARVATION_THRESHOLD,
            queue_size: defaults::QUEUE_SIZE,
            cache_size_exponent: defaults::CACHE_SIZE_EXPONENT,
            cache_latency: defaults::CACHE_LATENCY,
            cache_line_bytes: defaults::CACHE_LINE,
            eviction: EvictionKind::default(),
            eviction_seed: defaults::EVICTION_SEED,
        }
    }
}

/// Reference backing memory configuration.
///
/// Specifies the bank/row geometry and the three timing parameters of
/// [`BankedMemory`](crate::backend::BankedMemory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of independent banks.
    #[serde(default = "MemoryConfig::default_banks")]
    pub banks: usize,

    /// Row size in bytes; must be a power of two.
    #[serde(default = "MemoryConfig::default_row_bytes")]
    pub row_bytes: u64,

    /// CAS latency (column access strobe)
    #[serde(default = "MemoryConfig::default_t_cas")]
    pub t_cas: u64,

    /// RAS latency (row access strobe)
    #[serde(default = "MemoryConfig::default_t_ras")]
    pub t_ras: u64,

    /// Precharge latency
    #[serde(default = "MemoryConfig::default_t_pre")]
    pub t_pre: u64,
}

impl MemoryConfig {
    /// Returns the default bank count.
    const fn default_banks() -> usize {
        defaults::BANKS
    }

    /// Returns the default row size in bytes.
    const fn default_row_bytes() -> u64 {
        defaults::ROW_BYTES
    }

    /// Returns the default CAS latency.
    const fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    /// Returns the default RAS latency.
    const fn default_t_ras() -> u64 {
        defaults::T_RAS
    }

    /// Returns the default precharge latency.
    const fn default_t_pre() -> u64 {
        defaults::T_PRE
    }

    /// Checks the backing memory geometry.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] for zero banks or a row size that is not a power of two.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.banks == 0 {
            return Err(ConfigError::OutOfRange {
                key: "banks",
                reason: "at least one bank is required".into(),
            });
        }
        if !self.row_bytes.is_power_of_two() {
            return Err(ConfigError::OutOfRange {
                key: "row_bytes",
                reason: format!("{} is not a power of two", self.row_bytes),
            });
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            banks: defaults::BANKS,
            row_bytes: defaults::ROW_BYTES,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
        }
    }
}

/// A key/value configuration source.
pub trait ConfigSource {
    /// Returns true if `key` has a value.
    fn key_exists(&self, key: &str) -> bool;

    /// Returns the raw value of `key`.
    fn get_value(&self, key: &str) -> Option<&str>;
}

/// Parses `key` from `source` if present.
fn lookup<T: FromStr>(source: &dyn ConfigSource, key: &str) -> Result<Option<T>, ConfigError> {
    if !source.key_exists(key) {
        return Ok(None);
    }
    let raw = source.get_value(key).unwrap_or_default();
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_owned(),
            value: raw.to_owned(),
        })
}

/// In-memory key/value configuration.
///
/// The text format has one `Key Value` pair per line. Everything after `;` is a comment and
/// blank lines are skipped. Later lines override earlier ones.
///
/// ```
/// use memsched_core::config::{ConfigSource, ControllerConfig, KeyValueConfig};
///
/// let kv = KeyValueConfig::parse("QueueSize 8 ; shallow queue\nStarvationThreshold 2\n").unwrap();
/// let mut config = ControllerConfig::default();
/// config.set_config(&kv).unwrap();
/// assert_eq!(config.queue_size, 8);
/// assert_eq!(config.starvation_threshold, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueConfig {
    values: HashMap<String, String>,
}

impl KeyValueConfig {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the `Key Value` text format.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] for a non-blank line without a value.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.split(';').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(key), Some(value)) => config.set(key, value),
                _ => {
                    return Err(ConfigError::Malformed {
                        line: i + 1,
                        text: raw.to_owned(),
                    });
                }
            }
        }
        Ok(config)
    }

    /// Parses a `Key=Value` override as given on a command line.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] if there is no `=` or either side is empty.
    pub fn parse_assignment(&mut self, text: &str) -> Result<(), ConfigError> {
        match text.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                self.set(key.trim(), value.trim());
                Ok(())
            }
            _ => Err(ConfigError::Malformed {
                line: 1,
                text: text.to_owned(),
            }),
        }
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: &str) {
        let _ = self.values.insert(key.to_owned(), value.to_owned());
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no key is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for KeyValueConfig {
    fn key_exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}
