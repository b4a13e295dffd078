//! Configuration Module
//!
//! Cache construction parameters, loadable from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::EvictionPolicyKind;
use crate::error::{CacheError, Result};
use crate::notify::ListenerMode;

/// Default maximum number of live entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of live entries, 0 = unbounded
    pub capacity: usize,
    /// TTL for entries without their own override, None = never expire
    pub default_ttl: Option<Duration>,
    /// true = sliding TTL (reset on every access), false = fixed from last write
    pub ttl_refresh_on_access: bool,
    /// Which entry to drop when capacity is exceeded
    pub eviction_policy: EvictionPolicyKind,
    /// Where removal listener callbacks run
    pub listener_mode: ListenerMode,
    /// Background prune interval, None = lazy expiry only
    pub prune_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_ttl: None,
            ttl_refresh_on_access: true,
            eviction_policy: EvictionPolicyKind::Lru,
            listener_mode: ListenerMode::Sync,
            prune_interval: None,
        }
    }
}

impl CacheConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_ttl_refresh_on_access(mut self, refresh: bool) -> Self {
        self.ttl_refresh_on_access = refresh;
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicyKind) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn with_listener_mode(mut self, mode: ListenerMode) -> Self {
        self.listener_mode = mode;
        self
    }

    pub fn with_prune_interval(mut self, interval: Duration) -> Self {
        self.prune_interval = Some(interval);
        self
    }

    // == Validate ==
    /// Rejects values the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl == Some(Duration::ZERO) {
            return Err(CacheError::config("default_ttl must be greater than zero"));
        }
        if self.prune_interval == Some(Duration::ZERO) {
            return Err(CacheError::config("prune_interval must be greater than zero"));
        }
        Ok(())
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum live entries, 0 = unbounded (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: none)
    /// - `CACHE_TTL_REFRESH_ON_ACCESS` - Sliding TTL (default: true)
    /// - `CACHE_EVICTION_POLICY` - `lru`, `fifo` or `lfu` (default: lru)
    /// - `CACHE_LISTENER_MODE` - `sync` or `async` (default: sync)
    /// - `CACHE_PRUNE_INTERVAL_MS` - Background prune interval (default: none)
    ///
    /// Unset variables fall back to defaults; set but malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            capacity: parse_var("CACHE_CAPACITY")?.unwrap_or(defaults.capacity),
            default_ttl: parse_millis("CACHE_DEFAULT_TTL_MS")?,
            ttl_refresh_on_access: parse_var("CACHE_TTL_REFRESH_ON_ACCESS")?
                .unwrap_or(defaults.ttl_refresh_on_access),
            eviction_policy: parse_var("CACHE_EVICTION_POLICY")?
                .unwrap_or(defaults.eviction_policy),
            listener_mode: parse_var("CACHE_LISTENER_MODE")?.unwrap_or(defaults.listener_mode),
            prune_interval: parse_millis("CACHE_PRUNE_INTERVAL_MS")?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CacheError::config(format!("{name}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Millisecond durations are parsed signed so a negative value is reported
/// as such instead of as a generic parse failure.
fn parse_millis(name: &str) -> Result<Option<Duration>> {
    match parse_var::<i64>(name)? {
        Some(ms) if ms < 0 => Err(CacheError::config(format!(
            "{name} must not be negative, got {ms}"
        ))),
        Some(ms) => Ok(Some(Duration::from_millis(ms as u64))),
        None => Ok(None),
    }
}
