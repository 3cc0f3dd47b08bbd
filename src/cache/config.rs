//! Payload cache configuration.

use serde::Deserialize;
use time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 60 * 60;

/// Payload cache configuration from `fairway.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds an entry stays readable after it was stored.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl_seconds: settings.ttl_seconds.get(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime, saturating at `i64::MAX` seconds.
    pub fn ttl(&self) -> Duration {
        Duration::seconds(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX))
    }
}
