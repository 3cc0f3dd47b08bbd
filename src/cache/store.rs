//! Process-local payload cache with per-entry TTL and read-time eviction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use metrics::{counter, gauge};
use time::{Duration, OffsetDateTime};
use tracing::trace;

use crate::application::storage::{PayloadCache, RawPayload};
use crate::domain::ids::ArchiveKey;

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";
pub(crate) const METRIC_CACHE_ENTRIES: &str = "fairway_cache_entries";
pub(crate) const METRIC_CACHE_EVICT_TOTAL: &str = "fairway_cache_evict_total";

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: RawPayload,
    stored_at: OffsetDateTime,
}

/// Raw upstream payloads keyed by archive key.
///
/// Every read first sweeps all expired entries, so a lookup never returns a payload older
/// than the TTL. An entry whose age equals the TTL exactly is still served.
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    /// Create a cache backed by the wall clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: config.ttl(),
            clock,
        }
    }

    /// Sweep expired entries, then return the payload stored under `key`.
    pub fn lookup(&self, key: &str) -> Option<RawPayload> {
        self.sweep();
        let entries = rw_read(&self.entries, SOURCE, "lookup");
        let payload = entries.get(key).map(|entry| entry.payload.clone());
        record_size("get", entries.len());
        payload
    }

    /// Store a payload; `None` removes the key instead of caching an absence.
    pub fn store(&self, key: &str, payload: Option<RawPayload>) {
        let mut entries = rw_write(&self.entries, SOURCE, "store");
        match payload {
            Some(payload) => {
                entries.insert(
                    key.to_string(),
                    CacheEntry {
                        payload,
                        stored_at: self.clock.now(),
                    },
                );
            }
            None => {
                entries.remove(key);
            }
        }
        record_size("put", entries.len());
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut entries = rw_write(&self.entries, SOURCE, "sweep");
        let before = entries.len();
        entries.retain(|_, entry| now - entry.stored_at <= ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            counter!(METRIC_CACHE_EVICT_TOTAL).increment(evicted as u64);
            trace!(evicted, remaining = entries.len(), "Evicted expired payloads");
        }
        evicted
    }
}

#[async_trait]
impl PayloadCache for TtlCache {
    async fn get(&self, key: &ArchiveKey) -> Option<RawPayload> {
        self.lookup(key.as_str())
    }

    async fn put(&self, key: &ArchiveKey, payload: Option<RawPayload>) {
        self.store(key.as_str(), payload);
    }
}

fn record_size(op: &'static str, entries: usize) {
    gauge!(METRIC_CACHE_ENTRIES).set(entries as f64);
    trace!(op, entries, "payload cache size");
}
