//! Cache → archive → live-fetch resolution with write-through population.

use std::error::Error as StdError;
use std::future::{Future, Ready};
use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::application::archive::ArchiveError;
use crate::application::storage::{PayloadArchive, PayloadCache, RawPayload};
use crate::domain::ids::ArchiveKey;

pub(crate) const METRIC_RESOLVE_HIT_TOTAL: &str = "fairway_resolve_hit_total";
pub(crate) const METRIC_RESOLVE_MISS_TOTAL: &str = "fairway_resolve_miss_total";

/// Failure reported by a live-fetch collaborator (scraper, GraphQL client, ...).
#[derive(Debug, Error)]
#[error("live fetch failed: {message}")]
pub struct FetchError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result of one live fetch: `Ok(None)` means the upstream confirmed the record does not exist.
pub type FetchResult = Result<Option<RawPayload>, FetchError>;

/// Live-fetch placeholder for call sites that only read stored tiers.
pub type NoFetch = fn() -> Ready<FetchResult>;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("live fetch for `{key}` failed")]
    Fetch {
        key: String,
        #[source]
        source: FetchError,
    },
    #[error("live payload for `{key}` failed validation and was not archived")]
    InvalidPayload { key: String },
}

/// Resolves raw payloads through the cache, the archive and finally a live fetch.
///
/// A payload obtained from a lower tier is written back to every tier above it. Live
/// results go to the archive before the cache, so an interrupted write-back leaves the archive
/// authoritative and the next resolution repopulates the cache from it.
#[derive(Clone)]
pub struct TieredResolver {
    cache: Arc<dyn PayloadCache>,
    archive: Arc<dyn PayloadArchive>,
}

impl TieredResolver {
    pub fn new(cache: Arc<dyn PayloadCache>, archive: Arc<dyn PayloadArchive>) -> Self {
        Self { cache, archive }
    }

    pub fn archive(&self) -> &Arc<dyn PayloadArchive> {
        &self.archive
    }

    /// Resolve without a payload validity gate.
    pub async fn resolve<F, Fut>(
        &self,
        key: &ArchiveKey,
        live: Option<F>,
    ) -> Result<Option<RawPayload>, ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        self.resolve_validated(key, live, |_| true).await
    }

    /// Resolve from the cache and archive only; `Ok(None)` when neither holds the key.
    pub async fn resolve_stored(&self, key: &ArchiveKey) -> Result<Option<RawPayload>, ResolveError> {
        self.resolve(key, None::<NoFetch>).await
    }

    /// Resolve, refusing to archive a live payload that fails `is_valid`.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn resolve_validated<F, Fut, V>(
        &self,
        key: &ArchiveKey,
        live: Option<F>,
        is_valid: V,
    ) -> Result<Option<RawPayload>, ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
        V: Fn(&RawPayload) -> bool,
    {
        if let Some(payload) = self.cache.get(key).await {
            counter!(METRIC_RESOLVE_HIT_TOTAL, "tier" => "cache").increment(1);
            debug!(tier = "cache", "Resolved payload");
            return Ok(Some(payload));
        }

        if self.archive.exists(key).await? {
            match self.archive.get(key).await? {
                Some(payload) => {
                    self.cache.put(key, Some(payload.clone())).await;
                    counter!(METRIC_RESOLVE_HIT_TOTAL, "tier" => "archive").increment(1);
                    debug!(tier = "archive", "Resolved payload");
                    return Ok(Some(payload));
                }
                None => warn!(
                    tier = "archive",
                    "Archive reported the key but returned no object; treating as a miss"
                ),
            }
        }

        let Some(fetch) = live else {
            counter!(METRIC_RESOLVE_MISS_TOTAL).increment(1);
            debug!("Payload not stored and no live source supplied");
            return Ok(None);
        };

        self.fetch_and_store(key, fetch, is_valid).await
    }

    /// Skip the stored tiers: fetch, then overwrite the archive record and the cache entry.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn refresh<F, Fut, V>(
        &self,
        key: &ArchiveKey,
        fetch: F,
        is_valid: V,
    ) -> Result<Option<RawPayload>, ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
        V: Fn(&RawPayload) -> bool,
    {
        self.fetch_and_store(key, fetch, is_valid).await
    }

    /// Store a payload obtained out of band (manual backfill), archive first.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn store(
        &self,
        key: &ArchiveKey,
        payload: RawPayload,
    ) -> Result<RawPayload, ResolveError> {
        let stored = self.write_through(key, payload).await?;
        info!(tier = "import", "Archived imported payload");
        Ok(stored)
    }

    async fn write_through(
        &self,
        key: &ArchiveKey,
        payload: RawPayload,
    ) -> Result<RawPayload, ResolveError> {
        let stored = self.archive.put(key, payload).await?;
        self.cache.put(key, Some(stored.clone())).await;
        Ok(stored)
    }

    async fn fetch_and_store<F, Fut, V>(
        &self,
        key: &ArchiveKey,
        fetch: F,
        is_valid: V,
    ) -> Result<Option<RawPayload>, ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
        V: Fn(&RawPayload) -> bool,
    {
        let payload = match fetch().await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                counter!(METRIC_RESOLVE_MISS_TOTAL).increment(1);
                debug!(tier = "live", "Live source confirmed the record does not exist");
                return Ok(None);
            }
            Err(source) => {
                return Err(ResolveError::Fetch {
                    key: key.to_string(),
                    source,
                });
            }
        };

        if !is_valid(&payload) {
            warn!(tier = "live", "Live payload failed validation; not archiving");
            return Err(ResolveError::InvalidPayload {
                key: key.to_string(),
            });
        }

        let stored = self.write_through(key, payload).await?;
        counter!(METRIC_RESOLVE_HIT_TOTAL, "tier" => "live").increment(1);
        info!(tier = "live", "Archived live payload");
        Ok(Some(stored))
    }
}
