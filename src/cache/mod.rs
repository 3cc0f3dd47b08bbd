//! Fairway payload cache.
//!
//! The first tier of the resolution chain: raw upstream payloads held in process memory with a
//! per-entry TTL. Expired entries are removed lazily, on read.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! ttl_seconds = 3600
//! ```

mod clock;
mod config;
pub(crate) mod lock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub(crate) use store::{METRIC_CACHE_ENTRIES, METRIC_CACHE_EVICT_TOTAL};
pub use store::TtlCache;
