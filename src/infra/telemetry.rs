use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::archive::METRIC_ARCHIVE_WRITE_TOTAL;
use crate::application::resolver::{METRIC_RESOLVE_HIT_TOTAL, METRIC_RESOLVE_MISS_TOTAL};
use crate::cache::{METRIC_CACHE_ENTRIES, METRIC_CACHE_EVICT_TOTAL};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the resolution chain emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_gauge!(
            METRIC_CACHE_ENTRIES,
            Unit::Count,
            "Current number of payloads held by the in-memory cache."
        );
        describe_counter!(
            METRIC_CACHE_EVICT_TOTAL,
            Unit::Count,
            "Total number of cached payloads evicted after their TTL elapsed."
        );
        describe_counter!(
            METRIC_RESOLVE_HIT_TOTAL,
            Unit::Count,
            "Total number of resolutions satisfied, labelled by tier."
        );
        describe_counter!(
            METRIC_RESOLVE_MISS_TOTAL,
            Unit::Count,
            "Total number of resolutions that found no payload in any tier."
        );
        describe_counter!(
            METRIC_ARCHIVE_WRITE_TOTAL,
            Unit::Count,
            "Total number of payloads written to the archive, labelled by bucket."
        );
    });
}
