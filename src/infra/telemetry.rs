use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "readalong_segments_matched_total",
            Unit::Count,
            "Segments matched to content, labelled by matching strategy."
        );
        describe_counter!(
            "readalong_segments_unmatched_total",
            Unit::Count,
            "Segments that matched nothing or lost an overlap."
        );
        describe_histogram!(
            "readalong_align_ms",
            Unit::Milliseconds,
            "Alignment pass latency in milliseconds."
        );
        describe_counter!(
            "readalong_align_cache_hit_total",
            Unit::Count,
            "Total number of alignment cache hits."
        );
        describe_counter!(
            "readalong_align_cache_miss_total",
            Unit::Count,
            "Total number of alignment cache misses."
        );
        describe_counter!(
            "readalong_align_cache_evict_total",
            Unit::Count,
            "Total number of alignment cache evictions due to capacity."
        );
        describe_counter!(
            "readalong_segment_fetch_failed_total",
            Unit::Count,
            "Segment fetches that degraded to an empty set, labelled by failure kind."
        );
    });
}
