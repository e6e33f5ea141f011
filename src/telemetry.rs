use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct TelemetryError(String);

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError(err.to_string()))
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "folio_cache_fresh_hit_total",
            Unit::Count,
            "Reads answered from a fresh cache entry without a request."
        );
        describe_counter!(
            "folio_fetch_started_total",
            Unit::Count,
            "Content-store requests issued."
        );
        describe_counter!(
            "folio_fetch_suppressed_total",
            Unit::Count,
            "Fetches skipped because a request for the key was in flight."
        );
        describe_counter!(
            "folio_fetch_failed_total",
            Unit::Count,
            "Failed content-store requests, labelled by error kind."
        );
        describe_counter!(
            "folio_fetch_discarded_total",
            Unit::Count,
            "Responses dropped because their fetch was superseded."
        );
        describe_histogram!(
            "folio_fetch_ms",
            Unit::Milliseconds,
            "Content-store request latency in milliseconds."
        );
    });
}
