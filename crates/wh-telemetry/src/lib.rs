//! # WH Telemetry
//!
//! Observability for the webhook filter engine.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, pretty output in
//!   development and JSON lines in containers
//! - **Metrics**: Prometheus counters and histograms for filter evaluations
//!   and writes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wh_telemetry::{TelemetryConfig, init_telemetry};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WH_SERVICE_NAME` | `webhook-filters` | Service name in logs |
//! | `WH_LOG_LEVEL` | `info` | Log level filter |
//! | `WH_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `WH_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `WH_METRICS_ENABLED` | `true` | Register Prometheus collectors |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_env_filter, init_logging, StructuredLogger};
pub use metrics::{
    gather_text, register_metrics, MetricsHandle, FILTERS_STORED, FILTER_EVALUATIONS,
    FILTER_EVALUATION_DURATION, FILTER_WILDCARD_FALLBACKS, FILTER_WRITES, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    let logger = init_logging(&config)?;

    Ok(TelemetryGuard {
        _logger: logger,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logger: StructuredLogger,
    _metrics: Option<MetricsHandle>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
