//! Prometheus metrics for the filter engine.
//!
//! All metrics follow the naming convention: `wh_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., filter_evaluations_total)
//! - **Gauge**: Value that can go up or down (e.g., filters_stored)
//! - **Histogram**: Distribution of values (e.g., filter_evaluation_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Filter evaluations by outcome (matched / rejected / vacuous)
    pub static ref FILTER_EVALUATIONS: CounterVec = CounterVec::new(
        Opts::new("wh_filter_evaluations_total", "Total filter evaluations"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Filter writes by operation (insert / update / delete)
    pub static ref FILTER_WRITES: CounterVec = CounterVec::new(
        Opts::new("wh_filter_writes_total", "Total filter rows written"),
        &["op"]
    ).expect("metric creation failed");

    /// Lookups answered by the catch-all filter
    pub static ref FILTER_WILDCARD_FALLBACKS: Counter = Counter::new(
        "wh_filter_wildcard_fallbacks_total",
        "Evaluations that fell back to the catch-all filter"
    ).expect("metric creation failed");

    /// Number of filter rows currently stored
    pub static ref FILTERS_STORED: Gauge = Gauge::new(
        "wh_filters_stored",
        "Filter rows currently stored"
    ).expect("metric creation failed");

    /// Time spent evaluating a payload against a filter
    pub static ref FILTER_EVALUATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "wh_filter_evaluation_duration_seconds",
            "Time spent flattening and comparing a payload against a filter"
        ).buckets(exponential_buckets(0.000_001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Handle returned once metrics are registered.
#[derive(Clone, Debug)]
pub struct MetricsHandle {
    registered: bool,
}

impl MetricsHandle {
    /// Whether the collectors were registered by this call
    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

/// Register all collectors with [`REGISTRY`].
///
/// Registering twice is not an error; the second call reports
/// `is_registered() == false`.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(FILTER_EVALUATIONS.clone()),
        Box::new(FILTER_WRITES.clone()),
        Box::new(FILTER_WILDCARD_FALLBACKS.clone()),
        Box::new(FILTERS_STORED.clone()),
        Box::new(FILTER_EVALUATION_DURATION.clone()),
    ];

    let mut registered = true;
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => {}
            Err(prometheus::Error::AlreadyReg) => registered = false,
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Render the registry in the Prometheus text exposition format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
