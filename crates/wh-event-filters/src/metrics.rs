//! Metrics and tracing hooks for filter operations
//!
//! Provides instrumentation points for monitoring filter writes and
//! delivery-time evaluations.
//!
//! ## Usage
//!
//! ```ignore
//! use wh_event_filters::metrics::{Metrics, MetricsRecorder, EvaluationOutcome};
//!
//! let metrics = Metrics::new();
//!
//! let start = std::time::Instant::now();
//! let matched = compare(&payload, &filter.body);
//! metrics.record_evaluation(start.elapsed(), EvaluationOutcome::from_match(matched));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use wh_telemetry::{
    FILTERS_STORED, FILTER_EVALUATIONS, FILTER_EVALUATION_DURATION, FILTER_WILDCARD_FALLBACKS,
    FILTER_WRITES,
};

/// Kind of filter row write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

impl WriteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteKind::Insert => "insert",
            WriteKind::Update => "update",
            WriteKind::Delete => "delete",
        }
    }
}

/// Result of a delivery-time filter check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Payload satisfied the filter
    Matched,
    /// Payload failed the filter
    Rejected,
    /// No filter registered; matched vacuously
    NoFilter,
    /// Filter had no constraints; matched vacuously
    EmptyFilter,
}

impl EvaluationOutcome {
    pub fn from_match(matched: bool) -> Self {
        if matched {
            EvaluationOutcome::Matched
        } else {
            EvaluationOutcome::Rejected
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationOutcome::Matched => "matched",
            EvaluationOutcome::Rejected => "rejected",
            EvaluationOutcome::NoFilter => "no_filter",
            EvaluationOutcome::EmptyFilter => "empty_filter",
        }
    }

    /// Whether delivery should proceed
    pub fn is_match(&self) -> bool {
        !matches!(self, EvaluationOutcome::Rejected)
    }
}

/// Metrics collector for filter operations
///
/// Thread-safe counters for monitoring filter writes and evaluations.
#[derive(Default)]
pub struct Metrics {
    /// Filter rows inserted
    pub filters_inserted: AtomicU64,
    /// Filter rows updated
    pub filters_updated: AtomicU64,
    /// Filter rows deleted
    pub filters_deleted: AtomicU64,
    /// Total evaluations performed
    pub evaluations: AtomicU64,
    /// Evaluations that matched by comparison
    pub evaluations_matched: AtomicU64,
    /// Evaluations that rejected the payload
    pub evaluations_rejected: AtomicU64,
    /// Evaluations that matched without a comparison
    pub evaluations_vacuous: AtomicU64,
    /// Lookups answered by the catch-all filter
    pub wildcard_fallbacks: AtomicU64,
    /// Cumulative evaluation time in nanoseconds
    pub evaluation_time_ns: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record rows written
    pub fn record_write(&self, kind: WriteKind, count: usize) {
        let counter = match kind {
            WriteKind::Insert => &self.filters_inserted,
            WriteKind::Update => &self.filters_updated,
            WriteKind::Delete => &self.filters_deleted,
        };
        counter.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record an evaluation
    pub fn record_evaluation(&self, duration: Duration, outcome: EvaluationOutcome) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.evaluation_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        let counter = match outcome {
            EvaluationOutcome::Matched => &self.evaluations_matched,
            EvaluationOutcome::Rejected => &self.evaluations_rejected,
            EvaluationOutcome::NoFilter | EvaluationOutcome::EmptyFilter => {
                &self.evaluations_vacuous
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a catch-all fallback
    pub fn record_wildcard_fallback(&self) {
        self.wildcard_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            filters_inserted: self.filters_inserted.load(Ordering::Relaxed),
            filters_updated: self.filters_updated.load(Ordering::Relaxed),
            filters_deleted: self.filters_deleted.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            evaluations_matched: self.evaluations_matched.load(Ordering::Relaxed),
            evaluations_rejected: self.evaluations_rejected.load(Ordering::Relaxed),
            evaluations_vacuous: self.evaluations_vacuous.load(Ordering::Relaxed),
            wildcard_fallbacks: self.wildcard_fallbacks.load(Ordering::Relaxed),
            avg_evaluation_ns: self.avg_evaluation_time_ns(),
        }
    }

    /// Calculate average evaluation time in nanoseconds
    pub fn avg_evaluation_time_ns(&self) -> u64 {
        let total = self.evaluation_time_ns.load(Ordering::Relaxed);
        let count = self.evaluations.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Share of evaluations that allowed delivery
    pub fn delivery_rate(&self) -> f64 {
        let total = self.evaluations.load(Ordering::Relaxed);
        let rejected = self.evaluations_rejected.load(Ordering::Relaxed);
        if total > 0 {
            (total - rejected) as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.filters_inserted.store(0, Ordering::Relaxed);
        self.filters_updated.store(0, Ordering::Relaxed);
        self.filters_deleted.store(0, Ordering::Relaxed);
        self.evaluations.store(0, Ordering::Relaxed);
        self.evaluations_matched.store(0, Ordering::Relaxed);
        self.evaluations_rejected.store(0, Ordering::Relaxed);
        self.evaluations_vacuous.store(0, Ordering::Relaxed);
        self.wildcard_fallbacks.store(0, Ordering::Relaxed);
        self.evaluation_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default)]
pub struct MetricsSnapshot {
    pub filters_inserted: u64,
    pub filters_updated: u64,
    pub filters_deleted: u64,
    pub evaluations: u64,
    pub evaluations_matched: u64,
    pub evaluations_rejected: u64,
    pub evaluations_vacuous: u64,
    pub wildcard_fallbacks: u64,
    pub avg_evaluation_ns: u64,
}

/// Trait for custom metrics recording implementations
pub trait MetricsRecorder: Send + Sync {
    /// Record rows written
    fn record_write(&self, kind: WriteKind, count: usize);

    /// Record an evaluation
    fn record_evaluation(&self, duration: Duration, outcome: EvaluationOutcome);

    /// Record a catch-all fallback
    fn record_wildcard_fallback(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_write(&self, _: WriteKind, _: usize) {}
    fn record_evaluation(&self, _: Duration, _: EvaluationOutcome) {}
    fn record_wildcard_fallback(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_write(&self, kind: WriteKind, count: usize) {
        Metrics::record_write(self, kind, count);
    }

    fn record_evaluation(&self, duration: Duration, outcome: EvaluationOutcome) {
        Metrics::record_evaluation(self, duration, outcome);
    }

    fn record_wildcard_fallback(&self) {
        Metrics::record_wildcard_fallback(self);
    }
}

/// Recorder that feeds the process-wide Prometheus collectors.
///
/// Collectors must be registered through `wh_telemetry::register_metrics`
/// to appear in scrapes.
#[derive(Default)]
pub struct PrometheusMetrics;

impl MetricsRecorder for PrometheusMetrics {
    fn record_write(&self, kind: WriteKind, count: usize) {
        FILTER_WRITES
            .with_label_values(&[kind.as_str()])
            .inc_by(count as f64);
        match kind {
            WriteKind::Insert => FILTERS_STORED.add(count as f64),
            WriteKind::Delete => FILTERS_STORED.sub(count as f64),
            WriteKind::Update => {}
        }
    }

    fn record_evaluation(&self, duration: Duration, outcome: EvaluationOutcome) {
        FILTER_EVALUATIONS
            .with_label_values(&[outcome.as_str()])
            .inc();
        FILTER_EVALUATION_DURATION.observe(duration.as_secs_f64());
    }

    fn record_wildcard_fallback(&self) {
        FILTER_WILDCARD_FALLBACKS.inc();
    }
}
