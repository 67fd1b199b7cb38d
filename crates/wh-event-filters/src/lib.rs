//! # WH Event Filters
//!
//! Event filter matching engine for webhook delivery. Decides whether an
//! event payload should be delivered to a subscription by matching it against
//! the subscription's per-event-type filter.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure business logic, no I/O
//!   - `Flattener`: Nested document to dotted-path mapping
//!   - `Operator`: Closed set of query operators
//!   - `compare`: Operator evaluator over flattened documents
//!   - `EventTypeFilter`: One filter row per (subscription, event type)
//!   - `FilterEngineConfig`: Configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `FilterRegistryApi`: Driving port (inbound API)
//!   - `FilterStore`, `TimeSource`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `FilterRegistryService`: Implements `FilterRegistryApi`
//!   - `dry_run`: Ad-hoc filter testing without the registry
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `InMemoryFilterStore`: Atomic in-memory `FilterStore`
//!   - `FilterApiHandler`: JSON method dispatcher
//!
//! ## Matching Rules
//!
//! - No filter for the event type falls back to the `"*"` filter
//! - No filter at all, or an empty one, matches every payload
//! - A filter key absent from the payload does not reject it, except under
//!   `$or` / `$and` and for `$exist`
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wh_event_filters::{FilterRegistryApi, FilterRegistryService, FilterSpec, InMemoryFilterStore};
//!
//! let service = FilterRegistryService::new(Arc::new(InMemoryFilterStore::new()));
//!
//! let body = serde_json::json!({"person": {"age": {"$gt": 5}}});
//! service
//!     .create_filter(FilterSpec::new("sub-1", "*").with_body(body.as_object().cloned().unwrap()))
//!     .await?;
//!
//! let payload = serde_json::json!({"person": {"age": 11}});
//! assert!(service.test_filter("sub-1", "user.created", &payload).await?);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{FilterApiHandler, InMemoryFilterStore};
pub use domain::{
    compare, flatten, flatten_with_prefix, Document, EventTypeFilter, FilterConfiguration,
    FilterEngineConfig, FilterSchema, FilterSpec, FlatMap, Flattener, Operator,
    WILDCARD_EVENT_TYPE,
};
pub use error::{FilterError, StoreError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics, PrometheusMetrics};
pub use ports::{FilterOperation, FilterRegistryApi, FilterStore, SystemTimeSource, TimeSource};
pub use service::{dry_run, dry_run_request, DryRunRequest, FilterRegistryService};
