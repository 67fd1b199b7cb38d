//! Domain Layer - Pure business logic
//!
//! This layer contains:
//! - Document flattening
//! - The query operator vocabulary
//! - The operator evaluator
//! - Filter entities
//! - Configuration
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - Pure functions where possible

pub mod compare;
pub mod config;
pub mod entities;
pub mod flatten;
pub mod operators;

pub use compare::compare;
pub use config::{FilterEngineConfig, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, WILDCARD_EVENT_TYPE};
pub use entities::{
    into_document, EventTypeFilter, FilterConfiguration, FilterId, FilterSchema, FilterSpec,
    SubscriptionId, Timestamp,
};
pub use flatten::{flatten, flatten_with_prefix, Document, FlatMap, FlattenError, Flattener};
pub use operators::{is_operator_key, values_equal, Operator};
