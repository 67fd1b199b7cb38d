//! Error types for the event filter subsystem

use thiserror::Error;

use crate::domain::FlattenError;

/// Errors that can occur in the event filter subsystem
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Filter not found: {0}")]
    FilterNotFound(String),

    #[error("Filter cannot be null")]
    NilFilter,

    #[error("Invalid operator key: {0}")]
    InvalidOperatorKey(String),

    #[error("Value of {0} must be an array of documents")]
    CompositionNotArray(String),

    #[error("Document nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Filter already exists for subscription {subscription_id} and event type {event_type}")]
    DuplicateFilter {
        subscription_id: String,
        event_type: String,
    },

    #[error("Store error: {0}")]
    StoreBackend(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from filter stores
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Row not found: {0}")]
    NotFound(String),

    #[error("Duplicate event type {event_type} for subscription {subscription_id}")]
    Duplicate {
        subscription_id: String,
        event_type: String,
    },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for FilterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => FilterError::FilterNotFound(id),
            StoreError::Duplicate {
                subscription_id,
                event_type,
            } => FilterError::DuplicateFilter {
                subscription_id,
                event_type,
            },
            StoreError::Backend(msg) => FilterError::StoreBackend(msg),
        }
    }
}

impl From<FlattenError> for FilterError {
    fn from(err: FlattenError) -> Self {
        match err {
            FlattenError::InvalidOperatorKey(key) => FilterError::InvalidOperatorKey(key),
            FlattenError::CompositionNotArray(op) => FilterError::CompositionNotArray(op),
            FlattenError::DepthExceeded { max } => FilterError::DepthExceeded { max },
        }
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::SerializationError(err.to_string())
    }
}
