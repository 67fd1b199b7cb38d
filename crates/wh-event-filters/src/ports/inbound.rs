//! Inbound Ports (Driving Ports)
//!
//! The API that the subscription lifecycle service, the delivery pipeline
//! and operator tooling use to interact with the filter subsystem.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{EventTypeFilter, FilterConfiguration, FilterSpec};
use crate::error::FilterError;

/// Filter registry and test API (Driving Port)
#[async_trait]
pub trait FilterRegistryApi: Send + Sync {
    /// Create a filter; assigns uid and timestamps and derives the flattened
    /// header / body documents.
    async fn create_filter(&self, spec: FilterSpec) -> Result<EventTypeFilter, FilterError>;

    /// Create several filters in one atomic batch. An empty list is a no-op.
    async fn create_filters(
        &self,
        specs: Vec<FilterSpec>,
    ) -> Result<Vec<EventTypeFilter>, FilterError>;

    /// Replace a filter's documents, re-deriving the flattened forms.
    ///
    /// Fails with `FilterNotFound` if the uid does not exist.
    async fn update_filter(&self, filter: EventTypeFilter)
        -> Result<EventTypeFilter, FilterError>;

    /// Update several filters in one atomic batch.
    async fn update_filters(
        &self,
        filters: Vec<EventTypeFilter>,
    ) -> Result<Vec<EventTypeFilter>, FilterError>;

    /// Delete a filter. Deleting a missing uid fails with `FilterNotFound`.
    async fn delete_filter(&self, id: &str) -> Result<(), FilterError>;

    async fn find_filter_by_id(&self, id: &str) -> Result<EventTypeFilter, FilterError>;

    /// All filters for a subscription; empty when none exist.
    async fn find_filters_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<EventTypeFilter>, FilterError>;

    async fn find_filter_by_subscription_and_event_type(
        &self,
        subscription_id: &str,
        event_type: &str,
    ) -> Result<EventTypeFilter, FilterError>;

    /// Should `payload` be delivered to `subscription_id` for `event_type`?
    ///
    /// Lookup order: exact event type, then the catch-all filter. No filter,
    /// or an empty filter, always matches.
    async fn test_filter(
        &self,
        subscription_id: &str,
        event_type: &str,
        payload: &Value,
    ) -> Result<bool, FilterError>;

    /// Like [`test_filter`](Self::test_filter), also checking request headers.
    async fn test_request(
        &self,
        subscription_id: &str,
        event_type: &str,
        headers: &Value,
        body: &Value,
    ) -> Result<bool, FilterError>;

    /// Bring a subscription's filters into exact correspondence with its
    /// declared event types, as one atomic batch.
    async fn sync_subscription_filters(
        &self,
        subscription_id: &str,
        config: &FilterConfiguration,
    ) -> Result<Vec<EventTypeFilter>, FilterError>;

    /// Remove every filter of a subscription. Returns the number removed.
    async fn delete_subscription_filters(&self, subscription_id: &str)
        -> Result<usize, FilterError>;
}
