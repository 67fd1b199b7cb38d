//! Outbound Ports (Driven Ports)
//!
//! Dependencies the filter subsystem needs from the host application: a
//! row store for filters and a clock.

use async_trait::async_trait;

use crate::domain::{EventTypeFilter, FilterId, Timestamp};
use crate::error::StoreError;

/// Write operation applied as part of an atomic batch.
#[derive(Clone, Debug)]
pub enum FilterOperation {
    /// Insert a new row. Fails on a duplicate (subscription, event type).
    Insert(EventTypeFilter),
    /// Replace an existing row by uid, keeping its `created_at`.
    Update(EventTypeFilter),
    /// Remove a row by uid.
    Delete(FilterId),
}

/// Filter row store (Driven Port)
///
/// Production: a relational table with columns id, subscription_id,
/// event_type, headers, body, raw_headers, raw_body, created_at, updated_at
/// and a unique index on (subscription_id, event_type).
/// Testing: [`InMemoryFilterStore`](crate::adapters::InMemoryFilterStore).
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch succeed, or NONE are applied, and
    /// readers never observe a partially applied batch.
    async fn atomic_batch_write(&self, operations: Vec<FilterOperation>) -> Result<(), StoreError>;

    /// Get a row by uid.
    async fn get(&self, id: &str) -> Result<Option<EventTypeFilter>, StoreError>;

    /// All rows owned by a subscription.
    async fn find_by_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<EventTypeFilter>, StoreError>;

    /// The row for a (subscription, event type) pair.
    async fn find_by_subscription_and_event_type(
        &self,
        subscription_id: &str,
        event_type: &str,
    ) -> Result<Option<EventTypeFilter>, StoreError>;

    /// Insert a single row.
    async fn insert(&self, filter: EventTypeFilter) -> Result<(), StoreError> {
        self.atomic_batch_write(vec![FilterOperation::Insert(filter)])
            .await
    }

    /// Update a single row.
    async fn update(&self, filter: EventTypeFilter) -> Result<(), StoreError> {
        self.atomic_batch_write(vec![FilterOperation::Update(filter)])
            .await
    }

    /// Delete a single row.
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.atomic_batch_write(vec![FilterOperation::Delete(id.to_string())])
            .await
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Default time source using system time.
#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
