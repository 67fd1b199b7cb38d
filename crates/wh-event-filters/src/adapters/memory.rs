use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{EventTypeFilter, FilterId};
use crate::error::StoreError;
use crate::ports::{FilterOperation, FilterStore};

/// In-memory filter store for tests and embedded use.
///
/// Batches are staged on a copy of the table and swapped in only when every
/// operation succeeded, so readers never see a partially applied batch.
#[derive(Default)]
pub struct InMemoryFilterStore {
    rows: RwLock<HashMap<FilterId, EventTypeFilter>>,
}

impl InMemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn apply_batch(&self, operations: Vec<FilterOperation>) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        let mut staged = rows.clone();
        for op in operations {
            apply(&mut staged, op)?;
        }
        *rows = staged;
        Ok(())
    }
}

fn apply(
    rows: &mut HashMap<FilterId, EventTypeFilter>,
    op: FilterOperation,
) -> Result<(), StoreError> {
    match op {
        FilterOperation::Insert(filter) => {
            if rows.contains_key(&filter.uid) {
                return Err(StoreError::Backend(format!(
                    "uid {} already exists",
                    filter.uid
                )));
            }
            ensure_unique(rows, &filter)?;
            rows.insert(filter.uid.clone(), filter);
        }
        FilterOperation::Update(mut filter) => {
            let created_at = rows
                .get(&filter.uid)
                .map(|current| current.created_at)
                .ok_or_else(|| StoreError::NotFound(filter.uid.clone()))?;
            ensure_unique(rows, &filter)?;
            filter.created_at = created_at;
            rows.insert(filter.uid.clone(), filter);
        }
        FilterOperation::Delete(uid) => {
            rows.remove(&uid).ok_or(StoreError::NotFound(uid))?;
        }
    }
    Ok(())
}

/// One row per (subscription, event type); the row itself is exempt.
fn ensure_unique(
    rows: &HashMap<FilterId, EventTypeFilter>,
    filter: &EventTypeFilter,
) -> Result<(), StoreError> {
    let clash = rows.values().any(|row| {
        row.uid != filter.uid
            && row.subscription_id == filter.subscription_id
            && row.event_type == filter.event_type
    });
    if clash {
        return Err(StoreError::Duplicate {
            subscription_id: filter.subscription_id.clone(),
            event_type: filter.event_type.clone(),
        });
    }
    Ok(())
}

#[async_trait]
impl FilterStore for InMemoryFilterStore {
    async fn atomic_batch_write(&self, operations: Vec<FilterOperation>) -> Result<(), StoreError> {
        self.apply_batch(operations)
    }

    async fn get(&self, id: &str) -> Result<Option<EventTypeFilter>, StoreError> {
        Ok(self.rows.read().get(id).cloned())
    }

    async fn find_by_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<EventTypeFilter>, StoreError> {
        let mut found: Vec<_> = self
            .rows
            .read()
            .values()
            .filter(|row| row.subscription_id == subscription_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.event_type.cmp(&b.event_type))
        });
        Ok(found)
    }

    async fn find_by_subscription_and_event_type(
        &self,
        subscription_id: &str,
        event_type: &str,
    ) -> Result<Option<EventTypeFilter>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .find(|row| row.subscription_id == subscription_id && row.event_type == event_type)
            .cloned())
    }
}
