//! Shared fixtures for integration flows.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use wh_event_filters::domain::{into_document, Timestamp};
use wh_event_filters::{
    Document, EventTypeFilter, FilterEngineConfig, FilterOperation, FilterRegistryService,
    FilterStore, InMemoryFilterStore, Metrics, StoreError, TimeSource,
};

/// Clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn starting_at(now: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Store that can be told to fail its next batch write, and records the size
/// of every batch it receives.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryFilterStore,
    fail_next: AtomicBool,
    batches: Mutex<Vec<usize>>,
}

impl FlakyStore {
    pub fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl FilterStore for FlakyStore {
    async fn atomic_batch_write(&self, operations: Vec<FilterOperation>) -> Result<(), StoreError> {
        self.batches.lock().push(operations.len());
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.atomic_batch_write(operations).await
    }

    async fn get(&self, id: &str) -> Result<Option<EventTypeFilter>, StoreError> {
        self.inner.get(id).await
    }

    async fn find_by_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<EventTypeFilter>, StoreError> {
        self.inner.find_by_subscription(subscription_id).await
    }

    async fn find_by_subscription_and_event_type(
        &self,
        subscription_id: &str,
        event_type: &str,
    ) -> Result<Option<EventTypeFilter>, StoreError> {
        self.inner
            .find_by_subscription_and_event_type(subscription_id, event_type)
            .await
    }
}

pub type Registry = FilterRegistryService<FlakyStore, ManualClock>;

/// Everything a flow needs to poke at.
pub struct Harness {
    pub registry: Registry,
    pub store: Arc<FlakyStore>,
    pub clock: Arc<ManualClock>,
    pub metrics: Arc<Metrics>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(FilterEngineConfig::default())
    }

    pub fn with_config(config: FilterEngineConfig) -> Self {
        let store = Arc::new(FlakyStore::default());
        let clock = Arc::new(ManualClock::starting_at(1_700_000_000));
        let metrics = Arc::new(Metrics::new());
        let registry = FilterRegistryService::with_config(store.clone(), clock.clone(), config)
            .expect("default config is valid")
            .with_metrics(metrics.clone());
        Self {
            registry,
            store,
            clock,
            metrics,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a document from a JSON object literal.
pub fn doc(value: Value) -> Document {
    into_document(value).expect("fixture must be a JSON object")
}
