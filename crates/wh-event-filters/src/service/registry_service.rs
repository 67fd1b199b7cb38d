//! Filter Registry Service
//!
//! Orchestrates domain logic and coordinates with the filter store.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;
use wh_telemetry::log_filter_event;

use crate::domain::{
    compare, EventTypeFilter, FilterConfiguration, FilterEngineConfig, FilterSpec, Flattener,
    Timestamp,
};
use crate::error::FilterError;
use crate::metrics::{EvaluationOutcome, MetricsRecorder, NoOpMetrics, WriteKind};
use crate::ports::{FilterOperation, FilterRegistryApi, FilterStore, SystemTimeSource, TimeSource};

/// Filter registry service implementation
///
/// Implements the `FilterRegistryApi` port using injected dependencies.
pub struct FilterRegistryService<S: FilterStore, T: TimeSource = SystemTimeSource> {
    /// Filter row store (driven port)
    store: Arc<S>,
    /// Clock (driven port)
    time: Arc<T>,
    config: FilterEngineConfig,
    flattener: Flattener,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<S: FilterStore> FilterRegistryService<S, SystemTimeSource> {
    /// Create a new service with the default configuration and system clock
    pub fn new(store: Arc<S>) -> Self {
        let config = FilterEngineConfig::default();
        Self {
            store,
            time: Arc::new(SystemTimeSource),
            flattener: config.flattener(),
            config,
            metrics: Arc::new(NoOpMetrics),
        }
    }
}

impl<S: FilterStore, T: TimeSource> FilterRegistryService<S, T> {
    /// Create with a custom configuration and clock
    pub fn with_config(
        store: Arc<S>,
        time: Arc<T>,
        config: FilterEngineConfig,
    ) -> Result<Self, FilterError> {
        config.validate()?;
        Ok(Self {
            store,
            time,
            flattener: config.flattener(),
            config,
            metrics: Arc::new(NoOpMetrics),
        })
    }

    /// Attach a metrics recorder
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &FilterEngineConfig {
        &self.config
    }

    pub fn flattener(&self) -> &Flattener {
        &self.flattener
    }

    fn validate_identity(subscription_id: &str, event_type: &str) -> Result<(), FilterError> {
        if subscription_id.trim().is_empty() {
            return Err(FilterError::InvalidParams(
                "subscription_id cannot be empty".to_string(),
            ));
        }
        if event_type.trim().is_empty() {
            return Err(FilterError::InvalidParams(
                "event_type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a new row from a spec: fresh uid, timestamps, derived documents.
    fn materialize(&self, spec: FilterSpec, now: Timestamp) -> Result<EventTypeFilter, FilterError> {
        Self::validate_identity(&spec.subscription_id, &spec.event_type)?;

        let mut filter = EventTypeFilter {
            uid: Uuid::new_v4().to_string(),
            subscription_id: spec.subscription_id,
            event_type: spec.event_type,
            headers: Default::default(),
            body: Default::default(),
            raw_headers: spec.raw_headers,
            raw_body: spec.raw_body,
            created_at: now,
            updated_at: now,
        };
        filter.rederive(&self.flattener).map_err(|e| {
            warn!(
                subscription_id = %filter.subscription_id,
                event_type = %filter.event_type,
                error = %e,
                "Rejected filter document"
            );
            FilterError::from(e)
        })?;
        Ok(filter)
    }

    /// Re-derive an existing row before writing it back.
    fn refresh(&self, mut filter: EventTypeFilter, now: Timestamp) -> Result<EventTypeFilter, FilterError> {
        Self::validate_identity(&filter.subscription_id, &filter.event_type)?;
        filter.rederive(&self.flattener)?;
        filter.updated_at = now;
        Ok(filter)
    }

    /// Exact event type filter, falling back to the catch-all filter.
    async fn lookup_for_event(
        &self,
        subscription_id: &str,
        event_type: &str,
    ) -> Result<Option<EventTypeFilter>, FilterError> {
        if let Some(filter) = self
            .store
            .find_by_subscription_and_event_type(subscription_id, event_type)
            .await?
        {
            return Ok(Some(filter));
        }

        if !self.config.fallback_to_wildcard || self.config.is_wildcard(event_type) {
            return Ok(None);
        }

        let wildcard = self
            .store
            .find_by_subscription_and_event_type(subscription_id, &self.config.wildcard_event_type)
            .await?;
        if wildcard.is_some() {
            self.metrics.record_wildcard_fallback();
        }
        Ok(wildcard)
    }

    /// Shared by `test_filter` and `test_request`.
    async fn evaluate(
        &self,
        subscription_id: &str,
        event_type: &str,
        headers: Option<&Value>,
        body: &Value,
    ) -> Result<bool, FilterError> {
        let start = Instant::now();

        let Some(filter) = self.lookup_for_event(subscription_id, event_type).await? else {
            self.metrics
                .record_evaluation(start.elapsed(), EvaluationOutcome::NoFilter);
            log_filter_event!(debug, "No filter registered", subscription_id, event_type);
            return Ok(true);
        };

        if filter.is_empty() {
            self.metrics
                .record_evaluation(start.elapsed(), EvaluationOutcome::EmptyFilter);
            return Ok(true);
        }

        let body_matches = compare(&self.flattener.flatten(body)?, &filter.body);
        let matched = match headers {
            Some(headers) if body_matches => {
                compare(&self.flattener.flatten(headers)?, &filter.headers)
            }
            _ => body_matches,
        };

        self.metrics
            .record_evaluation(start.elapsed(), EvaluationOutcome::from_match(matched));
        log_filter_event!(
            debug,
            "Filter evaluated",
            subscription_id,
            event_type,
            filter_id = %filter.uid,
            matched = matched
        );
        Ok(matched)
    }
}

#[async_trait]
impl<S: FilterStore + 'static, T: TimeSource + 'static> FilterRegistryApi
    for FilterRegistryService<S, T>
{
    async fn create_filter(&self, spec: FilterSpec) -> Result<EventTypeFilter, FilterError> {
        let filter = self.materialize(spec, self.time.now())?;
        self.store.insert(filter.clone()).await?;
        self.metrics.record_write(WriteKind::Insert, 1);

        info!(
            filter_id = %filter.uid,
            subscription_id = %filter.subscription_id,
            event_type = %filter.event_type,
            "Filter created"
        );
        Ok(filter)
    }

    async fn create_filters(
        &self,
        specs: Vec<FilterSpec>,
    ) -> Result<Vec<EventTypeFilter>, FilterError> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.time.now();
        let filters = specs
            .into_iter()
            .map(|spec| self.materialize(spec, now))
            .collect::<Result<Vec<_>, _>>()?;

        let operations = filters.iter().cloned().map(FilterOperation::Insert).collect();
        self.store.atomic_batch_write(operations).await?;
        self.metrics.record_write(WriteKind::Insert, filters.len());

        info!(count = filters.len(), "Filters created");
        Ok(filters)
    }

    async fn update_filter(
        &self,
        filter: EventTypeFilter,
    ) -> Result<EventTypeFilter, FilterError> {
        let filter = self.refresh(filter, self.time.now())?;
        let uid = filter.uid.clone();
        self.store.update(filter).await?;
        self.metrics.record_write(WriteKind::Update, 1);

        info!(filter_id = %uid, "Filter updated");
        self.find_filter_by_id(&uid).await
    }

    async fn update_filters(
        &self,
        filters: Vec<EventTypeFilter>,
    ) -> Result<Vec<EventTypeFilter>, FilterError> {
        if filters.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.time.now();
        let filters = filters
            .into_iter()
            .map(|filter| self.refresh(filter, now))
            .collect::<Result<Vec<_>, _>>()?;

        let operations = filters.iter().cloned().map(FilterOperation::Update).collect();
        self.store.atomic_batch_write(operations).await?;
        self.metrics.record_write(WriteKind::Update, filters.len());

        let mut updated = Vec::with_capacity(filters.len());
        for filter in &filters {
            updated.push(self.find_filter_by_id(&filter.uid).await?);
        }
        info!(count = updated.len(), "Filters updated");
        Ok(updated)
    }

    async fn delete_filter(&self, id: &str) -> Result<(), FilterError> {
        self.store.delete(id).await?;
        self.metrics.record_write(WriteKind::Delete, 1);
        info!(filter_id = %id, "Filter deleted");
        Ok(())
    }

    async fn find_filter_by_id(&self, id: &str) -> Result<EventTypeFilter, FilterError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| FilterError::FilterNotFound(id.to_string()))
    }

    async fn find_filters_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<EventTypeFilter>, FilterError> {
        Ok(self.store.find_by_subscription(subscription_id).await?)
    }

    async fn find_filter_by_subscription_and_event_type(
        &self,
        subscription_id: &str,
        event_type: &str,
    ) -> Result<EventTypeFilter, FilterError> {
        self.store
            .find_by_subscription_and_event_type(subscription_id, event_type)
            .await?
            .ok_or_else(|| {
                FilterError::FilterNotFound(format!("{subscription_id}/{event_type}"))
            })
    }

    async fn test_filter(
        &self,
        subscription_id: &str,
        event_type: &str,
        payload: &Value,
    ) -> Result<bool, FilterError> {
        self.evaluate(subscription_id, event_type, None, payload)
            .await
    }

    async fn test_request(
        &self,
        subscription_id: &str,
        event_type: &str,
        headers: &Value,
        body: &Value,
    ) -> Result<bool, FilterError> {
        self.evaluate(subscription_id, event_type, Some(headers), body)
            .await
    }

    async fn sync_subscription_filters(
        &self,
        subscription_id: &str,
        config: &FilterConfiguration,
    ) -> Result<Vec<EventTypeFilter>, FilterError> {
        let existing = self.store.find_by_subscription(subscription_id).await?;
        let wanted = config.unique_event_types();
        let now = self.time.now();

        let mut deletes = Vec::new();
        for stale in existing
            .iter()
            .filter(|filter| !wanted.contains(&filter.event_type.as_str()))
        {
            deletes.push(FilterOperation::Delete(stale.uid.clone()));
        }

        let mut writes = Vec::with_capacity(wanted.len());
        let mut filters = Vec::with_capacity(wanted.len());
        let (mut inserted, mut updated) = (0, 0);
        for event_type in wanted {
            let schema = config.schema_for(event_type);
            match existing.iter().find(|filter| filter.event_type == event_type) {
                Some(current) => {
                    let mut filter = current.clone();
                    filter.apply_schema(schema, &self.flattener)?;
                    filter.updated_at = now;
                    writes.push(FilterOperation::Update(filter.clone()));
                    filters.push(filter);
                    updated += 1;
                }
                None => {
                    let spec = FilterSpec::new(subscription_id, event_type)
                        .with_headers(schema.effective_raw_headers().clone())
                        .with_body(schema.effective_raw_body().clone());
                    let filter = self.materialize(spec, now)?;
                    writes.push(FilterOperation::Insert(filter.clone()));
                    filters.push(filter);
                    inserted += 1;
                }
            }
        }

        let deleted = deletes.len();
        let mut operations = deletes;
        operations.extend(writes);
        if !operations.is_empty() {
            self.store.atomic_batch_write(operations).await?;
        }

        self.metrics.record_write(WriteKind::Insert, inserted);
        self.metrics.record_write(WriteKind::Update, updated);
        self.metrics.record_write(WriteKind::Delete, deleted);

        info!(
            subscription_id = %subscription_id,
            inserted,
            updated,
            deleted,
            "Subscription filters synchronised"
        );
        Ok(filters)
    }

    async fn delete_subscription_filters(
        &self,
        subscription_id: &str,
    ) -> Result<usize, FilterError> {
        let existing = self.store.find_by_subscription(subscription_id).await?;
        if existing.is_empty() {
            return Ok(0);
        }

        let operations = existing
            .iter()
            .map(|filter| FilterOperation::Delete(filter.uid.clone()))
            .collect();
        self.store.atomic_batch_write(operations).await?;
        self.metrics.record_write(WriteKind::Delete, existing.len());

        info!(
            subscription_id = %subscription_id,
            count = existing.len(),
            "Subscription filters deleted"
        );
        Ok(existing.len())
    }
}
