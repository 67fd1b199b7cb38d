//! API query handler for the filter subsystem
//!
//! Transport-agnostic dispatcher: an HTTP or RPC front end hands over a method
//! name and JSON params and gets a JSON result back.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::{EventTypeFilter, FilterConfiguration, FilterSpec};
use crate::error::FilterError;
use crate::ports::FilterRegistryApi;
use crate::service::{dry_run, dry_run_request, DryRunRequest};

/// JSON-RPC style error code for a filter error.
pub fn error_code(err: &FilterError) -> i32 {
    match err {
        FilterError::InvalidMethod(_) => -32601,
        FilterError::InvalidParams(_)
        | FilterError::NilFilter
        | FilterError::SerializationError(_) => -32602,
        FilterError::FilterNotFound(_) => -32004,
        FilterError::DuplicateFilter { .. } => -32009,
        FilterError::InvalidOperatorKey(_)
        | FilterError::CompositionNotArray(_)
        | FilterError::DepthExceeded { .. }
        | FilterError::InvalidDocument(_) => -32010,
        FilterError::StoreBackend(_) | FilterError::InvalidConfig(_) => -32000,
    }
}

fn parse<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, FilterError> {
    serde_json::from_value(params).map_err(|e| FilterError::InvalidParams(e.to_string()))
}

/// Pull the `filter` param out, rejecting a missing or null one.
fn take_filter<T: for<'de> Deserialize<'de>>(params: &mut Value) -> Result<T, FilterError> {
    match params.get_mut("filter").map(Value::take) {
        None | Some(Value::Null) => Err(FilterError::NilFilter),
        Some(filter) => parse(filter),
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, FilterError> {
    Ok(serde_json::to_value(value)?)
}

#[derive(Deserialize)]
struct IdParams {
    id: String,
}

#[derive(Deserialize)]
struct SubscriptionParams {
    subscription_id: String,
}

#[derive(Deserialize)]
struct GetParams {
    id: Option<String>,
    subscription_id: Option<String>,
    event_type: Option<String>,
}

#[derive(Deserialize)]
struct SyncParams {
    subscription_id: String,
    config: FilterConfiguration,
}

#[derive(Deserialize)]
struct TestParams {
    subscription_id: String,
    event_type: String,
    #[serde(default)]
    payload: Value,
    headers: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DryRunParams {
    Request(DryRunRequest),
    Document { payload: Value, filter: Value },
}

/// API handler wrapping a registry implementation.
pub struct FilterApiHandler<A: FilterRegistryApi> {
    registry: Arc<A>,
}

impl<A: FilterRegistryApi> FilterApiHandler<A> {
    pub fn new(registry: Arc<A>) -> Self {
        Self { registry }
    }

    /// Dispatch a query, wrapping the outcome as `{"result": ..}` or
    /// `{"error": {"code", "message"}}`.
    pub async fn handle_query(&self, method: &str, params: Value) -> Value {
        match self.handle_api_query(method, params).await {
            Ok(result) => json!({ "result": result }),
            Err(e) => json!({
                "error": {
                    "code": error_code(&e),
                    "message": e.to_string()
                }
            }),
        }
    }

    /// Dispatch a query by method name.
    pub async fn handle_api_query(&self, method: &str, params: Value) -> Result<Value, FilterError> {
        debug!(method = %method, "Handling API query");
        match method {
            "create_filter" => self.handle_create_filter(params).await,
            "update_filter" => self.handle_update_filter(params).await,
            "delete_filter" => self.handle_delete_filter(params).await,
            "get_filter" => self.handle_get_filter(params).await,
            "list_filters" => self.handle_list_filters(params).await,
            "sync_subscription" => self.handle_sync_subscription(params).await,
            "delete_subscription" => self.handle_delete_subscription(params).await,
            "test_filter" => self.handle_test_filter(params).await,
            "dry_run" => Self::handle_dry_run(params),
            _ => Err(FilterError::InvalidMethod(method.to_string())),
        }
    }

    async fn handle_create_filter(&self, mut params: Value) -> Result<Value, FilterError> {
        let spec: FilterSpec = take_filter(&mut params)?;
        let filter = self.registry.create_filter(spec).await?;
        to_value(&filter)
    }

    async fn handle_update_filter(&self, mut params: Value) -> Result<Value, FilterError> {
        let filter: EventTypeFilter = take_filter(&mut params)?;
        let filter = self.registry.update_filter(filter).await?;
        to_value(&filter)
    }

    async fn handle_delete_filter(&self, params: Value) -> Result<Value, FilterError> {
        let params: IdParams = parse(params)?;
        self.registry.delete_filter(&params.id).await?;
        Ok(json!({ "id": params.id, "deleted": true }))
    }

    async fn handle_get_filter(&self, params: Value) -> Result<Value, FilterError> {
        let params: GetParams = parse(params)?;
        let filter = match params {
            GetParams { id: Some(id), .. } => self.registry.find_filter_by_id(&id).await?,
            GetParams {
                subscription_id: Some(subscription_id),
                event_type: Some(event_type),
                ..
            } => {
                self.registry
                    .find_filter_by_subscription_and_event_type(&subscription_id, &event_type)
                    .await?
            }
            _ => {
                return Err(FilterError::InvalidParams(
                    "expected id, or subscription_id and event_type".to_string(),
                ))
            }
        };
        to_value(&filter)
    }

    async fn handle_list_filters(&self, params: Value) -> Result<Value, FilterError> {
        let params: SubscriptionParams = parse(params)?;
        let filters = self
            .registry
            .find_filters_by_subscription_id(&params.subscription_id)
            .await?;
        Ok(json!({
            "subscription_id": params.subscription_id,
            "count": filters.len(),
            "filters": to_value(&filters)?
        }))
    }

    async fn handle_sync_subscription(&self, params: Value) -> Result<Value, FilterError> {
        let params: SyncParams = parse(params)?;
        let filters = self
            .registry
            .sync_subscription_filters(&params.subscription_id, &params.config)
            .await?;
        Ok(json!({
            "subscription_id": params.subscription_id,
            "filters": to_value(&filters)?
        }))
    }

    async fn handle_delete_subscription(&self, params: Value) -> Result<Value, FilterError> {
        let params: SubscriptionParams = parse(params)?;
        let removed = self
            .registry
            .delete_subscription_filters(&params.subscription_id)
            .await?;
        Ok(json!({
            "subscription_id": params.subscription_id,
            "removed": removed
        }))
    }

    async fn handle_test_filter(&self, params: Value) -> Result<Value, FilterError> {
        let params: TestParams = parse(params)?;
        let matched = match &params.headers {
            Some(headers) => {
                self.registry
                    .test_request(
                        &params.subscription_id,
                        &params.event_type,
                        headers,
                        &params.payload,
                    )
                    .await?
            }
            None => {
                self.registry
                    .test_filter(&params.subscription_id, &params.event_type, &params.payload)
                    .await?
            }
        };
        Ok(json!({ "is_match": matched }))
    }

    fn handle_dry_run(params: Value) -> Result<Value, FilterError> {
        let matched = match parse::<DryRunParams>(params)? {
            DryRunParams::Request(request) => dry_run_request(&request)?,
            DryRunParams::Document { payload, filter } => dry_run(&payload, &filter)?,
        };
        Ok(json!({ "is_match": matched }))
    }
}
