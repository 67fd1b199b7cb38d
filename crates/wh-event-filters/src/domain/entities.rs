//! Filter entities
//!
//! One [`EventTypeFilter`] row exists per (subscription, event type). The
//! flattened `headers` / `body` are always derived from `raw_headers` /
//! `raw_body`; they are never edited on their own.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::flatten::{Document, FlatMap, FlattenError, Flattener};
use crate::error::FilterError;

/// Unique filter identifier (UUID v4 string).
pub type FilterId = String;

/// Owning subscription identifier.
pub type SubscriptionId = String;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Accept `null` wherever a document is expected.
fn document_or_null<'de, D>(deserializer: D) -> Result<Document, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Document>::deserialize(deserializer)?.unwrap_or_default())
}

/// Convert an arbitrary value into a document. `null` is the empty document.
pub fn into_document(value: Value) -> Result<Document, FilterError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Document::new()),
        other => Err(FilterError::InvalidDocument(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// A stored filter for one subscription and event type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventTypeFilter {
    pub uid: FilterId,
    pub subscription_id: SubscriptionId,
    pub event_type: String,
    #[serde(default, deserialize_with = "document_or_null")]
    pub headers: FlatMap,
    #[serde(default, deserialize_with = "document_or_null")]
    pub body: FlatMap,
    #[serde(default, deserialize_with = "document_or_null")]
    pub raw_headers: Document,
    #[serde(default, deserialize_with = "document_or_null")]
    pub raw_body: Document,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl EventTypeFilter {
    /// No header or body constraint: matches every payload.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body.is_empty()
    }

    /// Re-derive `headers` / `body` from the raw documents.
    pub fn rederive(&mut self, flattener: &Flattener) -> Result<(), FlattenError> {
        self.headers = flattener.flatten_document(&self.raw_headers)?;
        self.body = flattener.flatten_document(&self.raw_body)?;
        Ok(())
    }

    /// Replace the raw documents from a schema and re-derive.
    pub fn apply_schema(
        &mut self,
        schema: &FilterSchema,
        flattener: &Flattener,
    ) -> Result<(), FlattenError> {
        self.raw_headers = schema.effective_raw_headers().clone();
        self.raw_body = schema.effective_raw_body().clone();
        self.rederive(flattener)
    }

    /// The filter documents as a schema.
    pub fn schema(&self) -> FilterSchema {
        FilterSchema {
            headers: self.headers.clone(),
            body: self.body.clone(),
            raw_headers: self.raw_headers.clone(),
            raw_body: self.raw_body.clone(),
        }
    }
}

/// Input for creating a filter; the registry assigns uid and timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub subscription_id: SubscriptionId,
    pub event_type: String,
    #[serde(default, deserialize_with = "document_or_null")]
    pub raw_headers: Document,
    #[serde(default, deserialize_with = "document_or_null")]
    pub raw_body: Document,
}

impl FilterSpec {
    pub fn new(subscription_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// Set the raw body filter document.
    pub fn with_body(mut self, raw_body: Document) -> Self {
        self.raw_body = raw_body;
        self
    }

    /// Set the raw header filter document.
    pub fn with_headers(mut self, raw_headers: Document) -> Self {
        self.raw_headers = raw_headers;
        self
    }
}

/// Header / body filter documents as carried by a subscription.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSchema {
    #[serde(default, deserialize_with = "document_or_null")]
    pub headers: FlatMap,
    #[serde(default, deserialize_with = "document_or_null")]
    pub body: FlatMap,
    #[serde(default, deserialize_with = "document_or_null")]
    pub raw_headers: Document,
    #[serde(default, deserialize_with = "document_or_null")]
    pub raw_body: Document,
}

impl FilterSchema {
    /// Build a schema from raw documents, deriving the flattened halves.
    pub fn from_raw(
        raw_headers: Document,
        raw_body: Document,
        flattener: &Flattener,
    ) -> Result<Self, FlattenError> {
        Ok(Self {
            headers: flattener.flatten_document(&raw_headers)?,
            body: flattener.flatten_document(&raw_body)?,
            raw_headers,
            raw_body,
        })
    }

    /// Raw headers, falling back to the flattened form when only that was
    /// supplied. Flattening a flat document returns it unchanged.
    pub fn effective_raw_headers(&self) -> &Document {
        if self.raw_headers.is_empty() {
            &self.headers
        } else {
            &self.raw_headers
        }
    }

    /// Raw body, falling back to the flattened form when only that was supplied.
    pub fn effective_raw_body(&self) -> &Document {
        if self.raw_body.is_empty() {
            &self.body
        } else {
            &self.raw_body
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effective_raw_headers().is_empty() && self.effective_raw_body().is_empty()
    }
}

/// Subscription filter configuration: the declared event types plus the
/// filter documents that apply to them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    pub event_types: Vec<String>,
    #[serde(default)]
    pub filter: FilterSchema,
    /// Per event type schemas; `filter` applies where none is given.
    #[serde(default)]
    pub event_type_filters: BTreeMap<String, FilterSchema>,
}

impl FilterConfiguration {
    pub fn new<I, S>(event_types: I, filter: FilterSchema) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            event_types: event_types.into_iter().map(Into::into).collect(),
            filter,
            event_type_filters: BTreeMap::new(),
        }
    }

    /// Override the schema for one event type.
    pub fn with_event_type_filter(
        mut self,
        event_type: impl Into<String>,
        schema: FilterSchema,
    ) -> Self {
        self.event_type_filters.insert(event_type.into(), schema);
        self
    }

    /// Schema for `event_type`.
    pub fn schema_for(&self, event_type: &str) -> &FilterSchema {
        self.event_type_filters
            .get(event_type)
            .unwrap_or(&self.filter)
    }

    /// Declared event types in order, duplicates removed.
    pub fn unique_event_types(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.event_types.len());
        for event_type in &self.event_types {
            if !seen.contains(&event_type.as_str()) {
                seen.push(event_type.as_str());
            }
        }
        seen
    }
}
