//! Document flattening
//!
//! Converts an arbitrarily nested document into a single-level mapping from
//! dotted / indexed paths to values, leaving query-operator sub-documents
//! intact:
//!
//! ```text
//! {"data": [{"event": "paid"}], "age": {"$gte": 5}}
//!   => {"data.0.event": "paid", "age": {"$gte": 5}}
//! ```
//!
//! Rules:
//! - Scalars are stored under the current path.
//! - Object fields extend the path with `.field`. A field whose value
//!   flattens to nothing (empty object, empty array, array without object
//!   elements) is stored verbatim at its path.
//! - Array elements that are objects extend the path with `.index`; scalar
//!   elements are skipped.
//! - Operator keys are terminal. `$or` / `$and` keep their key and have each
//!   branch flattened on its own.

use serde_json::{Map, Value};
use thiserror::Error;

use super::config::DEFAULT_MAX_DEPTH;
use super::operators::{is_operator_key, Operator};

/// A raw, possibly nested JSON object.
pub type Document = Map<String, Value>;

/// A flattened mapping from dotted paths to values.
pub type FlatMap = Map<String, Value>;

/// Structural errors raised while flattening a filter document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("invalid operator key: {0}")]
    InvalidOperatorKey(String),

    #[error("value of {0} must be an array of documents")]
    CompositionNotArray(String),

    #[error("document nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },
}

/// Flattener with a bounded recursion depth.
///
/// `max_depth` counts object levels, the root included: with a limit of 2,
/// `{"a": {"b": 1}}` and `{"a": [{"b": 1}]}` are accepted and
/// `{"a": {"b": {"c": 1}}}` is rejected. Arrays do not add a level.
#[derive(Clone, Copy, Debug)]
pub struct Flattener {
    max_depth: usize,
}

impl Default for Flattener {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Flattener {
    /// Create a flattener that rejects documents with more than `max_depth`
    /// object levels.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Maximum nesting depth accepted.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Flatten any value.
    pub fn flatten(&self, value: &Value) -> Result<FlatMap, FlattenError> {
        self.flatten_with_prefix("", value)
    }

    /// Flatten any value, prefixing every resulting key with `"<prefix>."`.
    pub fn flatten_with_prefix(&self, prefix: &str, value: &Value) -> Result<FlatMap, FlattenError> {
        let mut out = FlatMap::new();
        self.walk(prefix, value, 0, &mut out)?;
        Ok(out)
    }

    /// Flatten an object without wrapping it in a `Value`.
    pub fn flatten_document(&self, document: &Document) -> Result<FlatMap, FlattenError> {
        let mut out = FlatMap::new();
        self.walk_object("", document, 0, &mut out)?;
        Ok(out)
    }

    fn walk(
        &self,
        path: &str,
        value: &Value,
        depth: usize,
        out: &mut FlatMap,
    ) -> Result<(), FlattenError> {
        match value {
            Value::Object(map) => self.walk_object(path, map, depth, out),
            Value::Array(items) => self.walk_array(path, items, depth, out),
            Value::Null if path.is_empty() => Ok(()),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                out.insert(path.to_string(), value.clone());
                Ok(())
            }
        }
    }

    fn walk_object(
        &self,
        path: &str,
        map: &Document,
        depth: usize,
        out: &mut FlatMap,
    ) -> Result<(), FlattenError> {
        self.check_depth(depth)?;

        let mut operators = Document::new();
        for (key, value) in map {
            if is_operator_key(key) {
                let op = Operator::parse(key)
                    .ok_or_else(|| FlattenError::InvalidOperatorKey(key.clone()))?;
                let kept = if op.is_composition() {
                    self.flatten_branches(op, value, depth)?
                } else {
                    value.clone()
                };
                operators.insert(key.clone(), kept);
                continue;
            }

            let field_path = join(path, key);
            let mut nested = FlatMap::new();
            self.walk(&field_path, value, depth + 1, &mut nested)?;
            if nested.is_empty() {
                out.insert(field_path, value.clone());
            } else {
                out.extend(nested);
            }
        }

        if operators.is_empty() {
            return Ok(());
        }
        if path.is_empty() {
            out.extend(operators);
        } else {
            match out.get_mut(path) {
                Some(Value::Object(existing)) => existing.extend(operators),
                _ => {
                    out.insert(path.to_string(), Value::Object(operators));
                }
            }
        }
        Ok(())
    }

    fn walk_array(
        &self,
        path: &str,
        items: &[Value],
        depth: usize,
        out: &mut FlatMap,
    ) -> Result<(), FlattenError> {
        for (index, item) in items.iter().enumerate() {
            if item.is_object() {
                self.walk(&join(path, &index.to_string()), item, depth, out)?;
            }
        }
        Ok(())
    }

    /// Each `$or` / `$and` branch is flattened independently with no prefix.
    fn flatten_branches(
        &self,
        op: Operator,
        value: &Value,
        depth: usize,
    ) -> Result<Value, FlattenError> {
        let not_array = || FlattenError::CompositionNotArray(op.as_str().to_string());

        let branches = value.as_array().ok_or_else(not_array)?;
        let mut flattened = Vec::with_capacity(branches.len());
        for branch in branches {
            let document = branch.as_object().ok_or_else(not_array)?;
            let mut flat = FlatMap::new();
            self.walk_object("", document, depth + 1, &mut flat)?;
            flattened.push(Value::Object(flat));
        }
        Ok(Value::Array(flattened))
    }

    /// `depth` is zero-based, so level `depth + 1` must not exceed the limit.
    fn check_depth(&self, depth: usize) -> Result<(), FlattenError> {
        if depth >= self.max_depth {
            return Err(FlattenError::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Flatten with the default depth limit.
pub fn flatten(value: &Value) -> Result<FlatMap, FlattenError> {
    Flattener::default().flatten(value)
}

/// Flatten with the default depth limit and a key prefix.
pub fn flatten_with_prefix(prefix: &str, value: &Value) -> Result<FlatMap, FlattenError> {
    Flattener::default().flatten_with_prefix(prefix, value)
}
