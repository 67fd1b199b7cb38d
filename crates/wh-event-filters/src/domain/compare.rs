//! Operator evaluator
//!
//! Decides whether a payload satisfies a filter. Both sides are normally
//! flattened first; nested documents are tolerated because plain object
//! conditions recurse field by field.
//!
//! Semantics:
//! - Top-level filter keys are ANDed.
//! - A key missing from the payload does not fail the match, except for
//!   `$exist`, which tests presence, and `$or` / `$and`, which always run.
//! - Type mismatches evaluate to `false`; the evaluator never errors.

use std::borrow::Cow;

use serde_json::Value;

use super::flatten::{Document, FlatMap};
use super::operators::{contains, values_equal, Operator};

/// Evaluate `filter` against `payload`.
pub fn compare(payload: &FlatMap, filter: &FlatMap) -> bool {
    matches_document(payload, filter)
}

/// `scope` is the document conditions are resolved against: the whole
/// payload at the top level, or the sub-document under a nested `$or` /
/// `$and`.
fn matches_document(scope: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, condition)| matches_entry(scope, key, condition))
}

fn matches_entry(scope: &Document, key: &str, condition: &Value) -> bool {
    if let Some(op) = Operator::parse(key).filter(Operator::is_composition) {
        return evaluate_composition(op, scope, condition);
    }

    if let Some(operators) = operator_document(condition) {
        return operators
            .into_iter()
            .all(|(op, operand)| evaluate_operator(scope, key, op, operand));
    }

    match scope.get(key) {
        None => true,
        Some(value) => matches_literal(value, condition),
    }
}

/// A non-empty object whose keys are all recognised operators.
fn operator_document(condition: &Value) -> Option<Vec<(Operator, &Value)>> {
    let map = condition.as_object()?;
    if map.is_empty() {
        return None;
    }
    map.iter()
        .map(|(key, operand)| Operator::parse(key).map(|op| (op, operand)))
        .collect()
}

fn evaluate_operator(scope: &Document, key: &str, op: Operator, operand: &Value) -> bool {
    match op {
        Operator::Exist => evaluate_exist(scope, key, operand),
        Operator::Or | Operator::And => {
            let nested = scoped(scope, key);
            evaluate_composition(op, &nested, operand)
        }
        Operator::Gte
        | Operator::Gt
        | Operator::Lte
        | Operator::Lt
        | Operator::In
        | Operator::Nin
        | Operator::Eq
        | Operator::Neq => match scope.get(key) {
            None => true,
            Some(value) => op.apply(value, operand),
        },
    }
}

/// `$exist: true|false` against presence of `key` in `scope`, either as a
/// direct entry or as the parent of flattened `key.*` entries.
fn evaluate_exist(scope: &Document, key: &str, operand: &Value) -> bool {
    let Some(wanted) = operand.as_bool() else {
        return false;
    };
    is_present(scope, key) == wanted
}

fn is_present(scope: &Document, key: &str) -> bool {
    scope.contains_key(key)
        || scope.keys().any(|candidate| {
            candidate
                .strip_prefix(key)
                .map_or(false, |rest| rest.starts_with('.'))
        })
}

fn evaluate_composition(op: Operator, scope: &Document, condition: &Value) -> bool {
    let Some(branches) = condition.as_array() else {
        return false;
    };
    let mut results = branches.iter().map(|branch| match branch.as_object() {
        Some(filter) => matches_document(scope, filter),
        None => false,
    });
    match op {
        Operator::Or => results.any(|matched| matched),
        _ => results.all(|matched| matched),
    }
}

/// The sub-document rooted at `key`: the nested object if the payload is
/// unflattened, otherwise the `key.*` entries with the prefix stripped.
fn scoped<'a>(scope: &'a Document, key: &str) -> Cow<'a, Document> {
    if let Some(Value::Object(nested)) = scope.get(key) {
        return Cow::Borrowed(nested);
    }
    let prefix = format!("{key}.");
    let nested = scope
        .iter()
        .filter_map(|(candidate, value)| {
            candidate
                .strip_prefix(&prefix)
                .map(|rest| (rest.to_string(), value.clone()))
        })
        .collect();
    Cow::Owned(nested)
}

fn matches_literal(value: &Value, condition: &Value) -> bool {
    match (value, condition) {
        (Value::Object(payload), Value::Object(filter)) if !filter.is_empty() => {
            matches_document(payload, filter)
        }
        (Value::Array(items), _) => values_equal(value, condition) || contains(items, condition),
        _ => values_equal(value, condition),
    }
}
