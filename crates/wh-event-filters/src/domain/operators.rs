//! Query operator vocabulary
//!
//! The operator set is closed: every legal `$`-prefixed key maps to exactly
//! one [`Operator`] variant and evaluation is an exhaustive match.

use serde_json::Value;

/// A recognised query operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Gte,
    Gt,
    Lte,
    Lt,
    In,
    Nin,
    Eq,
    Neq,
    Or,
    And,
    Exist,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 11] = [
        Operator::Gte,
        Operator::Gt,
        Operator::Lte,
        Operator::Lt,
        Operator::In,
        Operator::Nin,
        Operator::Eq,
        Operator::Neq,
        Operator::Or,
        Operator::And,
        Operator::Exist,
    ];

    /// Resolve an operator from its key, e.g. `"$gte"`.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "$gte" => Some(Operator::Gte),
            "$gt" => Some(Operator::Gt),
            "$lte" => Some(Operator::Lte),
            "$lt" => Some(Operator::Lt),
            "$in" => Some(Operator::In),
            "$nin" => Some(Operator::Nin),
            "$eq" => Some(Operator::Eq),
            "$neq" => Some(Operator::Neq),
            "$or" => Some(Operator::Or),
            "$and" => Some(Operator::And),
            "$exist" => Some(Operator::Exist),
            _ => None,
        }
    }

    /// The operator's key as it appears in filter documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Gte => "$gte",
            Operator::Gt => "$gt",
            Operator::Lte => "$lte",
            Operator::Lt => "$lt",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Eq => "$eq",
            Operator::Neq => "$neq",
            Operator::Or => "$or",
            Operator::And => "$and",
            Operator::Exist => "$exist",
        }
    }

    /// `$or` and `$and` combine sub-filter documents.
    pub fn is_composition(&self) -> bool {
        matches!(self, Operator::Or | Operator::And)
    }

    /// Apply a value-level operator to a payload value.
    ///
    /// Composition operators and `$exist` need the surrounding document and
    /// always return `false` here; the evaluator handles them separately.
    pub fn apply(&self, payload: &Value, operand: &Value) -> bool {
        match self {
            Operator::Gte => compare_numbers(payload, operand, |a, b| a >= b),
            Operator::Gt => compare_numbers(payload, operand, |a, b| a > b),
            Operator::Lte => compare_numbers(payload, operand, |a, b| a <= b),
            Operator::Lt => compare_numbers(payload, operand, |a, b| a < b),
            Operator::In => is_member(payload, operand),
            Operator::Nin => !is_member(payload, operand),
            Operator::Eq => values_equal(payload, operand),
            Operator::Neq => !values_equal(payload, operand),
            Operator::Or | Operator::And | Operator::Exist => false,
        }
    }
}

/// Is `key` shaped like an operator (`$` followed by an identifier)?
///
/// `"$gte"` and `"$venues"` are operator-shaped; `"a$b"`, `"$"` and
/// `"$.venues.$.lagos"` are literal field names.
pub fn is_operator_key(key: &str) -> bool {
    match key.strip_prefix('$') {
        Some(rest) => {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Numeric view of a value. Only JSON numbers qualify.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn compare_numbers(payload: &Value, operand: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(payload), as_number(operand)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// Deep equality with numeric normalisation, so `5 == 5.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_number(a) == as_number(b),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map_or(false, |y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Linear membership scan using [`values_equal`].
pub fn contains(haystack: &[Value], needle: &Value) -> bool {
    haystack.iter().any(|item| values_equal(item, needle))
}

/// `$in` membership across the supported call shapes:
/// scalar in filter array, filter scalar in payload array, or any overlap
/// between two arrays.
fn is_member(payload: &Value, operand: &Value) -> bool {
    match (payload, operand) {
        (Value::Array(items), Value::Array(candidates)) => {
            items.iter().any(|item| contains(candidates, item))
        }
        (Value::Array(items), needle) => contains(items, needle),
        (needle, Value::Array(candidates)) => contains(candidates, needle),
        _ => false,
    }
}
