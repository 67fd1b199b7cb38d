//! Ad-hoc filter testing
//!
//! Evaluates a filter document against a sample payload without touching the
//! registry. Used by operators to check a filter before attaching it to a
//! subscription.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{compare, Flattener};
use crate::error::FilterError;

/// One side of a dry run: a request sample or a filter schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DryRunSide {
    #[serde(default, alias = "header")]
    pub headers: Value,
    #[serde(default)]
    pub body: Value,
}

/// Sample request plus the filter schema to test it against.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DryRunRequest {
    pub request: DryRunSide,
    pub schema: DryRunSide,
}

/// Flatten both documents and compare them.
pub fn dry_run(payload: &Value, filter: &Value) -> Result<bool, FilterError> {
    dry_run_with(&Flattener::default(), payload, filter)
}

/// [`dry_run`] with an explicit flattener.
pub fn dry_run_with(
    flattener: &Flattener,
    payload: &Value,
    filter: &Value,
) -> Result<bool, FilterError> {
    let filter = flattener.flatten(filter)?;
    if filter.is_empty() {
        return Ok(true);
    }
    Ok(compare(&flattener.flatten(payload)?, &filter))
}

/// Test headers and body of a sample request. Both must match.
///
/// Both filter documents are flattened before anything is compared, so a
/// malformed header filter is reported even when the body already fails.
pub fn dry_run_request(request: &DryRunRequest) -> Result<bool, FilterError> {
    let flattener = Flattener::default();
    let body_filter = flattener.flatten(&request.schema.body)?;
    let header_filter = flattener.flatten(&request.schema.headers)?;
    let body = flattener.flatten(&request.request.body)?;
    let headers = flattener.flatten(&request.request.headers)?;

    Ok(compare(&body, &body_filter) && compare(&headers, &header_filter))
}
