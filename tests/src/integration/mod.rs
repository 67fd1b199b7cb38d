//! # Integration Flows
//!
//! Drive the registry the way its callers do: the subscription lifecycle
//! service writes filters, the delivery pipeline tests payloads against them.

pub mod concurrency;
pub mod delivery;
pub mod fixtures;
