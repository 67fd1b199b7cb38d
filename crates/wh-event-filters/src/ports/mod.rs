//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for external callers
//! - Driven Ports (outbound) - Dependencies on the host application

pub mod inbound;
pub mod outbound;

pub use inbound::FilterRegistryApi;
pub use outbound::{FilterOperation, FilterStore, SystemTimeSource, TimeSource};
