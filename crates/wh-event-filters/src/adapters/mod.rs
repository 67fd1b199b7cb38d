//! Adapters Layer
//!
//! Implementations of driven ports and the front door for external callers.
//!
//! ## Adapters
//!
//! - `InMemoryFilterStore` - `FilterStore` backed by a locked hash map
//! - `FilterApiHandler` - Dispatches JSON API queries to the registry

pub mod api_handler;
pub mod memory;

pub use api_handler::{error_code, FilterApiHandler};
pub use memory::InMemoryFilterStore;
