//! Service Layer - Application services
//!
//! Orchestrates domain logic and coordinates with ports.

mod dry_run;
mod registry_service;

pub use dry_run::{dry_run, dry_run_request, dry_run_with, DryRunRequest, DryRunSide};
pub use registry_service::FilterRegistryService;
