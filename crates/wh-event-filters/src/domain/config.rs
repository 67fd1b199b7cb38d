//! Filter engine configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use wh_event_filters::domain::FilterEngineConfig;
//!
//! let config = FilterEngineConfig::default()
//!     .with_max_depth(32)
//!     .with_wildcard_fallback(true);
//! config.validate()?;
//! ```

use std::env;

use serde::{Deserialize, Serialize};

use super::flatten::Flattener;
use crate::error::FilterError;

/// Event type under which a catch-all filter is stored.
pub const WILDCARD_EVENT_TYPE: &str = "*";

/// Default maximum document nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Upper bound accepted for `max_depth`.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// Filter engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEngineConfig {
    /// Maximum nesting depth accepted when flattening documents
    pub max_depth: usize,
    /// Event type that denotes a catch-all filter
    pub wildcard_event_type: String,
    /// Consult the catch-all filter when no exact event type filter exists
    pub fallback_to_wildcard: bool,
}

impl Default for FilterEngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            wildcard_event_type: WILDCARD_EVENT_TYPE.to_string(),
            fallback_to_wildcard: true,
        }
    }
}

impl FilterEngineConfig {
    /// Read overrides from the environment.
    ///
    /// - `WH_FILTER_MAX_DEPTH`: maximum nesting depth (default: 64)
    /// - `WH_FILTER_WILDCARD_FALLBACK`: consult `"*"` filters (default: true)
    pub fn from_env() -> Result<Self, FilterError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("WH_FILTER_MAX_DEPTH") {
            config.max_depth = raw.trim().parse().map_err(|_| {
                FilterError::InvalidConfig(format!("WH_FILTER_MAX_DEPTH is not a number: {raw}"))
            })?;
        }

        if let Ok(raw) = env::var("WH_FILTER_WILDCARD_FALLBACK") {
            config.fallback_to_wildcard = !matches!(
                raw.trim().to_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration bounds
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(FilterError::InvalidConfig(format!(
                "max_depth must be between 1 and {MAX_DEPTH_LIMIT}, got {}",
                self.max_depth
            )));
        }

        if self.wildcard_event_type.trim().is_empty() {
            return Err(FilterError::InvalidConfig(
                "wildcard_event_type cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder-style method to set the depth limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder-style method to toggle catch-all fallback
    pub fn with_wildcard_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_wildcard = enabled;
        self
    }

    /// Flattener honouring this configuration's depth limit
    pub fn flattener(&self) -> Flattener {
        Flattener::new(self.max_depth)
    }

    /// Whether `event_type` names the catch-all filter
    pub fn is_wildcard(&self, event_type: &str) -> bool {
        event_type == self.wildcard_event_type
    }
}
