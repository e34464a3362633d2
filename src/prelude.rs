//! Convenient imports for planstore.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```
//! use planstore::prelude::*;
//!
//! let service = PlanService::in_memory();
//! assert!(service.list_plans().unwrap().is_empty());
//! ```

// Main entry point
pub use crate::service::{PlanService, PlanStoreBuilder};

// Configuration
pub use crate::config::{ConfigError, PlanStoreConfig};

// Error handling
pub use crate::{Error, Result};

// Core types
pub use crate::types::{
    Conditional, CostShares, ETag, LinkedPlanService, LinkedService, MatchQuery, Plan,
    Preconditions, StoredObject, UpsertOutcome, Versioned,
};

// Re-export serde_json for convenience
pub use serde_json::json;
