//! # Planstore
//!
//! Normalized storage for hierarchical plan documents.
//!
//! A plan is stored as a root record holding the whole document plus one
//! record per embedded object, every record keyed by its own `objectId`.
//! Clients read and write through [`PlanService`], which speaks
//! content-fingerprint ETags and `If-Match` / `If-None-Match` preconditions.
//!
//! ## Quick Start
//!
//! ```
//! use planstore::prelude::*;
//!
//! let service = PlanService::in_memory();
//!
//! let plan: Plan = serde_json::from_value(json!({
//!     "planCostShares": {"deductible": 2000, "_org": "example.com", "copay": 23,
//!                        "objectId": "cs1", "objectType": "membercostshare"},
//!     "linkedPlanServices": [{
//!         "linkedService": {"_org": "example.com", "objectId": "svc1",
//!                           "objectType": "service", "name": "Yearly physical"},
//!         "planserviceCostShares": {"deductible": 10, "_org": "example.com", "copay": 0,
//!                                   "objectId": "cs2", "objectType": "membercostshare"},
//!         "_org": "example.com",
//!         "objectId": "lps1",
//!         "objectType": "planservice"
//!     }],
//!     "_org": "example.com",
//!     "objectId": "plan1",
//!     "objectType": "plan",
//!     "creationDate": "12-12-2017"
//! })).unwrap();
//!
//! let created = service.create_plan(&plan).unwrap();
//!
//! // Every embedded object is addressable on its own
//! let service_record = service
//!     .get_object("svc1", &Preconditions::none())
//!     .unwrap()
//!     .applied()
//!     .unwrap();
//! assert_eq!(service_record.value.object_id(), "svc1");
//!
//! // Writes guarded by a stale token are rejected
//! let stale = Preconditions::none().if_match(ETag::new("stale"));
//! assert!(service.delete_plan("plan1", &stale).is_err());
//!
//! // The current token lets the write through
//! let current = Preconditions::none().if_match(created.etag);
//! assert!(service.delete_plan("plan1", &current).unwrap().is_applied());
//! ```
//!
//! ## Crates
//!
//! - `planstore-core` - document model, ids, error taxonomy
//! - `planstore-storage` - key-value contract and in-memory backend
//! - `planstore-concurrency` - fingerprints and preconditions
//! - `planstore-primitives` - decomposition, cascading writes, change events
//! - `planstore-search` - match queries and the search index contract

#![warn(missing_docs)]

mod config;
mod service;
mod types;

pub mod prelude;

// Re-export main entry points
pub use config::{ConfigError, PlanStoreConfig};
pub use service::{PlanService, PlanStoreBuilder};

// Error handling
pub use planstore_core::{Error, Result};

// Re-export types
pub use types::*;

// Collaborator contracts and bundled implementations
pub use planstore_primitives::{
    ChangeNotifier, ChannelNotifier, NoopNotifier, NotifyError, PlanStore, RecordingNotifier,
};
pub use planstore_search::{MemorySearchIndex, SearchError, SearchIndex};
pub use planstore_storage::{KeyValueStore, MemoryStore, StoreError, StoreResult};
