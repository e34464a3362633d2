//! Public types for the planstore API.
//!
//! Re-exports the document model from internal crates and adds the
//! fingerprinted wrapper returned by [`PlanService`](crate::PlanService).

use planstore_concurrency::fingerprint;
use serde::Serialize;

// Document model
pub use planstore_core::{
    CostShares, LinkedPlanService, LinkedService, Plan, PlanCostShares, PlanJoin,
    PlanServiceCostShares, StoredObject,
};

// Identity and version tokens
pub use planstore_core::{ETag, ObjectKind};

// Conditional requests
pub use planstore_concurrency::{Conditional, Preconditions, TokenMatch};

// Change events
pub use planstore_primitives::{ChangeEvent, Operation};

// Search
pub use planstore_search::MatchQuery;

/// A value together with its content fingerprint
///
/// The `etag` is what a transport sends as the `ETag` header and what callers
/// hand back in `If-Match` / `If-None-Match`.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// The value
    pub value: T,
    /// Fingerprint of `value`
    pub etag: ETag,
}

impl<T: Serialize> Versioned<T> {
    /// Fingerprint `value` and wrap it
    pub fn new(value: T) -> planstore_core::Result<Self> {
        let etag = fingerprint(&value)?;
        Ok(Self { value, etag })
    }
}

impl<T> Versioned<T> {
    /// Unwrap the value
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Result of a full replace (PUT)
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// No plan existed; it was created
    Created(Versioned<Plan>),
    /// An existing plan was replaced
    Replaced(Versioned<Plan>),
}

impl UpsertOutcome {
    /// Whether the plan was newly created
    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }

    /// Fingerprint of the stored plan
    pub fn etag(&self) -> &ETag {
        match self {
            UpsertOutcome::Created(v) | UpsertOutcome::Replaced(v) => &v.etag,
        }
    }

    /// The stored plan with its fingerprint
    pub fn into_inner(self) -> Versioned<Plan> {
        match self {
            UpsertOutcome::Created(v) | UpsertOutcome::Replaced(v) => v,
        }
    }
}
