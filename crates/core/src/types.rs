//! Core types shared across the plan store
//!
//! This module defines the small value types used throughout the system:
//! - [`ObjectKind`]: The `objectType` discriminator stored on every record
//! - [`ETag`]: Opaque version token derived from document content

use serde::{Deserialize, Serialize};

/// Kind of a stored record, selected by its `objectType` field
///
/// Every record in the flat namespace carries an `objectType` tag. Reads use
/// it to decide which shape to decode. The tags are the wire values used by
/// clients and must not change.
///
/// | Kind | Tag |
/// |------|-----|
/// | Plan | `plan` |
/// | PlanCostShares | `membercostshare` |
/// | LinkedService | `service` |
/// | LinkedPlanService | `planservice` |
/// | PlanServiceCostShares | `PlanServiceCostShares` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Root plan document
    Plan,
    /// Cost shares attached to a plan (or to a plan service)
    PlanCostShares,
    /// Service referenced by a linked plan service
    LinkedService,
    /// Service entry of a plan, owning a service and its cost shares
    LinkedPlanService,
    /// Cost shares tagged explicitly as belonging to a plan service
    PlanServiceCostShares,
}

impl ObjectKind {
    /// Canonical `objectType` tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Plan => "plan",
            ObjectKind::PlanCostShares => "membercostshare",
            ObjectKind::LinkedService => "service",
            ObjectKind::LinkedPlanService => "planservice",
            ObjectKind::PlanServiceCostShares => "PlanServiceCostShares",
        }
    }

    /// Resolve a stored `objectType` tag
    ///
    /// Unknown or empty tags resolve to [`ObjectKind::Plan`]: any record that
    /// is not a recognised sub-object is read as a root document.
    ///
    /// # Examples
    ///
    /// ```
    /// use planstore_core::ObjectKind;
    ///
    /// assert_eq!(ObjectKind::from_tag("service"), ObjectKind::LinkedService);
    /// assert_eq!(ObjectKind::from_tag("plan"), ObjectKind::Plan);
    /// assert_eq!(ObjectKind::from_tag("anything-else"), ObjectKind::Plan);
    /// ```
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "membercostshare" => ObjectKind::PlanCostShares,
            "service" => ObjectKind::LinkedService,
            "planservice" => ObjectKind::LinkedPlanService,
            "PlanServiceCostShares" => ObjectKind::PlanServiceCostShares,
            _ => ObjectKind::Plan,
        }
    }

    /// Human readable name, used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Plan => "Plan",
            ObjectKind::PlanCostShares => "PlanCostShares",
            ObjectKind::LinkedService => "LinkedService",
            ObjectKind::LinkedPlanService => "LinkedPlanService",
            ObjectKind::PlanServiceCostShares => "PlanServiceCostShares",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque version token for a document
///
/// An ETag is a pure function of document content: identical content always
/// yields an identical token. Callers should treat the inner string as opaque
/// and only compare tokens for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ETag(String);

impl ETag {
    /// Wrap an already computed token
    pub fn new(token: impl Into<String>) -> Self {
        ETag(token.into())
    }

    /// Token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner token
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
