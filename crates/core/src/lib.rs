//! Core types for planstore
//!
//! This crate defines the fundamental types shared by every layer:
//! - [`Plan`] and its embedded entities ([`CostShares`], [`LinkedService`],
//!   [`LinkedPlanService`])
//! - [`StoredObject`]: a record decoded by its `objectType` tag
//! - [`ObjectKind`] and [`ETag`]
//! - [`Error`] / [`Result`]: the canonical error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod model;
pub mod types;

pub use error::{Error, Result};
pub use model::{
    CostShares, LinkedPlanService, LinkedService, Plan, PlanCostShares, PlanJoin,
    PlanServiceCostShares, StoredObject,
};
pub use types::{ETag, ObjectKind};
