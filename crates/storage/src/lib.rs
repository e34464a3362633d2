//! Storage layer for planstore
//!
//! This crate implements the key-value side of the plan store:
//! - [`KeyValueStore`]: the flat get/set/delete/keys contract every backend honours
//! - [`MemoryStore`]: sharded in-process backend with per-key TTL

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod memory;

pub use backend::{KeyValueStore, StoreError, StoreResult};
pub use memory::MemoryStore;
