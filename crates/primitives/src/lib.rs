//! Plan primitives for planstore
//!
//! This crate turns documents into store operations:
//! - [`decompose`]: plan <-> flat records keyed by `objectId`
//! - [`WriteBatch`]: ordered multi-key writes with partial-failure reporting
//! - [`ChangeNotifier`]: change events published after each mutation
//! - [`PlanStore`]: the stateless facade tying them to a [`KeyValueStore`]
//!
//! [`KeyValueStore`]: planstore_storage::KeyValueStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod decompose;
pub mod notify;
pub mod plan_store;

pub use batch::{BatchFailure, BatchOp, BatchReport, WriteBatch};
pub use decompose::{cascade_keys, decompose, reassemble, Record};
pub use notify::{
    ChangeEvent, ChangeNotifier, ChannelNotifier, NoopNotifier, NotifyError, Operation,
    RecordingNotifier,
};
pub use plan_store::{PlanStore, DEFAULT_RECORD_TTL};
