//! Key-value store contract
//!
//! The plan store treats its storage engine as an opaque service with four
//! operations over a single flat namespace of string keys and string values.
//! Any engine offering per-key atomic get/set/delete and pattern listing can
//! back the plan store by implementing [`KeyValueStore`].

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the call
    #[error("{op} failed for '{key}': {reason}")]
    Unavailable {
        /// Operation that failed (`get`, `set`, `delete`, `keys`)
        op: &'static str,
        /// Key or pattern involved
        key: String,
        /// Backend-specific reason
        reason: String,
    },
}

/// Result type for key-value store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Shorthand for [`StoreError::Unavailable`]
    pub fn unavailable(op: &'static str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Unavailable {
            op,
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for planstore_core::Error {
    fn from(e: StoreError) -> Self {
        planstore_core::Error::StoreUnavailable(e.to_string())
    }
}

/// Flat key-value store consumed by the plan store
///
/// ## Contract
///
/// - Each call is atomic for its single key; there are no multi-key transactions
/// - `set` overwrites unconditionally; re-setting identical content is a no-op in effect
/// - An expired key is indistinguishable from an absent one
/// - Calls complete or fail; implementations must not block indefinitely
///
/// ## Thread Safety
///
/// Implementations are `Send + Sync` and are shared across request workers
/// through an `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    ///
    /// Returns `Ok(None)` when the key is absent or expired.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one
    ///
    /// `ttl` of `None` keeps the value until deleted.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()>;

    /// Delete a key
    ///
    /// Returns the number of keys removed (0 or 1).
    fn delete(&self, key: &str) -> StoreResult<u64>;

    /// List live keys matching a glob pattern
    ///
    /// Pattern syntax: `*`, `?`, `[a-z]`, `[!a]` for negation and `[*]` to
    /// match a metacharacter literally. A malformed pattern is an error.
    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
