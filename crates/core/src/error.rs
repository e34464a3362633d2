//! Error taxonomy for the plan store
//!
//! Every operation returns [`Result<T>`]. Each [`Error`] variant carries a
//! frozen error code and the HTTP status a transport layer should answer with.
//!
//! ## Error Codes (Canonical)
//!
//! | Code | Status | Description |
//! |------|--------|-------------|
//! | NotFound | 404 | Key absent in the store |
//! | AlreadyExists | 409 | Create targeted an existing plan |
//! | IdentityConflict | 400 | Supplied objectId contradicts a stored relation |
//! | PreconditionFailed | 412 | If-Match token does not match |
//! | MissingObjectId | 400 | Document has an object without an identifier |
//! | InvalidDocument | 400 | Required field missing or empty |
//! | SerializationError | 500 | Malformed stored value or unencodable document |
//! | StoreUnavailable | 503 | Key-value store call failed |
//! | StoreUnavailable (PartialWrite) | 503 | Multi-key write stopped part-way; lists the applied keys |
//! | NotificationFailed | 500 | Change event could not be published |
//! | SearchError | 500 | Search index query failed |
//!
//! A matching If-None-Match token is not an error; see `Conditional` in the
//! concurrency crate.

use crate::types::ETag;
use thiserror::Error;

/// All plan store errors
#[derive(Debug, Error)]
pub enum Error {
    /// Key absent in the store (root or sub-object)
    #[error("not found: {key}")]
    NotFound {
        /// The key that was looked up
        key: String,
    },

    /// A plan already exists under this key
    #[error("already exists: {key}")]
    AlreadyExists {
        /// The occupied key
        key: String,
    },

    /// Supplied identifier contradicts the stored one
    #[error("objectId mismatch in {relation}: stored {stored}, supplied {supplied}")]
    IdentityConflict {
        /// Relationship being patched (`plan`, `planCostShares`)
        relation: &'static str,
        /// Identifier currently stored
        stored: String,
        /// Identifier supplied by the caller
        supplied: String,
    },

    /// If-Match token differs from the current fingerprint
    #[error("precondition failed: current version is {current}")]
    PreconditionFailed {
        /// Fingerprint of the current document
        current: ETag,
    },

    /// An object that must be persisted has no identifier
    #[error("missing objectId at {path}")]
    MissingObjectId {
        /// Location inside the document, e.g. `linkedPlanServices[1].linkedService`
        path: String,
    },

    /// Required field missing or empty
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Malformed stored value or unencodable input
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying key-value store failed
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A multi-key write stopped part-way; earlier keys stay applied
    #[error("store unavailable: write stopped at step {step} ('{key}') after {} applied: {reason}", .applied.len())]
    PartialWrite {
        /// Index of the failing key operation
        step: usize,
        /// Key of the failing operation
        key: String,
        /// Keys written or deleted before the failure, in order
        applied: Vec<String>,
        /// Store error that stopped the write
        reason: String,
    },

    /// Change notifier publish failed after the store was mutated
    #[error("notification failed: {0}")]
    NotificationFailed(String),

    /// Search index query failed
    #[error("search error: {0}")]
    Search(String),
}

/// Result type for plan store operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for [`Error::NotFound`]
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// Get the canonical error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NotFound",
            Error::AlreadyExists { .. } => "AlreadyExists",
            Error::IdentityConflict { .. } => "IdentityConflict",
            Error::PreconditionFailed { .. } => "PreconditionFailed",
            Error::MissingObjectId { .. } => "MissingObjectId",
            Error::InvalidDocument(_) => "InvalidDocument",
            Error::Serialization(_) => "SerializationError",
            Error::StoreUnavailable(_) | Error::PartialWrite { .. } => "StoreUnavailable",
            Error::NotificationFailed(_) => "NotificationFailed",
            Error::Search(_) => "SearchError",
        }
    }

    /// HTTP status a transport should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::AlreadyExists { .. } => 409,
            Error::IdentityConflict { .. }
            | Error::MissingObjectId { .. }
            | Error::InvalidDocument(_) => 400,
            Error::PreconditionFailed { .. } => 412,
            Error::StoreUnavailable(_) | Error::PartialWrite { .. } => 503,
            Error::Serialization(_) | Error::NotificationFailed(_) | Error::Search(_) => 500,
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this is a conflict the caller caused (identity or existence)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::AlreadyExists { .. } | Error::IdentityConflict { .. }
        )
    }

    /// Check if re-invoking the operation may succeed
    ///
    /// Every underlying write is an idempotent overwrite, so infrastructure
    /// failures in the middle of a cascade are safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable(_)
                | Error::PartialWrite { .. }
                | Error::NotificationFailed(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
