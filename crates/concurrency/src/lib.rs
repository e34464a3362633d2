//! Optimistic concurrency for planstore
//!
//! Version tokens are content fingerprints; there is no version counter and no
//! lock. A caller learns the token of what it read and sends it back as a
//! precondition on the next write:
//!
//! ```text
//! read  -> ETag T
//! write (If-Match: T)       -> proceeds only while content still hashes to T
//! read  (If-None-Match: T)  -> NotModified while content still hashes to T
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fingerprint;
pub mod precondition;

pub use fingerprint::{fingerprint, fingerprint_bytes};
pub use precondition::{Conditional, Evaluation, Preconditions, TokenMatch};
