//! Content fingerprints
//!
//! A fingerprint is the SHA-256 digest of a document's canonical serialized
//! form, rendered as lower-case hex. The canonical form is the `serde_json`
//! encoding: struct fields serialize in declaration order and join metadata
//! maps serialize with sorted keys, so equal documents always encode to equal
//! bytes. Nothing time- or randomness-dependent enters the hash.

use planstore_core::{ETag, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Fingerprint a document
///
/// # Errors
///
/// `Serialization` if the document cannot be encoded.
///
/// # Examples
///
/// ```
/// use planstore_concurrency::fingerprint;
/// use serde_json::json;
///
/// let a = fingerprint(&json!({"objectId": "p1"})).unwrap();
/// let b = fingerprint(&json!({"objectId": "p1"})).unwrap();
/// let c = fingerprint(&json!({"objectId": "p2"})).unwrap();
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
pub fn fingerprint<T: Serialize + ?Sized>(doc: &T) -> Result<ETag> {
    let bytes = serde_json::to_vec(doc)?;
    Ok(fingerprint_bytes(&bytes))
}

/// Fingerprint an already serialized document
pub fn fingerprint_bytes(bytes: &[u8]) -> ETag {
    ETag::new(format!("{:x}", Sha256::digest(bytes)))
}
