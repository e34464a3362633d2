//! Conditional-request preconditions
//!
//! Maps `If-Match` / `If-None-Match` request headers onto the current
//! fingerprint of a document:
//!
//! | Header | Token vs current | Outcome |
//! |--------|------------------|---------|
//! | If-None-Match | equal | [`Evaluation::NotModified`], no mutation |
//! | If-Match | different | `PreconditionFailed`, no mutation |
//! | absent | - | [`Evaluation::Proceed`] |
//!
//! If-None-Match is evaluated first. `*` matches any existing document.
//! Tokens are compared after trimming whitespace, dropping a `W/` weak prefix
//! and surrounding double quotes, so both `abc` and `"abc"` match `abc`.
//!
//! These checks are the caller-facing defence against lost updates. The store
//! takes no locks: two writers that evaluate against the same fingerprint can
//! both proceed.

use crate::fingerprint::fingerprint;
use planstore_core::{ETag, Error, Result};
use serde::Serialize;
use tracing::debug;

/// Tokens named by one conditional header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMatch {
    /// `*`: any current version
    Any,
    /// One or more explicit tokens
    Tags(Vec<ETag>),
}

impl TokenMatch {
    /// Parse a header value
    ///
    /// Returns `None` for an absent or blank header, which imposes no
    /// precondition.
    ///
    /// # Examples
    ///
    /// ```
    /// use planstore_concurrency::TokenMatch;
    /// use planstore_core::ETag;
    ///
    /// assert_eq!(TokenMatch::parse("  "), None);
    /// assert_eq!(TokenMatch::parse("*"), Some(TokenMatch::Any));
    /// assert_eq!(
    ///     TokenMatch::parse(r#"W/"abc", def"#),
    ///     Some(TokenMatch::Tags(vec![ETag::new("abc"), ETag::new("def")]))
    /// );
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        if header.is_empty() {
            return None;
        }
        if header == "*" {
            return Some(TokenMatch::Any);
        }

        let tags: Vec<ETag> = header
            .split(',')
            .map(normalize_token)
            .filter(|token| !token.is_empty())
            .map(ETag::new)
            .collect();

        if tags.is_empty() {
            None
        } else {
            Some(TokenMatch::Tags(tags))
        }
    }

    /// Whether this header names the current version
    pub fn matches(&self, current: &ETag) -> bool {
        match self {
            TokenMatch::Any => true,
            TokenMatch::Tags(tags) => tags.iter().any(|tag| tag == current),
        }
    }
}

fn normalize_token(raw: &str) -> &str {
    let token = raw.trim();
    let token = token.strip_prefix("W/").unwrap_or(token);
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}

/// Result of evaluating preconditions that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Perform the operation
    Proceed,
    /// If-None-Match matched: skip the operation and report "unchanged"
    NotModified,
}

/// Outcome of a conditional operation
#[derive(Debug, Clone, PartialEq)]
pub enum Conditional<T> {
    /// The operation ran
    Applied(T),
    /// The operation was skipped because the caller already holds this version
    NotModified(ETag),
}

impl<T> Conditional<T> {
    /// Whether the operation ran
    pub fn is_applied(&self) -> bool {
        matches!(self, Conditional::Applied(_))
    }

    /// The applied value, if the operation ran
    pub fn applied(self) -> Option<T> {
        match self {
            Conditional::Applied(value) => Some(value),
            Conditional::NotModified(_) => None,
        }
    }

    /// Map the applied value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Conditional<U> {
        match self {
            Conditional::Applied(value) => Conditional::Applied(f(value)),
            Conditional::NotModified(etag) => Conditional::NotModified(etag),
        }
    }
}

/// Caller-supplied preconditions for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preconditions {
    /// Parsed `If-Match` header
    pub if_match: Option<TokenMatch>,
    /// Parsed `If-None-Match` header
    pub if_none_match: Option<TokenMatch>,
}

impl Preconditions {
    /// No preconditions
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from raw header values
    pub fn from_headers(if_match: Option<&str>, if_none_match: Option<&str>) -> Self {
        Self {
            if_match: if_match.and_then(TokenMatch::parse),
            if_none_match: if_none_match.and_then(TokenMatch::parse),
        }
    }

    /// Require the current version to be `etag`
    pub fn if_match(mut self, etag: ETag) -> Self {
        self.if_match = Some(TokenMatch::Tags(vec![etag]));
        self
    }

    /// Skip the operation if the current version is `etag`
    pub fn if_none_match(mut self, etag: ETag) -> Self {
        self.if_none_match = Some(TokenMatch::Tags(vec![etag]));
        self
    }

    /// Check if no precondition is imposed
    pub fn is_empty(&self) -> bool {
        self.if_match.is_none() && self.if_none_match.is_none()
    }

    /// Evaluate against the current fingerprint
    ///
    /// # Returns
    ///
    /// * `Ok(Proceed)` - no precondition blocks the operation
    /// * `Ok(NotModified)` - If-None-Match names the current version
    /// * `Err(PreconditionFailed)` - If-Match does not name the current version
    pub fn evaluate(&self, current: &ETag) -> Result<Evaluation> {
        if let Some(if_none_match) = &self.if_none_match {
            if if_none_match.matches(current) {
                debug!(etag = %current, "If-None-Match matched, not modified");
                return Ok(Evaluation::NotModified);
            }
        }

        if let Some(if_match) = &self.if_match {
            if !if_match.matches(current) {
                debug!(etag = %current, "If-Match did not match");
                return Err(Error::PreconditionFailed {
                    current: current.clone(),
                });
            }
        }

        Ok(Evaluation::Proceed)
    }

    /// Fingerprint `current` and evaluate against it
    ///
    /// Returns the fingerprint alongside the evaluation so callers can echo it.
    pub fn check<T: Serialize + ?Sized>(&self, current: &T) -> Result<(ETag, Evaluation)> {
        let etag = fingerprint(current)?;
        let evaluation = self.evaluate(&etag)?;
        Ok((etag, evaluation))
    }
}
