//! Search index contract and in-memory index

use crate::query::{tokenize, MatchQuery};
use parking_lot::RwLock;
use planstore_core::Plan;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a search index
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query cannot be run
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// A document could not be encoded for indexing
    #[error("failed to encode document: {0}")]
    Encode(String),
    /// The search service could not be reached
    #[error("search backend unavailable: {0}")]
    Unavailable(String),
}

impl From<SearchError> for planstore_core::Error {
    fn from(e: SearchError) -> Self {
        planstore_core::Error::Search(e.to_string())
    }
}

/// A search service holding indexed plan documents
///
/// Keeping the index fresh is the job of whatever consumes change events;
/// the plan store only queries it.
pub trait SearchIndex: Send + Sync {
    /// Add or replace a document
    fn index(&self, id: &str, doc: Value) -> Result<(), SearchError>;

    /// Remove a document, returning whether it was present
    fn remove(&self, id: &str) -> Result<bool, SearchError>;

    /// Run a match query
    fn search(&self, query: &MatchQuery) -> Result<Vec<Value>, SearchError>;

    /// Index a plan under its `objectId`
    fn index_plan(&self, plan: &Plan) -> Result<(), SearchError> {
        let doc = serde_json::to_value(plan).map_err(|e| SearchError::Encode(e.to_string()))?;
        self.index(&plan.object_id, doc)
    }
}

/// In-process search index
///
/// A document matches when some field named `query.key`, at any depth,
/// holds a value sharing at least one term with `query.value`. Terms are
/// lower-cased alphanumeric runs. Hits come back in document-id order;
/// there is no scoring.
#[derive(Debug)]
pub struct MemorySearchIndex {
    name: String,
    docs: RwLock<BTreeMap<String, Value>>,
}

impl Default for MemorySearchIndex {
    fn default() -> Self {
        Self::new("plans")
    }
}

impl MemorySearchIndex {
    /// Create an empty index
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl SearchIndex for MemorySearchIndex {
    fn index(&self, id: &str, doc: Value) -> Result<(), SearchError> {
        self.docs.write().insert(id.to_string(), doc);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool, SearchError> {
        Ok(self.docs.write().remove(id).is_some())
    }

    fn search(&self, query: &MatchQuery) -> Result<Vec<Value>, SearchError> {
        if query.key.is_empty() {
            return Err(SearchError::InvalidQuery("empty field name".into()));
        }
        let terms = query.terms();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.docs.read();
        let hits: Vec<Value> = docs
            .values()
            .filter(|doc| field_matches(doc, &query.key, &terms))
            .cloned()
            .collect();

        debug!(index = %self.name, key = %query.key, hits = hits.len(), "match query");
        Ok(hits)
    }
}

fn field_matches(value: &Value, key: &str, terms: &[String]) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(k, v)| {
            (k == key && value_matches(v, terms)) || field_matches(v, key, terms)
        }),
        Value::Array(items) => items.iter().any(|v| field_matches(v, key, terms)),
        _ => false,
    }
}

fn value_matches(value: &Value, terms: &[String]) -> bool {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => return items.iter().any(|v| value_matches(v, terms)),
        Value::Null | Value::Object(_) => return false,
    };
    tokenize(&text).iter().any(|t| terms.contains(t))
}
