//! Match queries
//!
//! A [`MatchQuery`] names one field and one value. Its wire form is the
//! match-query body search services accept:
//!
//! ```json
//! {"query":{"match":{"<key>":"<value>"}}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Field/value match query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuery {
    /// Field name, matched at any depth of the document
    pub key: String,
    /// Text to match
    pub value: String,
}

impl MatchQuery {
    /// Create a query
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Request body for a search service
    ///
    /// # Example
    ///
    /// ```
    /// use planstore_search::MatchQuery;
    ///
    /// let body = MatchQuery::new("_org", "example.com").to_query_body();
    /// assert_eq!(body.to_string(), r#"{"query":{"match":{"_org":"example.com"}}}"#);
    /// ```
    pub fn to_query_body(&self) -> Value {
        let mut matcher = serde_json::Map::new();
        matcher.insert(self.key.clone(), Value::String(self.value.clone()));
        json!({ "query": { "match": matcher } })
    }

    /// Lower-cased alphanumeric terms of the query value
    pub fn terms(&self) -> Vec<String> {
        tokenize(&self.value)
    }
}

/// Split text into lower-cased alphanumeric terms
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
