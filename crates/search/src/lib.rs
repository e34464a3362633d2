//! Search for planstore
//!
//! - [`MatchQuery`]: field/value query and its request body
//! - [`SearchIndex`]: the contract a search service fulfils
//! - [`MemorySearchIndex`]: in-process index for embedding and tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod query;

pub use index::{MemorySearchIndex, SearchError, SearchIndex};
pub use query::MatchQuery;
