//! Term query - exact match of one analyzed term in a field

use serde::{Deserialize, Serialize};

/// Query that matches documents containing an exact term in a field
///
/// The term is expected to be analyzed already; executors look it up in
/// their postings as is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    /// Field to search in
    pub field: String,
    /// Exact term to match
    pub term: String,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Key under which executors may cache the postings of this term
    pub fn cache_key(&self) -> String {
        format!("term:{}:{}", self.field, self.term)
    }
}
