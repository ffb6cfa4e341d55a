//! Similarity query - "more like this" against a field

use serde::{Deserialize, Serialize};

/// Query that matches documents sharing terms with a probe text
///
/// `terms` are the analyzed, deduplicated terms of the probe. The original
/// text is kept for executors that want to run their own analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarQuery {
    pub field: String,
    pub text: String,
    pub terms: Vec<String>,
}

impl SimilarQuery {
    pub fn new(field: impl Into<String>, text: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
            terms,
        }
    }
}
