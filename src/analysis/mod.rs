//! Text analysis
//!
//! The query compiler only depends on the [`Analyzer`] trait, so the analyzer
//! used at query time can be swapped for whatever the search engine used
//! when it indexed the documents.

mod standard;

pub use standard::StandardAnalyzer;

use crate::Result;

/// Turns field text into the terms a search engine indexes
pub trait Analyzer: Send + Sync {
    /// Analyze `text` as it would be indexed in `field`
    fn analyze(&self, field: &str, text: &str) -> Result<Vec<String>>;
}
