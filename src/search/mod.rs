//! Query execution
//!
//! [`SearchExecutor`] is the seam to a search engine. [`MemoryIndex`] is a
//! complete in-memory implementation; [`Searcher`] ties compilation,
//! execution, pagination and record hydration together.

mod executor;
mod memory;
mod searcher;

pub use executor::{FacetData, SearchExecutor, SearchPage};
pub use memory::{FacetCollector, IndexedRecipe, MemoryIndex, DIET_LABEL_THRESHOLD, FILTER_CACHE_CAPACITY};
pub use searcher::{SearchResult, Searcher};
