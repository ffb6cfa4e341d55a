pub mod analysis;
pub mod config;
pub mod error;
pub mod query;
pub mod search;
pub mod store;

pub use analysis::{Analyzer, StandardAnalyzer};
pub use config::{AnalyzerConfig, LarderSettings, QueryLimits, StoreConfig};
pub use error::{LarderError, Result, ValidationErrors};
pub use query::{FacetConfig, QueryCompiler, QueryModel, QueryPlan, SearchRequest};
pub use search::{MemoryIndex, SearchExecutor, SearchResult, Searcher};
pub use store::{OpenMode, RecipeMetadata, RecipeRecord, RecipeView, StoreReader, StoreWriter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
