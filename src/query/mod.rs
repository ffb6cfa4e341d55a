//! Search request model and query compilation
//!
//! A client request becomes a [`SearchRequest`], is validated into a
//! [`QueryModel`] and compiled by the [`QueryCompiler`] into a [`QueryPlan`]
//! that any [`SearchExecutor`](crate::search::SearchExecutor) can run.
//!
//! ```json
//! {
//!   "fulltext": "garlic bread",
//!   "calories": [0, 500],
//!   "diet_threshold": { "vegetarian": 0.8 },
//!   "sort": "total_time",
//!   "max_results": 20
//! }
//! ```

pub mod ast;
pub mod compiler;
pub mod facets;
pub mod fields;
pub mod model;
pub mod nodes;
pub mod plan;
pub mod request;

pub use ast::Query;
pub use compiler::QueryCompiler;
pub use facets::{FacetConfig, FacetDimension};
pub use model::{DrillDown, QueryModel, QueryModelBuilder, RangeFilter, RangedSpec, SortOrder};
pub use nodes::{BoolQuery, DrillDownQuery, Occur, RangeBounds, RangeQuery, SimilarQuery, TermQuery};
pub use plan::{QueryPlan, SortField, SortSpec};
pub use request::SearchRequest;
