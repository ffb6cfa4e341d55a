//! Concrete query node types

mod bool_query;
mod drill_down;
mod range_query;
mod similar_query;
mod term_query;

pub use bool_query::{BoolQuery, Occur};
pub use drill_down::DrillDownQuery;
pub use range_query::{RangeBounds, RangeQuery};
pub use similar_query::SimilarQuery;
pub use term_query::TermQuery;
