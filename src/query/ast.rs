//! Engine-neutral query tree
//!
//! A [`Query`] is plain data. It says what to match, never how; executors in
//! [`crate::search`] decide how to evaluate it.

use serde::{Deserialize, Serialize};

use super::nodes::{BoolQuery, DrillDownQuery, RangeQuery, SimilarQuery, TermQuery};

/// Node of a compiled query tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Matches every document
    MatchAll,
    /// Matches no document
    MatchNone,
    Term(TermQuery),
    Range(RangeQuery),
    Bool(BoolQuery),
    DrillDown(DrillDownQuery),
    Similar(SimilarQuery),
}

impl Query {
    /// Query type name for debugging and logging
    pub fn query_type(&self) -> &'static str {
        match self {
            Query::MatchAll => "match_all",
            Query::MatchNone => "match_none",
            Query::Term(_) => "term",
            Query::Range(_) => "range",
            Query::Bool(_) => "bool",
            Query::DrillDown(_) => "drill_down",
            Query::Similar(_) => "similar",
        }
    }

    /// Whether this query contributes to relevance scores
    ///
    /// Ranges and drill-downs only filter.
    pub fn is_scoring(&self) -> bool {
        match self {
            Query::Term(_) | Query::Similar(_) => true,
            Query::Bool(b) => b.must.iter().chain(&b.should).any(Query::is_scoring),
            Query::DrillDown(d) => d.base().map(Query::is_scoring).unwrap_or(false),
            Query::MatchAll | Query::MatchNone | Query::Range(_) => false,
        }
    }
}

impl From<TermQuery> for Query {
    fn from(q: TermQuery) -> Self {
        Query::Term(q)
    }
}

impl From<RangeQuery> for Query {
    fn from(q: RangeQuery) -> Self {
        Query::Range(q)
    }
}

impl From<BoolQuery> for Query {
    fn from(q: BoolQuery) -> Self {
        Query::Bool(q)
    }
}

impl From<DrillDownQuery> for Query {
    fn from(q: DrillDownQuery) -> Self {
        Query::DrillDown(q)
    }
}

impl From<SimilarQuery> for Query {
    fn from(q: SimilarQuery) -> Self {
        Query::Similar(q)
    }
}
