//! Boundary between query plans and the engine that runs them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::query::{Query, SortSpec};
use crate::store::RecipeId;
use crate::Result;

/// Label counts of one facet dimension
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetData {
    pub dimension: String,
    pub children: BTreeMap<String, u64>,
}

/// Ordered window of hits, plus whatever the engine needs to count facets
#[derive(Debug)]
pub struct SearchPage<C> {
    pub ids: Vec<RecipeId>,
    pub collector: Option<C>,
}

/// Search engine able to evaluate compiled queries
pub trait SearchExecutor: Send + Sync {
    /// Engine-specific state gathered during a search for facet counting
    type Collector;

    /// Number of documents matching `query`
    fn count(&self, query: &Query) -> Result<u64>;

    /// The first `window` hits of `query` in `sort` order
    fn search(
        &self,
        query: &Query,
        window: usize,
        sort: &SortSpec,
        collect_facets: bool,
    ) -> Result<SearchPage<Self::Collector>>;

    /// Label counts for at most `max_dims` dimensions
    fn compute_facets(
        &self,
        collector: &Self::Collector,
        max_dims: usize,
    ) -> Result<BTreeMap<String, FacetData>>;
}
