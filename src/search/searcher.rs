use serde::Serialize;
use std::collections::BTreeMap;

use tracing::debug;

use super::executor::{FacetData, SearchExecutor};
use crate::config::QueryLimits;
use crate::query::{QueryCompiler, QueryModel, SearchRequest};
use crate::store::{RecipeId, RecipeView, StoreReader};
use crate::Result;

/// One page of search results
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub total_hits: u64,
    pub recipe_ids: Vec<RecipeId>,
    pub facets: BTreeMap<String, FacetData>,
}

/// Compiles queries and runs them on an executor
pub struct Searcher<E: SearchExecutor> {
    compiler: QueryCompiler,
    executor: E,
    limits: QueryLimits,
}

impl<E: SearchExecutor> Searcher<E> {
    pub fn new(compiler: QueryCompiler, executor: E) -> Self {
        Self {
            compiler,
            executor,
            limits: QueryLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn search(&self, model: &QueryModel) -> Result<SearchResult> {
        let plan = self.compiler.compile(model)?;
        let total_hits = self.executor.count(&plan.root)?;

        let window = model.offset() + model.max_results();
        let page = self
            .executor
            .search(&plan.root, window, &plan.sort, model.max_facets() > 0)?;

        let recipe_ids: Vec<RecipeId> = page.ids.into_iter().skip(model.offset()).collect();

        let facets = match page.collector {
            Some(collector) if model.max_facets() > 0 => self
                .executor
                .compute_facets(&collector, model.max_facets())?,
            _ => BTreeMap::new(),
        };

        debug!(
            total_hits,
            returned = recipe_ids.len(),
            facets = facets.len(),
            "Search completed"
        );

        Ok(SearchResult {
            total_hits,
            recipe_ids,
            facets,
        })
    }

    /// Validate a raw request against this searcher's facets and limits, then run it
    pub fn search_request(&self, request: SearchRequest) -> Result<SearchResult> {
        let model = request.into_model(self.compiler.facets(), &self.limits)?;
        self.search(&model)
    }

    /// Recipes resembling `text`
    pub fn find_similar(&self, text: &str, max_results: usize) -> Result<SearchResult> {
        let model = QueryModel::builder()
            .similarity(text)
            .max_results(max_results as i64)
            .build_with(self.compiler.facets(), &self.limits)?;
        self.search(&model)
    }

    /// Resolve result ids to stored records, in result order; ids missing
    /// from the store are skipped
    pub fn hydrate<'a>(&self, result: &SearchResult, store: &'a StoreReader) -> Result<Vec<RecipeView<'a>>> {
        store.find_all_by_id(result.recipe_ids.iter().copied())
    }
}
