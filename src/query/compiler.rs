//! Translates validated query models into query plans
//!
//! Compilation is total: a valid [`QueryModel`] always yields a plan unless
//! the analyzer itself fails. The compiler holds no mutable state and can be
//! shared between threads.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::ast::Query;
use super::facets::FacetConfig;
use super::fields;
use super::model::{QueryModel, RangeFilter, RangedSpec};
use super::nodes::{BoolQuery, DrillDownQuery, Occur, RangeQuery, SimilarQuery, TermQuery};
use super::plan::{QueryPlan, SortSpec};
use crate::analysis::Analyzer;
use crate::error::LarderError;
use crate::Result;

/// Compiles [`QueryModel`]s into [`QueryPlan`]s
#[derive(Clone)]
pub struct QueryCompiler {
    analyzer: Arc<dyn Analyzer>,
    facets: FacetConfig,
}

impl QueryCompiler {
    pub fn new(analyzer: Arc<dyn Analyzer>, facets: FacetConfig) -> Self {
        Self { analyzer, facets }
    }

    pub fn facets(&self) -> &FacetConfig {
        &self.facets
    }

    pub fn compile(&self, model: &QueryModel) -> Result<QueryPlan> {
        let mut root = BoolQuery::new();

        // Required text with no searchable tokens matches nothing.
        if let Some(text) = model.fulltext() {
            let tokens = self.analyze_unique(fields::FULLTEXT, text)?;
            if tokens.is_empty() {
                root.add(Occur::Must, Query::MatchNone);
            }
            for token in tokens {
                root.add(Occur::Must, TermQuery::new(fields::FULLTEXT, token));
            }
        }

        for ingredient in model.with_ingredients() {
            let clause = self.ingredient_clause(ingredient)?;
            root.add(Occur::Must, clause.unwrap_or(Query::MatchNone));
        }
        for ingredient in model.without_ingredients() {
            if let Some(clause) = self.ingredient_clause(ingredient)? {
                root.add(Occur::MustNot, clause);
            }
        }

        if let Some(text) = model.similarity() {
            let terms = self.analyze_unique(fields::FULL_RECIPE, text)?;
            root.add(
                Occur::Must,
                SimilarQuery::new(fields::FULL_RECIPE, text, terms),
            );
        }

        for (filter, spec) in model.ranges() {
            root.add(Occur::Must, range_clause(filter, spec));
        }

        for (diet, threshold) in model.diet_thresholds() {
            root.add(
                Occur::Must,
                RangeQuery::float(fields::diet_field(diet), *threshold, f32::MAX),
            );
        }

        debug!(
            clauses = root.clause_count(),
            drill_downs = model.drill_downs().len(),
            "Compiled query model"
        );

        let root = if model.drill_downs().is_empty() {
            if root.is_empty() {
                Query::MatchAll
            } else {
                Query::Bool(root)
            }
        } else {
            let base = if root.is_empty() {
                None
            } else {
                Some(Query::Bool(root))
            };
            let mut drill = DrillDownQuery::new(base);
            for dd in model.drill_downs() {
                if !self.facets.is_known(dd.dimension(), dd.label()) {
                    return Err(LarderError::Compilation(format!(
                        "Unknown drill-down {}/{}",
                        dd.dimension(),
                        dd.label()
                    )));
                }
                drill.add(dd.dimension(), dd.label());
            }
            Query::DrillDown(drill)
        };

        Ok(QueryPlan::new(root, SortSpec::for_order(model.sort())))
    }

    /// One clause per ingredient term: a single term, or a MUST bool over
    /// all of its tokens
    fn ingredient_clause(&self, ingredient: &str) -> Result<Option<Query>> {
        let mut tokens = self.analyze_unique(fields::INGREDIENTS, ingredient)?;
        let clause = match tokens.len() {
            0 => None,
            1 => tokens
                .pop()
                .map(|token| Query::from(TermQuery::new(fields::INGREDIENTS, token))),
            _ => {
                let mut nested = BoolQuery::new();
                for token in tokens {
                    nested.add(Occur::Must, TermQuery::new(fields::INGREDIENTS, token));
                }
                Some(Query::Bool(nested))
            }
        };
        Ok(clause)
    }

    /// Analyzed tokens in first-seen order, without repeats
    fn analyze_unique(&self, field: &str, text: &str) -> Result<Vec<String>> {
        let tokens = self.analyzer.analyze(field, text)?;
        let mut seen = HashSet::with_capacity(tokens.len());
        Ok(tokens
            .into_iter()
            .filter(|token| seen.insert(token.clone()))
            .collect())
    }
}

fn range_clause(filter: RangeFilter, spec: RangedSpec) -> RangeQuery {
    if filter.is_float() {
        RangeQuery::float(filter.field(), spec.start() as f32, spec.end() as f32)
    } else {
        RangeQuery::int(filter.field(), spec.start(), spec.end())
    }
}
