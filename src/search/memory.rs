//! In-memory search executor over roaring bitmaps
//!
//! Every indexed recipe gets a dense document number. Postings, facet
//! labels and range results are bitmaps of document numbers; numeric values
//! are kept per field for range filters and sorting.

use parking_lot::RwLock;
use roaring::RoaringBitmap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use super::executor::{FacetData, SearchExecutor, SearchPage};
use crate::analysis::Analyzer;
use crate::error::LarderError;
use crate::query::{fields, BoolQuery, DrillDownQuery, FacetConfig, Query, RangeQuery, SortField, SortSpec};
use crate::store::{RecipeId, RecipeMetadata};
use crate::Result;

/// Diet score at which a recipe gets the diet facet label
pub const DIET_LABEL_THRESHOLD: f32 = 1.0;

/// Default number of range filters kept in the cache
pub const FILTER_CACHE_CAPACITY: usize = 256;

/// Document as handed to [`MemoryIndex::add`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedRecipe {
    pub recipe_id: RecipeId,
    /// Field name to raw text, analyzed on insert
    pub text: BTreeMap<String, String>,
    pub values: BTreeMap<String, f64>,
    pub diets: BTreeMap<String, f32>,
    /// Facet labels set explicitly, on top of the derived ones
    pub labels: BTreeMap<String, BTreeSet<String>>,
}

impl IndexedRecipe {
    pub fn new(recipe_id: RecipeId) -> Self {
        Self {
            recipe_id,
            ..Default::default()
        }
    }

    /// Append `text` to a field
    pub fn with_text(mut self, field: &str, text: &str) -> Self {
        let entry = self.text.entry(field.to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(text);
        self
    }

    pub fn with_value(mut self, field: &str, value: f64) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    pub fn with_diet(mut self, diet: &str, score: f32) -> Self {
        self.diets.insert(diet.to_string(), score);
        self
    }

    pub fn with_label(mut self, dimension: &str, label: &str) -> Self {
        self.labels
            .entry(dimension.to_string())
            .or_default()
            .insert(label.to_string());
        self
    }

    /// Searchable document for a stored recipe
    pub fn from_metadata<R: RecipeMetadata + ?Sized>(recipe: &R) -> Self {
        let ingredients = recipe.ingredients().join("\n");
        let instructions = recipe.instructions().join("\n");

        let mut doc = Self::new(recipe.recipe_id())
            .with_text(fields::FULLTEXT, recipe.name())
            .with_text(fields::FULLTEXT, &ingredients)
            .with_text(fields::FULLTEXT, &instructions)
            .with_text(fields::INGREDIENTS, &ingredients)
            .with_text(fields::FULL_RECIPE, recipe.name())
            .with_text(fields::FULL_RECIPE, recipe.site_name())
            .with_text(fields::FULL_RECIPE, &ingredients)
            .with_text(fields::FULL_RECIPE, &instructions)
            .with_value(fields::NUM_INGREDIENTS, recipe.num_ingredients() as f64);

        if let Some(minutes) = recipe.total_time() {
            doc = doc.with_value(fields::TOTAL_TIME, minutes as f64);
        }
        if let Some(calories) = recipe.calories() {
            doc = doc.with_value(fields::CALORIES, calories as f64);
        }
        doc
    }
}

/// Facet state of one search: the full set of hits
#[derive(Clone, Debug)]
pub struct FacetCollector {
    hits: RoaringBitmap,
}

impl FacetCollector {
    pub fn hits(&self) -> &RoaringBitmap {
        &self.hits
    }
}

/// Search executor holding the whole index in memory
pub struct MemoryIndex {
    analyzer: Arc<dyn Analyzer>,
    facets: FacetConfig,
    /// Document number to recipe id
    recipe_ids: Vec<RecipeId>,
    /// Field to term to documents
    postings: HashMap<String, HashMap<String, RoaringBitmap>>,
    /// Field to document to value
    values: HashMap<String, HashMap<u32, f64>>,
    /// Facet dimension to label to documents
    labels: HashMap<String, HashMap<String, RoaringBitmap>>,
    /// Range results keyed by `RangeQuery::cache_key`
    filter_cache: RwLock<HashMap<String, RoaringBitmap>>,
    filter_cache_capacity: usize,
}

impl MemoryIndex {
    pub fn new(analyzer: Arc<dyn Analyzer>, facets: FacetConfig) -> Self {
        Self {
            analyzer,
            facets,
            recipe_ids: Vec::new(),
            postings: HashMap::new(),
            values: HashMap::new(),
            labels: HashMap::new(),
            filter_cache: RwLock::new(HashMap::new()),
            filter_cache_capacity: FILTER_CACHE_CAPACITY,
        }
    }

    /// Cap the range filter cache; zero disables caching
    pub fn with_filter_cache_capacity(mut self, capacity: usize) -> Self {
        self.filter_cache_capacity = capacity;
        self.filter_cache.get_mut().clear();
        self
    }

    /// Index a document and return its document number
    pub fn add(&mut self, doc: IndexedRecipe) -> Result<u32> {
        let docno = u32::try_from(self.recipe_ids.len())
            .map_err(|_| LarderError::Search("Index is full".to_string()))?;

        // Analyze everything before touching the index so a failure leaves it unchanged
        let mut analyzed = Vec::with_capacity(doc.text.len());
        for (field, text) in &doc.text {
            analyzed.push((field.clone(), self.analyzer.analyze(field, text)?));
        }

        for (field, terms) in analyzed {
            let field_postings = self.postings.entry(field).or_default();
            for term in terms {
                field_postings.entry(term).or_default().insert(docno);
            }
        }

        for (field, value) in &doc.values {
            self.values.entry(field.clone()).or_default().insert(docno, *value);
        }

        for (diet, score) in &doc.diets {
            self.values
                .entry(fields::diet_field(diet))
                .or_default()
                .insert(docno, *score as f64);
            if *score >= DIET_LABEL_THRESHOLD && self.facets.is_known_diet(diet) {
                self.add_label(fields::FACET_DIET, diet, docno);
            }
        }

        let mut derived = Vec::new();
        for dimension in self.facets.dimensions() {
            if let Some(value) = doc.values.get(&dimension.name) {
                if let Some(label) = dimension.bucket_for(*value) {
                    derived.push((dimension.name.clone(), label.to_string()));
                }
            }
        }
        for (dimension, label) in derived {
            self.add_label(&dimension, &label, docno);
        }

        for (dimension, labels) in &doc.labels {
            for label in labels {
                self.add_label(dimension, label, docno);
            }
        }

        self.recipe_ids.push(doc.recipe_id);
        self.filter_cache.get_mut().clear();
        Ok(docno)
    }

    fn add_label(&mut self, dimension: &str, label: &str, docno: u32) {
        self.labels
            .entry(dimension.to_string())
            .or_default()
            .entry(label.to_string())
            .or_default()
            .insert(docno);
    }

    pub fn len(&self) -> usize {
        self.recipe_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipe_ids.is_empty()
    }

    pub fn facets(&self) -> &FacetConfig {
        &self.facets
    }

    /// Number of cached range filters
    pub fn cached_filters(&self) -> usize {
        self.filter_cache.read().len()
    }

    fn all_docs(&self) -> RoaringBitmap {
        let mut docs = RoaringBitmap::new();
        docs.insert_range(0..self.recipe_ids.len() as u32);
        docs
    }

    fn term_docs(&self, field: &str, term: &str) -> Option<&RoaringBitmap> {
        self.postings.get(field).and_then(|terms| terms.get(term))
    }

    fn value(&self, field: &str, docno: u32) -> Option<f64> {
        self.values.get(field).and_then(|values| values.get(&docno)).copied()
    }

    fn execute(&self, query: &Query) -> Result<RoaringBitmap> {
        match query {
            Query::MatchAll => Ok(self.all_docs()),
            Query::MatchNone => Ok(RoaringBitmap::new()),
            Query::Term(term) => Ok(self
                .term_docs(&term.field, &term.term)
                .cloned()
                .unwrap_or_default()),
            Query::Range(range) => Ok(self.execute_range(range)),
            Query::Bool(bool_query) => self.execute_bool(bool_query),
            Query::DrillDown(drill) => self.execute_drill_down(drill),
            Query::Similar(similar) => {
                let mut docs = RoaringBitmap::new();
                for term in &similar.terms {
                    if let Some(postings) = self.term_docs(&similar.field, term) {
                        docs |= postings;
                    }
                }
                Ok(docs)
            }
        }
    }

    fn execute_range(&self, range: &RangeQuery) -> RoaringBitmap {
        let cache_key = range.cache_key();
        if let Some(cached) = self.filter_cache.read().get(&cache_key) {
            return cached.clone();
        }

        let docs: RoaringBitmap = self
            .values
            .get(&range.field)
            .map(|values| {
                values
                    .iter()
                    .filter(|(_, value)| range.bounds.contains(**value))
                    .map(|(docno, _)| *docno)
                    .collect()
            })
            .unwrap_or_default();

        if self.filter_cache_capacity > 0 {
            let mut cache = self.filter_cache.write();
            if cache.len() >= self.filter_cache_capacity {
                debug!(entries = cache.len(), "Filter cache full, clearing");
                cache.clear();
            }
            cache.insert(cache_key, docs.clone());
        }
        docs
    }

    fn execute_bool(&self, query: &BoolQuery) -> Result<RoaringBitmap> {
        if query.is_empty() {
            return Ok(self.all_docs());
        }

        let mut result: Option<RoaringBitmap> = None;
        for clause in &query.must {
            let matches = self.execute(clause)?;
            let merged = match result {
                Some(r) => r & matches,
                None => matches,
            };
            if merged.is_empty() {
                return Ok(merged);
            }
            result = Some(merged);
        }

        // Should clauses only decide matches when nothing is required
        if result.is_none() && !query.should.is_empty() {
            let mut union = RoaringBitmap::new();
            for clause in &query.should {
                union |= self.execute(clause)?;
            }
            result = Some(union);
        }

        let mut result = result.unwrap_or_else(|| self.all_docs());
        for clause in &query.must_not {
            result -= self.execute(clause)?;
        }
        Ok(result)
    }

    fn execute_drill_down(&self, query: &DrillDownQuery) -> Result<RoaringBitmap> {
        let mut result = match query.base() {
            Some(base) => self.execute(base)?,
            None => self.all_docs(),
        };
        for (dimension, labels) in &query.dims {
            let mut any = RoaringBitmap::new();
            if let Some(dim_labels) = self.labels.get(dimension) {
                for label in labels {
                    if let Some(docs) = dim_labels.get(label) {
                        any |= docs;
                    }
                }
            }
            result &= any;
        }
        Ok(result)
    }

    /// Relevance of a matching document: the number of scoring terms it hits
    fn score(&self, query: &Query, docno: u32) -> f32 {
        match query {
            Query::Term(term) => {
                let hit = self
                    .term_docs(&term.field, &term.term)
                    .map(|docs| docs.contains(docno))
                    .unwrap_or(false);
                if hit {
                    1.0
                } else {
                    0.0
                }
            }
            Query::Similar(similar) => similar
                .terms
                .iter()
                .filter(|term| {
                    self.term_docs(&similar.field, term)
                        .map(|docs| docs.contains(docno))
                        .unwrap_or(false)
                })
                .count() as f32,
            Query::Bool(b) => b
                .must
                .iter()
                .chain(&b.should)
                .map(|clause| self.score(clause, docno))
                .sum(),
            Query::DrillDown(d) => d.base().map(|base| self.score(base, docno)).unwrap_or(0.0),
            Query::MatchAll | Query::MatchNone | Query::Range(_) => 0.0,
        }
    }

    fn compare(&self, sort: &SortSpec, a: &(u32, f32), b: &(u32, f32)) -> Ordering {
        for key in &sort.fields {
            let ord = match key {
                SortField::Score => b.1.total_cmp(&a.1),
                SortField::Field {
                    field,
                    ascending,
                    missing_last,
                } => {
                    let missing = if *missing_last {
                        f64::INFINITY
                    } else {
                        f64::NEG_INFINITY
                    };
                    let va = self.value(field, a.0).unwrap_or(missing);
                    let vb = self.value(field, b.0).unwrap_or(missing);
                    if *ascending {
                        va.total_cmp(&vb)
                    } else {
                        vb.total_cmp(&va)
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.0.cmp(&b.0)
    }
}

impl SearchExecutor for MemoryIndex {
    type Collector = FacetCollector;

    fn count(&self, query: &Query) -> Result<u64> {
        Ok(self.execute(query)?.len())
    }

    fn search(
        &self,
        query: &Query,
        window: usize,
        sort: &SortSpec,
        collect_facets: bool,
    ) -> Result<SearchPage<FacetCollector>> {
        let hits = self.execute(query)?;
        debug!(
            query_type = query.query_type(),
            hits = hits.len(),
            window,
            "Executed query"
        );

        let mut scored: Vec<(u32, f32)> = hits
            .iter()
            .map(|docno| (docno, self.score(query, docno)))
            .collect();
        scored.sort_by(|a, b| self.compare(sort, a, b));
        scored.truncate(window);

        let ids = scored
            .into_iter()
            .map(|(docno, _)| self.recipe_ids[docno as usize])
            .collect();
        let collector = collect_facets.then(|| FacetCollector { hits });

        Ok(SearchPage { ids, collector })
    }

    fn compute_facets(
        &self,
        collector: &FacetCollector,
        max_dims: usize,
    ) -> Result<BTreeMap<String, FacetData>> {
        let mut result = BTreeMap::new();
        for dimension in self.facets.dimensions() {
            if result.len() >= max_dims {
                break;
            }
            let Some(dim_labels) = self.labels.get(&dimension.name) else {
                continue;
            };

            let children: BTreeMap<String, u64> = dimension
                .labels
                .iter()
                .filter_map(|label| {
                    let count = dim_labels.get(label)?.intersection_len(&collector.hits);
                    (count > 0).then(|| (label.clone(), count))
                })
                .collect();

            if !children.is_empty() {
                result.insert(
                    dimension.name.clone(),
                    FacetData {
                        dimension: dimension.name.clone(),
                        children,
                    },
                );
            }
        }
        Ok(result)
    }
}
