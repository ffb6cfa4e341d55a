//! Validated search request model
//!
//! A [`QueryModel`] can only be obtained through [`QueryModelBuilder`], which
//! checks every rule up front and reports all violations at once. Once built,
//! a model is immutable and always valid.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::facets::FacetConfig;
use super::fields;
use crate::config::QueryLimits;
use crate::error::{LarderError, ValidationErrors};
use crate::Result;

/// Closed, non-negative integer range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i32; 2]", into = "[i32; 2]")]
pub struct RangedSpec {
    start: i32,
    end: i32,
}

impl RangedSpec {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        let mut errors = ValidationErrors::new();
        if start > end {
            errors.push("Range start must be before range end");
        }
        if start < 0 || end < 0 {
            errors.push("Range must not contain negative numbers");
        }
        errors.into_result()?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }
}

impl TryFrom<[i32; 2]> for RangedSpec {
    type Error = LarderError;

    fn try_from([start, end]: [i32; 2]) -> Result<Self> {
        Self::new(start, end)
    }
}

impl From<RangedSpec> for [i32; 2] {
    fn from(spec: RangedSpec) -> Self {
        [spec.start, spec.end]
    }
}

/// Numeric attributes a query can restrict to a range
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RangeFilter {
    NumIngredients,
    PrepTime,
    CookTime,
    TotalTime,
    Calories,
    FatContent,
    ProteinContent,
    CarbohydrateContent,
}

impl RangeFilter {
    pub const ALL: [RangeFilter; 8] = [
        RangeFilter::NumIngredients,
        RangeFilter::PrepTime,
        RangeFilter::CookTime,
        RangeFilter::TotalTime,
        RangeFilter::Calories,
        RangeFilter::FatContent,
        RangeFilter::ProteinContent,
        RangeFilter::CarbohydrateContent,
    ];

    /// Index field this filter applies to
    pub fn field(&self) -> &'static str {
        match self {
            RangeFilter::NumIngredients => fields::NUM_INGREDIENTS,
            RangeFilter::PrepTime => fields::PREP_TIME,
            RangeFilter::CookTime => fields::COOK_TIME,
            RangeFilter::TotalTime => fields::TOTAL_TIME,
            RangeFilter::Calories => fields::CALORIES,
            RangeFilter::FatContent => fields::FAT_CONTENT,
            RangeFilter::ProteinContent => fields::PROTEIN_CONTENT,
            RangeFilter::CarbohydrateContent => fields::CARBOHYDRATE_CONTENT,
        }
    }

    /// Whether the field is indexed as a float rather than an integer
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            RangeFilter::FatContent | RangeFilter::ProteinContent | RangeFilter::CarbohydrateContent
        )
    }
}

/// Result ordering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Relevance,
    NumIngredients,
    PrepTime,
    CookTime,
    TotalTime,
    Calories,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        SortOrder::Relevance,
        SortOrder::NumIngredients,
        SortOrder::PrepTime,
        SortOrder::CookTime,
        SortOrder::TotalTime,
        SortOrder::Calories,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::NumIngredients => "num_ingredients",
            SortOrder::PrepTime => "prep_time",
            SortOrder::CookTime => "cook_time",
            SortOrder::TotalTime => "total_time",
            SortOrder::Calories => "calories",
        }
    }

    /// Field to sort on; `None` for relevance
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SortOrder::Relevance => None,
            SortOrder::NumIngredients => Some(fields::NUM_INGREDIENTS),
            SortOrder::PrepTime => Some(fields::PREP_TIME),
            SortOrder::CookTime => Some(fields::COOK_TIME),
            SortOrder::TotalTime => Some(fields::TOTAL_TIME),
            SortOrder::Calories => Some(fields::CALORIES),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortOrder {
    type Err = LarderError;

    /// Case-insensitive match against the declared names
    fn from_str(s: &str) -> Result<Self> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let mut errors = ValidationErrors::new();
                errors.push(format!("Unknown sort order: {}", s));
                LarderError::InvalidQuery(errors)
            })
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Request to narrow results to one facet label
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DrillDown {
    dimension: String,
    label: String,
}

impl DrillDown {
    /// Validate `(dimension, label)` against the facet configuration
    pub fn new(config: &FacetConfig, dimension: &str, label: &str) -> Result<Self> {
        let mut errors = ValidationErrors::new();
        check_drill_down(config, dimension, label, &mut errors);
        errors.into_result()?;
        Ok(Self {
            dimension: dimension.to_string(),
            label: label.to_string(),
        })
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn check_drill_down(config: &FacetConfig, dimension: &str, label: &str, errors: &mut ValidationErrors) {
    match config.dimension(dimension) {
        None => errors.push(format!("Unknown facet dimension: {}", dimension)),
        Some(dim) if !dim.has_label(label) => {
            errors.push(format!("Unknown label {} for facet dimension {}", label, dimension))
        }
        Some(_) => {}
    }
}

/// Validated, immutable search request
#[derive(Clone, Debug, PartialEq)]
pub struct QueryModel {
    fulltext: Option<String>,
    with_ingredients: Vec<String>,
    without_ingredients: Vec<String>,
    ranges: BTreeMap<RangeFilter, RangedSpec>,
    diet_thresholds: BTreeMap<String, f32>,
    similarity: Option<String>,
    drill_downs: Vec<DrillDown>,
    sort: SortOrder,
    offset: usize,
    max_results: usize,
    max_facets: usize,
}

impl QueryModel {
    pub fn builder() -> QueryModelBuilder {
        QueryModelBuilder::default()
    }

    pub fn fulltext(&self) -> Option<&str> {
        self.fulltext.as_deref()
    }

    /// Ingredient terms every result must mention
    pub fn with_ingredients(&self) -> &[String] {
        &self.with_ingredients
    }

    /// Ingredient terms no result may mention
    pub fn without_ingredients(&self) -> &[String] {
        &self.without_ingredients
    }

    pub fn range(&self, filter: RangeFilter) -> Option<RangedSpec> {
        self.ranges.get(&filter).copied()
    }

    /// Populated range filters, in declaration order
    pub fn ranges(&self) -> impl Iterator<Item = (RangeFilter, RangedSpec)> + '_ {
        self.ranges.iter().map(|(filter, spec)| (*filter, *spec))
    }

    pub fn num_ingredients(&self) -> Option<RangedSpec> {
        self.range(RangeFilter::NumIngredients)
    }

    pub fn prep_time(&self) -> Option<RangedSpec> {
        self.range(RangeFilter::PrepTime)
    }

    pub fn cook_time(&self) -> Option<RangedSpec> {
        self.range(RangeFilter::CookTime)
    }

    pub fn total_time(&self) -> Option<RangedSpec> {
        self.range(RangeFilter::TotalTime)
    }

    pub fn calories(&self) -> Option<RangedSpec> {
        self.range(RangeFilter::Calories)
    }

    /// Diet name to minimum confidence score
    pub fn diet_thresholds(&self) -> &BTreeMap<String, f32> {
        &self.diet_thresholds
    }

    /// Text of a "more like this" probe
    pub fn similarity(&self) -> Option<&str> {
        self.similarity.as_deref()
    }

    pub fn drill_downs(&self) -> &[DrillDown] {
        &self.drill_downs
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn max_facets(&self) -> usize {
        self.max_facets
    }

    /// Number of range filters and diet thresholds in use
    pub fn num_selected_filters(&self) -> usize {
        self.ranges.len() + self.diet_thresholds.len()
    }

    /// Fulltext is the only criterion
    pub fn is_fulltext_only(&self) -> bool {
        self.fulltext.is_some()
            && self.num_selected_filters() == 0
            && self.with_ingredients.is_empty()
            && self.without_ingredients.is_empty()
            && self.drill_downs.is_empty()
    }

    /// No criterion at all; such a query matches every recipe
    pub fn is_empty(&self) -> bool {
        self.fulltext.is_none()
            && self.similarity.is_none()
            && self.num_selected_filters() == 0
            && self.with_ingredients.is_empty()
            && self.without_ingredients.is_empty()
            && self.drill_downs.is_empty()
    }
}

/// Builder for [`QueryModel`]
///
/// Setters never fail; [`build`](Self::build) checks everything.
#[derive(Clone, Debug)]
pub struct QueryModelBuilder {
    fulltext: Option<String>,
    with_ingredients: Vec<String>,
    without_ingredients: Vec<String>,
    ranges: BTreeMap<RangeFilter, RangedSpec>,
    diet_thresholds: BTreeMap<String, f32>,
    similarity: Option<String>,
    drill_downs: Vec<(String, String)>,
    sort: SortOrder,
    offset: i64,
    max_results: i64,
    max_facets: i64,
}

impl Default for QueryModelBuilder {
    fn default() -> Self {
        Self {
            fulltext: None,
            with_ingredients: Vec::new(),
            without_ingredients: Vec::new(),
            ranges: BTreeMap::new(),
            diet_thresholds: BTreeMap::new(),
            similarity: None,
            drill_downs: Vec::new(),
            sort: SortOrder::default(),
            offset: 0,
            max_results: 10,
            max_facets: 0,
        }
    }
}

impl QueryModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fulltext(mut self, text: impl Into<String>) -> Self {
        self.fulltext = Some(text.into());
        self
    }

    pub fn with_ingredient(mut self, term: impl Into<String>) -> Self {
        self.with_ingredients.push(term.into());
        self
    }

    pub fn without_ingredient(mut self, term: impl Into<String>) -> Self {
        self.without_ingredients.push(term.into());
        self
    }

    pub fn range(mut self, filter: RangeFilter, spec: RangedSpec) -> Self {
        self.ranges.insert(filter, spec);
        self
    }

    pub fn num_ingredients(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::NumIngredients, spec)
    }

    pub fn prep_time(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::PrepTime, spec)
    }

    pub fn cook_time(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::CookTime, spec)
    }

    pub fn total_time(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::TotalTime, spec)
    }

    pub fn calories(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::Calories, spec)
    }

    pub fn fat_content(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::FatContent, spec)
    }

    pub fn protein_content(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::ProteinContent, spec)
    }

    pub fn carbohydrate_content(self, spec: RangedSpec) -> Self {
        self.range(RangeFilter::CarbohydrateContent, spec)
    }

    pub fn diet_threshold(mut self, diet: impl Into<String>, score: f32) -> Self {
        self.diet_thresholds.insert(diet.into(), score);
        self
    }

    /// Require a diet with full confidence
    pub fn add_match_diet(self, diet: impl Into<String>) -> Self {
        self.diet_threshold(diet, 1.0)
    }

    pub fn similarity(mut self, text: impl Into<String>) -> Self {
        self.similarity = Some(text.into());
        self
    }

    pub fn drill_down(mut self, dimension: impl Into<String>, label: impl Into<String>) -> Self {
        self.drill_downs.push((dimension.into(), label.into()));
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn max_results(mut self, max_results: i64) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn max_facets(mut self, max_facets: i64) -> Self {
        self.max_facets = max_facets;
        self
    }

    /// Validate against the default facet configuration and limits
    pub fn build(self) -> Result<QueryModel> {
        self.build_with(&FacetConfig::default(), &QueryLimits::default())
    }

    pub fn build_with(self, facets: &FacetConfig, limits: &QueryLimits) -> Result<QueryModel> {
        let mut errors = ValidationErrors::new();

        if self.max_results < 1 {
            errors.push("maxResults must be >= 1");
        } else if self.max_results as u64 > limits.max_results_cap as u64 {
            errors.push(format!("maxResults must be <= {}", limits.max_results_cap));
        }
        if self.max_facets < 0 {
            errors.push("maxFacets must be >= 0");
        } else if self.max_facets as u64 > limits.max_facets_cap as u64 {
            errors.push(format!("maxFacets must be <= {}", limits.max_facets_cap));
        }
        if self.offset < 0 {
            errors.push("offset must be >= 0");
        }

        for (diet, score) in &self.diet_thresholds {
            if !facets.is_known_diet(diet) {
                errors.push(format!("Unknown diet: {}", diet));
            }
            if !(*score > 0.0 && *score <= 1.0) {
                errors.push(format!("Score for diet {} must be in ]0,1], got {}", diet, score));
            }
        }

        if let Some(text) = &self.similarity {
            if text.trim().is_empty() {
                errors.push("Similarity text must not be blank");
            } else if text.chars().count() < limits.min_similarity_len {
                errors.push(format!(
                    "Similarity text must have at least {} characters",
                    limits.min_similarity_len
                ));
            }
            if self.fulltext.is_some() {
                errors.push("Similarity and fulltext can not be set together");
            }
        }

        for term in self.with_ingredients.iter().chain(&self.without_ingredients) {
            if term.trim().is_empty() {
                errors.push("Ingredient terms must not be blank");
                break;
            }
        }

        for (dimension, label) in &self.drill_downs {
            check_drill_down(facets, dimension, label, &mut errors);
        }

        errors.into_result()?;

        Ok(QueryModel {
            fulltext: self.fulltext,
            with_ingredients: self.with_ingredients,
            without_ingredients: self.without_ingredients,
            ranges: self.ranges,
            diet_thresholds: self.diet_thresholds,
            similarity: self.similarity,
            drill_downs: self
                .drill_downs
                .into_iter()
                .map(|(dimension, label)| DrillDown { dimension, label })
                .collect(),
            sort: self.sort,
            offset: self.offset as usize,
            max_results: self.max_results as usize,
            max_facets: self.max_facets as usize,
        })
    }
}
