//! Facet dimensions known to the search index
//!
//! A `FacetConfig` is built once and handed to whoever needs it (query
//! validation, the compiler, executors); there is no process-wide instance.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::fields;

const DIETS: [&str; 5] = ["keto", "lowcarb", "paleo", "vegan", "vegetarian"];
const NUM_INGREDIENT_BUCKETS: [&str; 4] = ["0-5", "5-10", "10-15", "15+"];
const TIME_BUCKETS: [&str; 4] = ["0-15", "15-30", "30-60", "60+"];
const CALORIE_BUCKETS: [&str; 4] = ["0-200", "200-500", "500-1000", "1000+"];

/// One facet dimension and its closed set of labels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDimension {
    pub name: String,
    pub labels: BTreeSet<String>,
    /// Whether a document may carry several labels of this dimension
    #[serde(default)]
    pub multi_valued: bool,
}

impl FacetDimension {
    pub fn new<I, S>(name: impl Into<String>, labels: I, multi_valued: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            multi_valued,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Label of the numeric bucket holding `value`
    ///
    /// Bucket labels read `lo-hi` (`lo <= value < hi`) or `lo+` (`value >= lo`).
    /// Labels that are not buckets never match.
    pub fn bucket_for(&self, value: f64) -> Option<&str> {
        self.labels
            .iter()
            .find(|label| match parse_bucket(label) {
                Some((lo, Some(hi))) => value >= lo && value < hi,
                Some((lo, None)) => value >= lo,
                None => false,
            })
            .map(String::as_str)
    }
}

fn parse_bucket(label: &str) -> Option<(f64, Option<f64>)> {
    if let Some(lo) = label.strip_suffix('+') {
        return Some((lo.parse().ok()?, None));
    }
    let (lo, hi) = label.split_once('-')?;
    Some((lo.parse().ok()?, Some(hi.parse().ok()?)))
}

/// Immutable set of facet dimensions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetConfig {
    dimensions: BTreeMap<String, FacetDimension>,
}

impl FacetConfig {
    /// Configuration without any dimension
    pub fn empty() -> Self {
        Self {
            dimensions: BTreeMap::new(),
        }
    }

    pub fn with_dimension(mut self, dimension: FacetDimension) -> Self {
        self.dimensions.insert(dimension.name.clone(), dimension);
        self
    }

    pub fn dimension(&self, name: &str) -> Option<&FacetDimension> {
        self.dimensions.get(name)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &FacetDimension> {
        self.dimensions.values()
    }

    /// Whether `(dimension, label)` is a valid drill-down target
    pub fn is_known(&self, dimension: &str, label: &str) -> bool {
        self.dimension(dimension)
            .map(|d| d.has_label(label))
            .unwrap_or(false)
    }

    /// Whether `diet` is a label of the diet dimension
    pub fn is_known_diet(&self, diet: &str) -> bool {
        self.is_known(fields::FACET_DIET, diet)
    }
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self::empty()
            .with_dimension(FacetDimension::new(fields::FACET_DIET, DIETS, true))
            .with_dimension(FacetDimension::new(
                fields::NUM_INGREDIENTS,
                NUM_INGREDIENT_BUCKETS,
                false,
            ))
            .with_dimension(FacetDimension::new(fields::PREP_TIME, TIME_BUCKETS, false))
            .with_dimension(FacetDimension::new(fields::COOK_TIME, TIME_BUCKETS, false))
            .with_dimension(FacetDimension::new(fields::TOTAL_TIME, TIME_BUCKETS, false))
            .with_dimension(FacetDimension::new(fields::CALORIES, CALORIE_BUCKETS, false))
    }
}
