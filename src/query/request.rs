//! Flat request shape accepted at the service boundary

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::facets::FacetConfig;
use super::model::{QueryModel, RangeFilter, RangedSpec, SortOrder};
use crate::config::QueryLimits;
use crate::error::{LarderError, ValidationErrors};
use crate::Result;

/// Property bag as sent by clients
///
/// Ranges are raw `[start, end]` pairs and `sort` is a name; nothing is
/// checked until [`into_model`](Self::into_model).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub fulltext: Option<String>,
    pub with_ingredients: Vec<String>,
    pub without_ingredients: Vec<String>,
    pub num_ingredients: Option<[i32; 2]>,
    pub prep_time: Option<[i32; 2]>,
    pub cook_time: Option<[i32; 2]>,
    pub total_time: Option<[i32; 2]>,
    pub calories: Option<[i32; 2]>,
    pub fat_content: Option<[i32; 2]>,
    pub protein_content: Option<[i32; 2]>,
    pub carbohydrate_content: Option<[i32; 2]>,
    pub diet_threshold: BTreeMap<String, f32>,
    pub similarity: Option<String>,
    pub drill_down: Vec<[String; 2]>,
    pub sort: Option<String>,
    pub offset: Option<i64>,
    pub max_results: Option<i64>,
    pub max_facets: Option<i64>,
}

impl SearchRequest {
    fn range_pairs(&self) -> [(RangeFilter, Option<[i32; 2]>); 8] {
        [
            (RangeFilter::NumIngredients, self.num_ingredients),
            (RangeFilter::PrepTime, self.prep_time),
            (RangeFilter::CookTime, self.cook_time),
            (RangeFilter::TotalTime, self.total_time),
            (RangeFilter::Calories, self.calories),
            (RangeFilter::FatContent, self.fat_content),
            (RangeFilter::ProteinContent, self.protein_content),
            (RangeFilter::CarbohydrateContent, self.carbohydrate_content),
        ]
    }

    /// Validate into a [`QueryModel`], reporting every problem at once
    pub fn into_model(self, facets: &FacetConfig, limits: &QueryLimits) -> Result<QueryModel> {
        let mut errors = ValidationErrors::new();
        let mut builder = QueryModel::builder();

        for (filter, pair) in self.range_pairs() {
            let Some([start, end]) = pair else { continue };
            match RangedSpec::new(start, end) {
                Ok(spec) => builder = builder.range(filter, spec),
                Err(err) => {
                    for violation in err.violations() {
                        errors.push(format!("{}: {}", filter.field(), violation));
                    }
                }
            }
        }

        if let Some(name) = &self.sort {
            match name.parse::<SortOrder>() {
                Ok(order) => builder = builder.sort(order),
                Err(err) => errors.extend(into_violations(err)),
            }
        }

        if let Some(text) = self.fulltext {
            builder = builder.fulltext(text);
        }
        if let Some(text) = self.similarity {
            builder = builder.similarity(text);
        }
        for term in self.with_ingredients {
            builder = builder.with_ingredient(term);
        }
        for term in self.without_ingredients {
            builder = builder.without_ingredient(term);
        }
        for (diet, score) in self.diet_threshold {
            builder = builder.diet_threshold(diet, score);
        }
        for [dimension, label] in self.drill_down {
            builder = builder.drill_down(dimension, label);
        }
        if let Some(offset) = self.offset {
            builder = builder.offset(offset);
        }
        if let Some(max_results) = self.max_results {
            builder = builder.max_results(max_results);
        }
        if let Some(max_facets) = self.max_facets {
            builder = builder.max_facets(max_facets);
        }

        match builder.build_with(facets, limits) {
            Ok(model) if errors.is_empty() => Ok(model),
            Ok(_) => Err(LarderError::InvalidQuery(errors)),
            Err(err) => {
                errors.extend(into_violations(err));
                Err(LarderError::InvalidQuery(errors))
            }
        }
    }
}

fn into_violations(err: LarderError) -> ValidationErrors {
    match err {
        LarderError::InvalidQuery(errors) => errors,
        other => {
            let mut errors = ValidationErrors::new();
            errors.push(other.to_string());
            errors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<QueryModel> {
        let request: SearchRequest = serde_json::from_value(value)?;
        request.into_model(&FacetConfig::default(), &QueryLimits::default())
    }

    #[test]
    fn test_minimal_request() {
        let model = parse(json!({ "fulltext": "garlic" })).unwrap();
        assert!(model.is_fulltext_only());
        assert_eq!(model.max_results(), 10);
    }

    #[test]
    fn test_full_request() {
        let model = parse(json!({
            "fulltext": "soup",
            "with_ingredients": ["carrot"],
            "num_ingredients": [2, 8],
            "calories": [0, 400],
            "diet_threshold": { "vegan": 0.75 },
            "drill_down": [["total_time", "15-30"]],
            "sort": "Total_Time",
            "offset": 20,
            "max_results": 5,
            "max_facets": 3
        }))
        .unwrap();

        assert_eq!(model.num_ingredients(), Some(RangedSpec::new(2, 8).unwrap()));
        assert_eq!(model.sort(), SortOrder::TotalTime);
        assert_eq!(model.num_selected_filters(), 3);
        assert_eq!(model.offset(), 20);
        assert_eq!(model.drill_downs().len(), 1);
    }

    #[test]
    fn test_errors_are_merged() {
        let err = parse(json!({
            "calories": [500, 100],
            "sort": "by_color",
            "max_results": 0
        }))
        .unwrap_err();

        assert_eq!(err.violations().len(), 3);
        assert!(err.violations()[0].starts_with("calories"));
    }

    #[test]
    fn test_malformed_pair_fails_parsing() {
        let request = serde_json::from_value::<SearchRequest>(json!({ "calories": [1] }));
        assert!(request.is_err());
    }
}
