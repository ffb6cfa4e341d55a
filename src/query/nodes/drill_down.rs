//! Drill-down query - narrows a base query to facet labels

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::query::ast::Query;

/// Restricts a base query to documents carrying the requested facet labels
///
/// Labels of one dimension are OR-ed, dimensions are AND-ed. Without a
/// base query, every document is a candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillDownQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Box<Query>>,
    pub dims: BTreeMap<String, Vec<String>>,
}

impl DrillDownQuery {
    pub fn new(base: Option<Query>) -> Self {
        Self {
            base: base.map(Box::new),
            dims: BTreeMap::new(),
        }
    }

    /// Add a label to a dimension; repeated labels are kept once
    pub fn add(&mut self, dimension: impl Into<String>, label: impl Into<String>) {
        let label = label.into();
        let labels = self.dims.entry(dimension.into()).or_default();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    pub fn with(mut self, dimension: impl Into<String>, label: impl Into<String>) -> Self {
        self.add(dimension, label);
        self
    }

    pub fn base(&self) -> Option<&Query> {
        self.base.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_grouped_by_dimension() {
        let query = DrillDownQuery::new(None)
            .with("diet", "keto")
            .with("diet", "paleo")
            .with("diet", "keto")
            .with("calories", "0-200");

        assert_eq!(query.dims.len(), 2);
        assert_eq!(query.dims["diet"], vec!["keto", "paleo"]);
        assert!(query.base().is_none());
    }
}
