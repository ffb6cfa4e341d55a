//! Compiled query plans

use serde::{Deserialize, Serialize};

use super::ast::Query;
use super::model::SortOrder;

/// One sort key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Relevance, highest first
    Score,
    /// Numeric field value; documents without a value sort as if it were
    /// positive infinity when `missing_last` is set
    Field {
        field: String,
        ascending: bool,
        missing_last: bool,
    },
}

/// Ordered list of sort keys, applied left to right
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub fields: Vec<SortField>,
}

impl SortSpec {
    pub fn relevance() -> Self {
        Self {
            fields: vec![SortField::Score],
        }
    }

    /// Sort keys for a requested order; relevance always breaks ties
    pub fn for_order(order: SortOrder) -> Self {
        match order.field() {
            None => Self::relevance(),
            Some(field) => Self {
                fields: vec![
                    SortField::Field {
                        field: field.to_string(),
                        ascending: true,
                        missing_last: true,
                    },
                    SortField::Score,
                ],
            },
        }
    }

    pub fn is_relevance(&self) -> bool {
        self.fields == [SortField::Score]
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::relevance()
    }
}

/// Query tree plus sort keys, ready to hand to an executor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub root: Query,
    pub sort: SortSpec,
}

impl QueryPlan {
    pub fn new(root: Query, sort: SortSpec) -> Self {
        Self { root, sort }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_sort() {
        let spec = SortSpec::for_order(SortOrder::Relevance);
        assert!(spec.is_relevance());
    }

    #[test]
    fn test_field_sort_falls_back_to_relevance() {
        let spec = SortSpec::for_order(SortOrder::Calories);
        assert_eq!(
            spec.fields,
            vec![
                SortField::Field {
                    field: "calories".to_string(),
                    ascending: true,
                    missing_last: true,
                },
                SortField::Score,
            ]
        );
        assert!(!spec.is_relevance());
    }
}
