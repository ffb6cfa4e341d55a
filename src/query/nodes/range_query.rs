//! Range query - matches documents with a numeric field value in a closed range

use serde::{Deserialize, Serialize};

/// Inclusive bounds, typed after the indexed field
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RangeBounds {
    Int { lower: i32, upper: i32 },
    Float { lower: f32, upper: f32 },
}

impl RangeBounds {
    /// Whether `value` lies within the bounds, both ends included
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            RangeBounds::Int { lower, upper } => value >= lower as f64 && value <= upper as f64,
            RangeBounds::Float { lower, upper } => value >= lower as f64 && value <= upper as f64,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, RangeBounds::Float { .. })
    }
}

/// Query that matches documents whose field value is within `bounds`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Field to search in
    pub field: String,
    pub bounds: RangeBounds,
}

impl RangeQuery {
    pub fn int(field: impl Into<String>, lower: i32, upper: i32) -> Self {
        Self {
            field: field.into(),
            bounds: RangeBounds::Int { lower, upper },
        }
    }

    pub fn float(field: impl Into<String>, lower: f32, upper: f32) -> Self {
        Self {
            field: field.into(),
            bounds: RangeBounds::Float { lower, upper },
        }
    }

    /// Key under which executors may cache the matching documents
    pub fn cache_key(&self) -> String {
        match self.bounds {
            RangeBounds::Int { lower, upper } => format!("range:{}:{}..={}", self.field, lower, upper),
            RangeBounds::Float { lower, upper } => {
                format!("range:{}:{:?}..={:?}", self.field, lower, upper)
            }
        }
    }
}
