use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for larder operations
#[derive(Error, Debug)]
pub enum LarderError {
    #[error("Store already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Data file capacity exceeded: {required} bytes needed, limit is {limit}")]
    CapacityExceeded { required: u64, limit: u64 },

    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    #[error("Malformed record at offset {offset}: {reason}")]
    Decode { offset: u32, reason: String },

    #[error("Store writer already closed")]
    Closed,

    #[error("Invalid query: {0}")]
    InvalidQuery(ValidationErrors),

    #[error("Analyzer error: {0}")]
    Analyzer(String),

    #[error("Compilation error: {0}")]
    Compilation(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for larder operations
pub type Result<T> = std::result::Result<T, LarderError>;

impl LarderError {
    /// Check if this error indicates a transient failure that could be retried by the caller
    pub fn is_retriable(&self) -> bool {
        matches!(self, LarderError::Analyzer(_) | LarderError::Search(_))
    }

    /// Validation violations carried by this error, if any
    pub fn violations(&self) -> &[String] {
        match self {
            LarderError::InvalidQuery(errors) => errors.violations(),
            _ => &[],
        }
    }
}

/// Every rule a query failed, in the order they were checked
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// `Ok(())` when nothing was recorded, the collected violations otherwise
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LarderError::InvalidQuery(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.violations.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LarderError::Decode {
            offset: 42,
            reason: "checksum mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed record at offset 42: checksum mismatch"
        );
    }

    #[test]
    fn test_retriable_errors() {
        assert!(LarderError::Analyzer("tokenizer".to_string()).is_retriable());
        assert!(LarderError::Search("timeout".to_string()).is_retriable());
        assert!(!LarderError::Closed.is_retriable());
        assert!(!LarderError::CorruptStore("bad".to_string()).is_retriable());
    }

    #[test]
    fn test_validation_errors_collect_every_violation() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.push("maxResults must be >= 1");
        errors.push("offset must be >= 0");

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.violations().len(), 2);
        assert_eq!(
            err.to_string(),
            "Invalid query: maxResults must be >= 1; offset must be >= 0"
        );
    }
}
