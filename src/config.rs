use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::query::FacetConfig;
use crate::Result;

/// Analyzer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    /// Stemmer and stopword language, e.g. "english" or "french"
    pub language: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: true,
            stem: true,
            min_token_length: 2,
            max_token_length: 50,
            language: "english".to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Plain lowercasing word splitter, without stopwords or stemming
    pub fn plain() -> Self {
        Self {
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            ..Default::default()
        }
    }
}

/// Store writer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Largest data file the writer will produce. Offsets are 32-bit, so
    /// values above `u32::MAX` are clamped.
    pub max_data_bytes: u64,
    /// fsync both files when the writer closes
    pub sync_on_close: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_data_bytes: u32::MAX as u64,
            sync_on_close: true,
        }
    }
}

impl StoreConfig {
    pub fn with_max_data_bytes(mut self, max: u64) -> Self {
        self.max_data_bytes = max;
        self
    }

    pub fn with_sync_on_close(mut self, sync: bool) -> Self {
        self.sync_on_close = sync;
        self
    }

    /// Effective capacity, never above the 32-bit offset range
    pub fn capacity(&self) -> u64 {
        self.max_data_bytes.min(u32::MAX as u64)
    }
}

/// Bounds applied while validating a query model
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    pub max_results_cap: usize,
    pub max_facets_cap: usize,
    /// Shortest similarity probe text, in characters
    pub min_similarity_len: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_results_cap: 1000,
            max_facets_cap: 100,
            min_similarity_len: 30,
        }
    }
}

/// Top-level settings, as read by the command line tool
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LarderSettings {
    pub analyzer: AnalyzerConfig,
    pub store: StoreConfig,
    pub limits: QueryLimits,
    pub facets: FacetConfig,
}

impl LarderSettings {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let analyzer = AnalyzerConfig::default();
        assert!(analyzer.lowercase);
        assert!(analyzer.remove_stopwords);
        assert!(analyzer.stem);

        let store = StoreConfig::default();
        assert_eq!(store.capacity(), u32::MAX as u64);

        let limits = QueryLimits::default();
        assert_eq!(limits.min_similarity_len, 30);
    }

    #[test]
    fn test_store_capacity_is_clamped() {
        let store = StoreConfig::default().with_max_data_bytes(u64::MAX);
        assert_eq!(store.capacity(), u32::MAX as u64);

        let store = StoreConfig::default().with_max_data_bytes(1024);
        assert_eq!(store.capacity(), 1024);
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: LarderSettings =
            serde_json::from_str(r#"{ "limits": { "max_results_cap": 50 } }"#).unwrap();
        assert_eq!(settings.limits.max_results_cap, 50);
        assert_eq!(settings.limits.max_facets_cap, 100);
        assert!(settings.analyzer.stem);
        assert!(settings.facets.is_known_diet("vegan"));
    }
}
