use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use stop_words::{get, LANGUAGE};
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use super::Analyzer;
use crate::config::AnalyzerConfig;
use crate::error::LarderError;
use crate::Result;

/// Stemmer and stopword list for a configured language name
fn resolve_language(name: &str) -> Option<(Algorithm, LANGUAGE)> {
    let pair = match name.trim().to_ascii_lowercase().as_str() {
        "arabic" => (Algorithm::Arabic, LANGUAGE::Arabic),
        "danish" => (Algorithm::Danish, LANGUAGE::Danish),
        "dutch" => (Algorithm::Dutch, LANGUAGE::Dutch),
        "english" => (Algorithm::English, LANGUAGE::English),
        "finnish" => (Algorithm::Finnish, LANGUAGE::Finnish),
        "french" => (Algorithm::French, LANGUAGE::French),
        "german" => (Algorithm::German, LANGUAGE::German),
        "greek" => (Algorithm::Greek, LANGUAGE::Greek),
        "hungarian" => (Algorithm::Hungarian, LANGUAGE::Hungarian),
        "italian" => (Algorithm::Italian, LANGUAGE::Italian),
        "norwegian" => (Algorithm::Norwegian, LANGUAGE::Norwegian),
        "portuguese" => (Algorithm::Portuguese, LANGUAGE::Portuguese),
        "romanian" => (Algorithm::Romanian, LANGUAGE::Romanian),
        "russian" => (Algorithm::Russian, LANGUAGE::Russian),
        "spanish" => (Algorithm::Spanish, LANGUAGE::Spanish),
        "swedish" => (Algorithm::Swedish, LANGUAGE::Swedish),
        "turkish" => (Algorithm::Turkish, LANGUAGE::Turkish),
        _ => return None,
    };
    Some(pair)
}

/// Word-splitting analyzer with stemming and stopword removal
///
/// Applies the same chain to every field: unicode word segmentation,
/// lowercasing, length filtering, stopword removal, stemming. Stemmer and
/// stopwords follow `AnalyzerConfig::language`.
pub struct StandardAnalyzer {
    config: AnalyzerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl StandardAnalyzer {
    /// Build an analyzer, falling back to English for an unsupported language
    pub fn new(config: &AnalyzerConfig) -> Self {
        let (algorithm, language) = resolve_language(&config.language).unwrap_or_else(|| {
            warn!(language = %config.language, "unsupported analyzer language, using english");
            (Algorithm::English, LANGUAGE::English)
        });
        Self::with_language(config, algorithm, language)
    }

    /// Build an analyzer, rejecting an unsupported language
    pub fn try_new(config: &AnalyzerConfig) -> Result<Self> {
        let (algorithm, language) = resolve_language(&config.language).ok_or_else(|| {
            LarderError::Analyzer(format!("unsupported language: {}", config.language))
        })?;
        Ok(Self::with_language(config, algorithm, language))
    }

    fn with_language(config: &AnalyzerConfig, algorithm: Algorithm, language: LANGUAGE) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(algorithm))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(language)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    /// Tokenize text into a vector of terms
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|word| {
                if self.config.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                }
            })
            .filter(|token| {
                token.len() >= self.config.min_token_length
                    && token.len() <= self.config.max_token_length
                    && !self.stopwords.contains(token)
            })
            .map(|token| match &self.stemmer {
                Some(stemmer) => stemmer.stem(&token).into_owned(),
                None => token,
            })
            .collect()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, _field: &str, text: &str) -> Result<Vec<String>> {
        Ok(self.tokenize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        let analyzer = StandardAnalyzer::new(&AnalyzerConfig {
            remove_stopwords: false,
            stem: false,
            ..Default::default()
        });
        let tokens = analyzer.tokenize("Garlic Bread! With a crispy crust.");

        assert_eq!(tokens, vec!["garlic", "bread", "with", "crispy", "crust"]);
    }

    #[test]
    fn test_stopword_removal() {
        let analyzer = StandardAnalyzer::new(&AnalyzerConfig {
            stem: false,
            ..Default::default()
        });
        let tokens = analyzer.tokenize("the soup of the day");

        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"of".to_string()));
        assert!(tokens.contains(&"soup".to_string()));
    }

    #[test]
    fn test_stemming() {
        let analyzer = StandardAnalyzer::new(&AnalyzerConfig {
            remove_stopwords: false,
            ..Default::default()
        });
        let tokens = analyzer.tokenize("roasting roasted roasts");

        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t == "roast"));
    }

    #[test]
    fn test_language_selects_stemmer_and_stopwords() {
        let french = AnalyzerConfig {
            language: "French".to_string(),
            ..Default::default()
        };
        let analyzer = StandardAnalyzer::try_new(&french).unwrap();
        let expected = Stemmer::create(Algorithm::French).stem("tomates").into_owned();

        assert_eq!(analyzer.tokenize("les tomates"), vec![expected]);
    }

    #[test]
    fn test_unsupported_language() {
        let config = AnalyzerConfig {
            language: "klingon".to_string(),
            remove_stopwords: false,
            ..Default::default()
        };
        assert!(matches!(
            StandardAnalyzer::try_new(&config),
            Err(LarderError::Analyzer(_))
        ));

        let analyzer = StandardAnalyzer::new(&config);
        assert_eq!(analyzer.tokenize("roasting"), vec!["roast"]);
    }

    #[test]
    fn test_min_max_token_length() {
        let analyzer = StandardAnalyzer::new(&AnalyzerConfig {
            remove_stopwords: false,
            stem: false,
            min_token_length: 3,
            max_token_length: 5,
            ..Default::default()
        });
        let tokens = analyzer.tokenize("a ab abc abcd abcde abcdef");

        assert_eq!(tokens, vec!["abc", "abcd", "abcde"]);
    }

    #[test]
    fn test_plain_config_keeps_everything() {
        let analyzer = StandardAnalyzer::new(&AnalyzerConfig::plain());
        let tokens = analyzer.analyze("fulltext", "A pinch of Salt").unwrap();

        assert_eq!(tokens, vec!["a", "pinch", "of", "salt"]);
    }
}
