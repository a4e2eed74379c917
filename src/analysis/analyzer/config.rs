//! Serializable analyzer definitions and the built-in presets.
//!
//! ```json
//! {
//!   "tokenizer": {"type": "standard", "max_token_length": 64},
//!   "filters": [{"type": "lowercase"}, {"type": "stopwords"}, {"type": "stemmer"}]
//! }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::PipelineAnalyzer;
use crate::analysis::token_filter::Filter;
use crate::analysis::token_filter::ascii_folding::AsciiFoldingFilter;
use crate::analysis::token_filter::length::LengthFilter;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stem::StemFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::token_filter::synonym::{SynonymFilter, SynonymTable};
use crate::analysis::token_filter::trim::TrimFilter;
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::keyword::KeywordTokenizer;
use crate::analysis::tokenizer::ngram::NgramTokenizer;
use crate::analysis::tokenizer::standard::{DEFAULT_MAX_TOKEN_LENGTH, StandardTokenizer};
use crate::analysis::tokenizer::whitespace::WhitespaceTokenizer;
use crate::error::Result;

/// Names of the built-in analyzers.
pub const PRESET_NAMES: &[&str] = &["standard", "simple", "english", "whitespace", "keyword"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenizerConfig {
    Standard {
        #[serde(default = "default_max_token_length")]
        max_token_length: usize,
    },
    Whitespace,
    Keyword,
    Ngram {
        min_gram: usize,
        max_gram: usize,
    },
}

fn default_max_token_length() -> usize {
    DEFAULT_MAX_TOKEN_LENGTH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    Lowercase,
    /// Stop words; the English list when `words` is absent.
    Stopwords {
        #[serde(default)]
        words: Option<Vec<String>>,
    },
    Stemmer,
    Length {
        min: usize,
        max: usize,
    },
    Trim,
    AsciiFolding,
    Synonym {
        groups: Vec<Vec<String>>,
    },
}

/// A tokenizer and its ordered filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

impl AnalyzerConfig {
    pub fn new(tokenizer: TokenizerConfig) -> Self {
        AnalyzerConfig {
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filters.push(filter);
        self
    }

    /// The configuration of a built-in analyzer.
    pub fn preset(name: &str) -> Option<AnalyzerConfig> {
        let standard = TokenizerConfig::Standard {
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
        };
        let config = match name {
            "standard" => AnalyzerConfig::new(standard).with_filter(FilterConfig::Lowercase),
            "simple" => AnalyzerConfig::new(standard)
                .with_filter(FilterConfig::Lowercase)
                .with_filter(FilterConfig::AsciiFolding),
            "english" => AnalyzerConfig::new(standard)
                .with_filter(FilterConfig::Lowercase)
                .with_filter(FilterConfig::Stopwords { words: None })
                .with_filter(FilterConfig::Stemmer),
            "whitespace" => AnalyzerConfig::new(TokenizerConfig::Whitespace),
            "keyword" => AnalyzerConfig::new(TokenizerConfig::Keyword),
            _ => return None,
        };
        Some(config)
    }

    /// Build the analyzer described by this configuration.
    pub fn build(&self, name: &str) -> Result<PipelineAnalyzer> {
        let tokenizer: Arc<dyn Tokenizer> = match &self.tokenizer {
            TokenizerConfig::Standard { max_token_length } => {
                Arc::new(StandardTokenizer::with_max_token_length(*max_token_length)?)
            }
            TokenizerConfig::Whitespace => Arc::new(WhitespaceTokenizer::new()),
            TokenizerConfig::Keyword => Arc::new(KeywordTokenizer::new()),
            TokenizerConfig::Ngram { min_gram, max_gram } => {
                Arc::new(NgramTokenizer::new(*min_gram, *max_gram)?)
            }
        };

        let mut analyzer = PipelineAnalyzer::new(tokenizer).with_name(name);
        for filter in &self.filters {
            let filter: Arc<dyn Filter> = match filter {
                FilterConfig::Lowercase => Arc::new(LowercaseFilter::new()),
                FilterConfig::Stopwords { words: None } => Arc::new(StopFilter::english()),
                FilterConfig::Stopwords { words: Some(words) } => {
                    Arc::new(StopFilter::from_words(words))
                }
                FilterConfig::Stemmer => Arc::new(StemFilter::new()),
                FilterConfig::Length { min, max } => Arc::new(LengthFilter::new(*min, *max)?),
                FilterConfig::Trim => Arc::new(TrimFilter::new()),
                FilterConfig::AsciiFolding => Arc::new(AsciiFoldingFilter::new()),
                FilterConfig::Synonym { groups } => {
                    Arc::new(SynonymFilter::new(SynonymTable::from_groups(groups.clone())?))
                }
            };
            analyzer = analyzer.add_filter(filter);
        }
        Ok(analyzer)
    }
}
