//! Analyzers combine a tokenizer with an ordered filter chain.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use quarry::analysis::analyzer::{Analyzer, PipelineAnalyzer};
//! use quarry::analysis::token_filter::lowercase::LowercaseFilter;
//! use quarry::analysis::token_filter::stop::StopFilter;
//! use quarry::analysis::tokenizer::standard::StandardTokenizer;
//!
//! let analyzer = PipelineAnalyzer::new(Arc::new(StandardTokenizer::new()))
//!     .add_filter(Arc::new(LowercaseFilter::new()))
//!     .add_filter(Arc::new(StopFilter::from_words(["the", "and"])))
//!     .with_name("my_analyzer");
//!
//! let tokens: Vec<_> = analyzer.analyze("Hello THE world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[1].text, "world");
//! assert_eq!(tokens[1].position, 1);
//! ```

pub mod config;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// Converts raw text into a positioned token stream.
pub trait Analyzer: Send + Sync + fmt::Debug {
    /// Analyze text. Token positions are dense: a token either advances the
    /// position by one or shares the previous token's position.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Apply only the character-normalizing filters to a single term.
    fn normalize(&self, term: &str) -> Result<String>;

    fn name(&self) -> &str;

    /// Analyze text into a vector.
    fn tokens(&self, text: &str) -> Result<Vec<Token>> {
        Ok(self.analyze(text)?.collect())
    }
}

/// A tokenizer followed by filters applied in the order they were added.
#[derive(Clone)]
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn Filter>>,
    name: String,
}

impl PipelineAnalyzer {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            name: format!("pipeline_{}", tokenizer.name()),
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn add_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = self.tokenizer.tokenize(text)?;
        for filter in &self.filters {
            tokens = filter.filter(tokens)?;
        }

        // Filters may drop tokens; close the gaps so positions stay dense.
        let mut last: Option<usize> = None;
        Ok(Box::new(tokens.map(move |mut token| {
            let position = match last {
                None => 0,
                Some(p) => p + token.position_increment.min(1),
            };
            last = Some(position);
            token.position = position;
            token
        })))
    }

    fn normalize(&self, term: &str) -> Result<String> {
        let mut tokens: TokenStream =
            Box::new(std::iter::once(Token::with_offsets(term, 0, 0, term.len())));
        for filter in self.filters.iter().filter(|f| f.is_normalizing()) {
            tokens = filter.filter(tokens)?;
        }
        Ok(tokens.next().map(|t| t.text).unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for PipelineAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineAnalyzer")
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.name())
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
