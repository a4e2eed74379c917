//! Stemming filter.

pub mod porter;

use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

use self::porter::PorterStemmer;

/// A word stemmer.
pub trait Stemmer: Send + Sync + std::fmt::Debug {
    /// Reduce a word to its stem. Words sharing a stem reduce to the same
    /// string.
    fn stem(&self, word: &str) -> String;

    fn name(&self) -> &'static str;
}

/// Replaces every token with its stem.
#[derive(Clone, Debug)]
pub struct StemFilter {
    stemmer: Arc<dyn Stemmer>,
}

impl StemFilter {
    /// A filter using the Porter stemmer.
    pub fn new() -> Self {
        StemFilter {
            stemmer: Arc::new(PorterStemmer::new()),
        }
    }

    pub fn with_stemmer(stemmer: Arc<dyn Stemmer>) -> Self {
        StemFilter { stemmer }
    }
}

impl Default for StemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StemFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let stemmer = Arc::clone(&self.stemmer);
        Ok(Box::new(tokens.map(move |mut token| {
            let stemmed = stemmer.stem(&token.text);
            if stemmed != token.text {
                token.text = stemmed;
            }
            token
        })))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}
