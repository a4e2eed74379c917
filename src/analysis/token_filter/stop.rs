//! Stop word filter.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

static ENGLISH_STOP_WORDS: LazyLock<Arc<HashSet<String>>> = LazyLock::new(|| {
    Arc::new(
        DEFAULT_ENGLISH_STOP_WORDS
            .iter()
            .map(|w| w.to_string())
            .collect(),
    )
});

/// Drops tokens found in a stop word set. Matching is case-insensitive.
#[derive(Clone, Debug)]
pub struct StopFilter {
    stop_words: Arc<HashSet<String>>,
}

impl StopFilter {
    /// A filter over the default English stop words.
    pub fn english() -> Self {
        StopFilter {
            stop_words: Arc::clone(&ENGLISH_STOP_WORDS),
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StopFilter {
            stop_words: Arc::new(
                words
                    .into_iter()
                    .map(|w| w.as_ref().to_lowercase())
                    .collect(),
            ),
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        if self.stop_words.contains(word) {
            return true;
        }
        word.chars().any(|c| c.is_uppercase()) && self.stop_words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

impl Default for StopFilter {
    fn default() -> Self {
        Self::english()
    }
}

impl Filter for StopFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filter = self.clone();
        Ok(Box::new(
            tokens.filter(move |token| !filter.is_stop_word(&token.text)),
        ))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_stop_filter() {
        let filter = StopFilter::english();
        let tokens = vec![
            Token::new("The", 0),
            Token::new("quick", 1),
            Token::new("and", 2),
            Token::new("fox", 3),
        ];
        let result: Vec<String> = filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(result, vec!["quick", "fox"]);
    }

    #[test]
    fn test_custom_stop_words() {
        let filter = StopFilter::from_words(["Foo", "bar"]);
        assert_eq!(filter.len(), 2);
        assert!(filter.is_stop_word("foo"));
        assert!(filter.is_stop_word("BAR"));
        assert!(!filter.is_stop_word("baz"));
    }
}
