//! Token filters transform token streams produced by tokenizers.
//!
//! - [`lowercase::LowercaseFilter`] - Converts tokens to lowercase
//! - [`stop::StopFilter`] - Removes stop words
//! - [`stem::StemFilter`] - Reduces words to their stem (Porter)
//! - [`length::LengthFilter`] - Drops tokens outside a character length range
//! - [`trim::TrimFilter`] - Trims surrounding whitespace
//! - [`ascii_folding::AsciiFoldingFilter`] - Maps accented characters to ASCII
//! - [`synonym::SynonymFilter`] - Stacks synonyms on the same position
//!
//! Filters are chained in an analyzer:
//!
//! ```text
//! Tokenizer → Lowercase → Stop Words → Stemmer → Index
//! ```

pub mod ascii_folding;
pub mod length;
pub mod lowercase;
pub mod stem;
pub mod stop;
pub mod synonym;
pub mod trim;

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter.
    fn name(&self) -> &'static str;

    /// Whether this filter only normalizes characters of a token.
    ///
    /// Normalizing filters are the ones applied to the single terms of
    /// fuzzy, prefix, wildcard and range queries, which must not be
    /// tokenized, stemmed or expanded.
    fn is_normalizing(&self) -> bool {
        false
    }
}
