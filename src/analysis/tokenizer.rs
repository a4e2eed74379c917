//! Tokenizers split raw text into tokens.
//!
//! - [`standard::StandardTokenizer`] - Unicode word boundaries with a maximum token length
//! - [`whitespace::WhitespaceTokenizer`] - Splits on whitespace only
//! - [`keyword::KeywordTokenizer`] - Emits the whole input as one token
//! - [`ngram::NgramTokenizer`] - Overlapping character n-grams
//!
//! # Examples
//!
//! ```
//! use quarry::analysis::tokenizer::Tokenizer;
//! use quarry::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

pub mod keyword;
pub mod ngram;
pub mod standard;
pub mod whitespace;

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokenizers must set byte offsets into the input on every token they
/// emit.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer.
    fn name(&self) -> &'static str;
}
