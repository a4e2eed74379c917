//! Character n-gram tokenizer.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::{QuarryError, Result};

/// Emits every run of `min_gram..=max_gram` characters.
///
/// Grams that start at the same character share a position, so the
/// position sequence follows the character sequence.
#[derive(Clone, Debug)]
pub struct NgramTokenizer {
    min_gram: usize,
    max_gram: usize,
}

impl NgramTokenizer {
    pub fn new(min_gram: usize, max_gram: usize) -> Result<Self> {
        if min_gram == 0 {
            return Err(QuarryError::analysis("min_gram must be at least 1"));
        }
        if max_gram < min_gram {
            return Err(QuarryError::analysis(format!(
                "max_gram ({max_gram}) must be >= min_gram ({min_gram})"
            )));
        }
        Ok(Self { min_gram, max_gram })
    }

    pub fn min_gram(&self) -> usize {
        self.min_gram
    }

    pub fn max_gram(&self) -> usize {
        self.max_gram
    }
}

impl Tokenizer for NgramTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        // Byte offset of every char boundary, including the end of the text.
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bounds.push(text.len());
        let char_count = bounds.len() - 1;

        let mut tokens = Vec::new();
        let mut position = 0;
        for start in 0..char_count {
            let mut first = true;
            for size in self.min_gram..=self.max_gram {
                let end = start + size;
                if end > char_count {
                    break;
                }
                let (s, e) = (bounds[start], bounds[end]);
                let increment = usize::from(first);
                let token = Token::with_offsets(&text[s..e], position, s, e)
                    .with_position_increment(increment);
                tokens.push(token);
                first = false;
            }
            if !first {
                position += 1;
            }
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "ngram"
    }
}
