//! Unicode word tokenizer.

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::{QuarryError, Result};

/// Default maximum token length, in characters.
pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 255;

/// Splits text on Unicode word boundaries (UAX #29) and keeps the segments
/// that contain at least one alphanumeric character.
///
/// Words longer than `max_token_length` characters are split into chunks
/// of that length.
#[derive(Clone, Debug)]
pub struct StandardTokenizer {
    max_token_length: usize,
}

impl StandardTokenizer {
    pub fn new() -> Self {
        StandardTokenizer {
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
        }
    }

    pub fn with_max_token_length(max_token_length: usize) -> Result<Self> {
        if max_token_length == 0 {
            return Err(QuarryError::analysis("max_token_length must be at least 1"));
        }
        Ok(StandardTokenizer { max_token_length })
    }

    pub fn max_token_length(&self) -> usize {
        self.max_token_length
    }
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut position = 0;

        for (start, word) in text.split_word_bound_indices() {
            if !word.chars().any(|c| c.is_alphanumeric()) {
                continue;
            }

            let mut chunk_start = start;
            let mut chars_in_chunk = 0;
            for (offset, _) in word.char_indices() {
                if chars_in_chunk == self.max_token_length {
                    let end = start + offset;
                    tokens.push(Token::with_offsets(
                        &text[chunk_start..end],
                        position,
                        chunk_start,
                        end,
                    ));
                    position += 1;
                    chunk_start = end;
                    chars_in_chunk = 0;
                }
                chars_in_chunk += 1;
            }

            let end = start + word.len();
            tokens.push(Token::with_offsets(
                &text[chunk_start..end],
                position,
                chunk_start,
                end,
            ));
            position += 1;
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokenizer: &StandardTokenizer, text: &str) -> Vec<String> {
        tokenizer.tokenize(text).unwrap().map(|t| t.text).collect()
    }

    #[test]
    fn test_standard_tokenizer() {
        let tokenizer = StandardTokenizer::new();
        assert_eq!(
            texts(&tokenizer, "Wireless Bluetooth Headphones"),
            vec!["Wireless", "Bluetooth", "Headphones"]
        );
        assert_eq!(texts(&tokenizer, "USB-C Cable!"), vec!["USB", "C", "Cable"]);
        assert!(texts(&tokenizer, " ,.; ").is_empty());
    }

    #[test]
    fn test_offsets() {
        let tokenizer = StandardTokenizer::new();
        let text = "héllo, wörld";
        let tokens: Vec<Token> = tokenizer.tokenize(text).unwrap().collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(&text[tokens[0].start_offset..tokens[0].end_offset], "héllo");
        assert_eq!(&text[tokens[1].start_offset..tokens[1].end_offset], "wörld");
        assert_eq!(tokens[1].position, 1);
    }

    #[test]
    fn test_max_token_length() {
        let tokenizer = StandardTokenizer::with_max_token_length(4).unwrap();
        assert_eq!(texts(&tokenizer, "abcdefghij xy"), vec!["abcd", "efgh", "ij", "xy"]);
        assert!(StandardTokenizer::with_max_token_length(0).is_err());
    }
}
