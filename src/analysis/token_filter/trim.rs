//! Whitespace trimming filter.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Trims leading and trailing whitespace from tokens and drops tokens left
/// empty.
#[derive(Clone, Debug, Default)]
pub struct TrimFilter;

impl TrimFilter {
    pub fn new() -> Self {
        TrimFilter
    }
}

impl Filter for TrimFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.filter_map(|mut token| {
            let trimmed = token.text.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.len() != token.text.len() {
                token.text = trimmed.to_string();
            }
            Some(token)
        })))
    }

    fn name(&self) -> &'static str {
        "trim"
    }

    fn is_normalizing(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_trim_filter() {
        let filter = TrimFilter::new();
        let tokens = vec![Token::new("  New York ", 0), Token::new(" \t", 1)];
        let result: Vec<String> = filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .map(|t| t.text)
            .collect();
        assert_eq!(result, vec!["New York"]);
    }
}
