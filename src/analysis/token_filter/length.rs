//! Token length filter.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::{QuarryError, Result};

/// Keeps tokens whose character count lies in `min..=max`.
#[derive(Clone, Debug)]
pub struct LengthFilter {
    min: usize,
    max: usize,
}

impl LengthFilter {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(QuarryError::analysis(format!(
                "length filter min ({min}) must be <= max ({max})"
            )));
        }
        Ok(LengthFilter { min, max })
    }
}

impl Filter for LengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let (min, max) = (self.min, self.max);
        Ok(Box::new(tokens.filter(move |token| {
            let len = token.text.chars().count();
            len >= min && len <= max
        })))
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_length_filter() {
        let filter = LengthFilter::new(2, 4).unwrap();
        let tokens = vec![
            Token::new("a", 0),
            Token::new("ab", 1),
            Token::new("ñañá", 2),
            Token::new("abcde", 3),
        ];
        let result: Vec<String> = filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .map(|t| t.text)
            .collect();
        assert_eq!(result, vec!["ab", "ñañá"]);

        assert!(LengthFilter::new(5, 1).is_err());
    }
}
