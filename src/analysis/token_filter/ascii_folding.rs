//! ASCII folding filter.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Maps accented and other Latin characters to their ASCII base form.
///
/// Characters are decomposed (NFD) and combining marks dropped; letters
/// with no decomposition (`ß`, `æ`, `ø`, ...) use a fixed table. Anything
/// else is kept as is.
#[derive(Clone, Debug, Default)]
pub struct AsciiFoldingFilter;

impl AsciiFoldingFilter {
    pub fn new() -> Self {
        AsciiFoldingFilter
    }

    pub fn fold(text: &str) -> String {
        if text.is_ascii() {
            return text.to_string();
        }
        let mut folded = String::with_capacity(text.len());
        for c in text.nfd() {
            if is_combining_mark(c) {
                continue;
            }
            match special_fold(c) {
                Some(replacement) => folded.push_str(replacement),
                None => folded.push(c),
            }
        }
        folded
    }
}

fn special_fold(c: char) -> Option<&'static str> {
    let replacement = match c {
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'ø' => "o",
        'Ø' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'đ' => "d",
        'Đ' => "D",
        'ł' => "l",
        'Ł' => "L",
        'þ' => "th",
        'Þ' => "TH",
        'ð' => "d",
        'Ð' => "D",
        'ı' => "i",
        _ => return None,
    };
    Some(replacement)
}

impl Filter for AsciiFoldingFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.map(|mut token| {
            if !token.text.is_ascii() {
                token.text = AsciiFoldingFilter::fold(&token.text);
            }
            token
        })))
    }

    fn name(&self) -> &'static str {
        "ascii_folding"
    }

    fn is_normalizing(&self) -> bool {
        true
    }
}
