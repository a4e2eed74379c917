//! Wildcard and prefix expansion against a term dictionary.

use std::collections::BTreeMap;
use std::ops::Bound;

use regex::Regex;

use crate::error::{QuarryError, Result};
use crate::search::options::Deadline;

/// Dictionary entries visited between deadline checks.
pub const CHECK_INTERVAL: usize = 256;

/// A compiled wildcard pattern.
///
/// `*` matches zero or more characters and `?` exactly one. `\*`, `\?` and
/// `\\` match the literal character. Patterns are anchored at both ends.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pattern: String,
    regex: Regex,
    literal_prefix: String,
}

impl WildcardPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let mut regex_pattern = String::from("^(?s:");
        let mut literal_prefix = String::new();
        let mut in_prefix = true;

        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars.next().unwrap_or('\\');
                    regex_pattern.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
                    if in_prefix {
                        literal_prefix.push(escaped);
                    }
                }
                '*' => {
                    regex_pattern.push_str(".*");
                    in_prefix = false;
                }
                '?' => {
                    regex_pattern.push('.');
                    in_prefix = false;
                }
                c => {
                    regex_pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                    if in_prefix {
                        literal_prefix.push(c);
                    }
                }
            }
        }
        regex_pattern.push_str(")$");

        let regex = Regex::new(&regex_pattern).map_err(|e| {
            QuarryError::invalid_argument(format!("invalid wildcard pattern '{pattern}': {e}"))
        })?;

        Ok(WildcardPattern {
            pattern: pattern.to_string(),
            regex,
            literal_prefix,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Leading characters every match starts with.
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    pub fn matches(&self, term: &str) -> bool {
        self.regex.is_match(term)
    }
}

/// Terms matching `pattern`, in dictionary order, at most `limit` of them.
pub fn expand_wildcard<'a, V>(
    terms: &'a BTreeMap<String, V>,
    pattern: &WildcardPattern,
    limit: usize,
    deadline: &Deadline,
) -> Result<Vec<&'a str>> {
    let prefix = pattern.literal_prefix();
    let mut matched = Vec::new();
    for (visited, (term, _)) in terms
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .enumerate()
    {
        if visited % CHECK_INTERVAL == CHECK_INTERVAL - 1 {
            deadline.check()?;
        }
        if !term.starts_with(prefix) {
            break;
        }
        if pattern.matches(term) {
            if matched.len() == limit {
                log::warn!("wildcard '{}' truncated at {limit} terms", pattern.pattern());
                break;
            }
            matched.push(term.as_str());
        }
    }
    Ok(matched)
}

/// Terms starting with `prefix`, in dictionary order, at most `limit` of
/// them.
pub fn expand_prefix<'a, V>(
    terms: &'a BTreeMap<String, V>,
    prefix: &str,
    limit: usize,
    deadline: &Deadline,
) -> Result<Vec<&'a str>> {
    let mut matched = Vec::new();
    for (visited, (term, _)) in terms
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .enumerate()
    {
        if visited % CHECK_INTERVAL == CHECK_INTERVAL - 1 {
            deadline.check()?;
        }
        if !term.starts_with(prefix) {
            break;
        }
        if matched.len() == limit {
            log::warn!("prefix '{prefix}' truncated at {limit} terms");
            break;
        }
        matched.push(term.as_str());
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(terms: &[&str]) -> BTreeMap<String, ()> {
        terms.iter().map(|t| (t.to_string(), ())).collect()
    }

    #[test]
    fn test_pattern_matching() {
        let pattern = WildcardPattern::new("wire*s").unwrap();
        assert!(pattern.matches("wireless"));
        assert!(pattern.matches("wires"));
        assert!(!pattern.matches("wired"));
        assert_eq!(pattern.literal_prefix(), "wire");

        let single = WildcardPattern::new("c?t").unwrap();
        assert!(single.matches("cat"));
        assert!(!single.matches("cart"));
        assert_eq!(single.literal_prefix(), "c");

        let literal = WildcardPattern::new(r"a\*b.c").unwrap();
        assert!(literal.matches("a*b.c"));
        assert!(!literal.matches("axb.c"));
        assert!(!literal.matches("a*bxc"));
    }

    #[test]
    fn test_expand() {
        let dict = dictionary(&["cable", "cat", "cater", "cot", "dog", "wire", "wireless"]);
        let deadline = Deadline::none();

        let pattern = WildcardPattern::new("c?t*").unwrap();
        assert_eq!(
            expand_wildcard(&dict, &pattern, 10, &deadline).unwrap(),
            vec!["cat", "cater", "cot"]
        );
        assert_eq!(
            expand_wildcard(&dict, &pattern, 2, &deadline).unwrap(),
            vec!["cat", "cater"]
        );

        assert_eq!(
            expand_prefix(&dict, "wire", 10, &deadline).unwrap(),
            vec!["wire", "wireless"]
        );
        assert!(expand_prefix(&dict, "zebra", 10, &deadline).unwrap().is_empty());
    }
}
