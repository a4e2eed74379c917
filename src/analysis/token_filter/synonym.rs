//! Synonym expansion filter.
//!
//! A synonym table is a list of groups of equivalent single-token terms:
//!
//! ```json
//! [["tv", "television"], ["laptop", "notebook"]]
//! ```
//!
//! A token found in a group is followed by every other member of the group
//! at the same position, so phrase and term queries on any member match.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::{QuarryError, Result};

/// Lookup table from a term to its synonym group.
#[derive(Clone, Debug, Default)]
pub struct SynonymTable {
    groups: Vec<Vec<String>>,
    lookup: HashMap<String, usize>,
}

impl SynonymTable {
    pub fn from_groups(groups: Vec<Vec<String>>) -> Result<Self> {
        let mut lookup = HashMap::new();
        for (index, group) in groups.iter().enumerate() {
            for term in group {
                if term.is_empty() || term.chars().any(char::is_whitespace) {
                    return Err(QuarryError::analysis(format!(
                        "synonym '{term}' must be a single non-empty token"
                    )));
                }
                if lookup.insert(term.clone(), index).is_some() {
                    return Err(QuarryError::analysis(format!(
                        "synonym '{term}' appears in more than one group"
                    )));
                }
            }
        }
        Ok(SynonymTable { groups, lookup })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let groups: Vec<Vec<String>> = serde_json::from_str(json)?;
        Self::from_groups(groups)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The group containing `term`, if any.
    pub fn group(&self, term: &str) -> Option<&[String]> {
        self.lookup
            .get(term)
            .map(|index| self.groups[*index].as_slice())
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Expands tokens with their synonyms, stacked on the same position.
#[derive(Clone, Debug)]
pub struct SynonymFilter {
    table: Arc<SynonymTable>,
}

impl SynonymFilter {
    pub fn new(table: SynonymTable) -> Self {
        SynonymFilter {
            table: Arc::new(table),
        }
    }
}

impl Filter for SynonymFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let table = Arc::clone(&self.table);
        Ok(Box::new(tokens.flat_map(move |token| {
            let mut expanded = Vec::with_capacity(1);
            if let Some(group) = table.group(&token.text) {
                let synonyms: Vec<Token> = group
                    .iter()
                    .filter(|term| **term != token.text)
                    .map(|term| token.with_text(term.as_str()).with_position_increment(0))
                    .collect();
                expanded.push(token);
                expanded.extend(synonyms);
            } else {
                expanded.push(token);
            }
            expanded
        })))
    }

    fn name(&self) -> &'static str {
        "synonym"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_expansion() {
        let table = SynonymTable::from_json(r#"[["tv","television"],["laptop","notebook"]]"#)
            .unwrap();
        let filter = SynonymFilter::new(table);
        let tokens = vec![Token::new("cheap", 0), Token::new("tv", 1)];
        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 3);
        assert_eq!(result[1].text, "tv");
        assert_eq!(result[2].text, "television");
        assert_eq!(result[2].position_increment, 0);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(SynonymTable::from_groups(vec![vec!["a b".into()]]).is_err());
        assert!(
            SynonymTable::from_groups(vec![vec!["a".into()], vec!["a".into(), "c".into()]])
                .is_err()
        );
    }
}
