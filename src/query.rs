//! Query AST, fluent builder and the query-string parser.
//!
//! # Examples
//!
//! ```
//! use quarry::query::{Query, QueryBuilder};
//! use quarry::query::parser::QueryParser;
//!
//! let parser = QueryParser::new(["title"]);
//! let query = parser.parse("wireless AND -cable").unwrap();
//! assert_eq!(query.to_string(), "(+title:wireless -title:cable)");
//!
//! let built = QueryBuilder::new()
//!     .must_match("title", "wireless")
//!     .must_not_match("title", "cable")
//!     .build()
//!     .unwrap();
//! assert_eq!(built, query);
//! ```

pub mod fuzzy;
pub mod parser;
pub mod wildcard;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};

pub use parser::QueryParser;

/// A node of the query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// Documents containing the term. Text values are analyzed first; a
    /// value that analyzes to several tokens matches them as an exact phrase.
    Term { field: String, value: String },

    /// Documents containing the terms in order, with at most `slop` total
    /// positional displacement.
    Phrase {
        field: String,
        terms: Vec<String>,
        #[serde(default)]
        slop: u32,
    },

    /// Documents containing a term within `max_distance` edits.
    Fuzzy {
        field: String,
        term: String,
        max_distance: u32,
    },

    Prefix { field: String, prefix: String },

    /// `*` matches any run of characters and `?` exactly one.
    Wildcard { field: String, pattern: String },

    /// Documents with a value between the bounds; `None` is open.
    Range {
        field: String,
        lower: Option<String>,
        upper: Option<String>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    },

    /// With no `must` clause at least one `should` clause has to match; with
    /// neither, nothing matches.
    Boolean {
        #[serde(default)]
        must: Vec<Query>,
        #[serde(default)]
        should: Vec<Query>,
        #[serde(default)]
        must_not: Vec<Query>,
    },

    MatchAll,
}

impl Query {
    pub fn term<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn phrase<F, I, S>(field: F, terms: I, slop: u32) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Phrase {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            slop,
        }
    }

    pub fn fuzzy<F: Into<String>, T: Into<String>>(field: F, term: T, max_distance: u32) -> Self {
        Query::Fuzzy {
            field: field.into(),
            term: term.into(),
            max_distance,
        }
    }

    pub fn prefix<F: Into<String>, P: Into<String>>(field: F, prefix: P) -> Self {
        Query::Prefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn wildcard<F: Into<String>, P: Into<String>>(field: F, pattern: P) -> Self {
        Query::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Range with both bounds inclusive.
    pub fn range<F: Into<String>>(field: F, lower: Option<&str>, upper: Option<&str>) -> Self {
        Query::Range {
            field: field.into(),
            lower: lower.map(str::to_string),
            upper: upper.map(str::to_string),
            lower_inclusive: true,
            upper_inclusive: true,
        }
    }

    pub fn boolean(must: Vec<Query>, should: Vec<Query>, must_not: Vec<Query>) -> Self {
        Query::Boolean {
            must,
            should,
            must_not,
        }
    }

    pub fn match_all() -> Self {
        Query::MatchAll
    }

    /// Field the leaf targets; `None` for Boolean and MatchAll.
    pub fn field(&self) -> Option<&str> {
        match self {
            Query::Term { field, .. }
            | Query::Phrase { field, .. }
            | Query::Fuzzy { field, .. }
            | Query::Prefix { field, .. }
            | Query::Wildcard { field, .. }
            | Query::Range { field, .. } => Some(field),
            Query::Boolean { .. } | Query::MatchAll => None,
        }
    }
}

const SPECIAL_CHARS: &[char] = &[
    '\\', '(', ')', '"', ':', '[', ']', '{', '}', '~', '*', '?', '+', '-', '!', '&', '|',
];

/// Escape a literal so the parser reads it back as a single plain term.
pub fn escape_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    if matches!(term, "AND" | "OR" | "NOT") {
        out.push('\\');
    }
    for c in term.chars() {
        if c.is_whitespace() || SPECIAL_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a wildcard pattern, keeping `*`, `?` and existing escapes.
fn escape_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' | '?' => out.push(c),
            c if c.is_whitespace() || SPECIAL_CHARS.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Render a range bound; bounds the bare form cannot carry are quoted.
fn escape_bound(bound: &Option<String>) -> String {
    let Some(b) = bound else {
        return "*".to_string();
    };
    let needs_quotes = b.is_empty()
        || b == "*"
        || b.starts_with('"')
        || b.contains(|c: char| c.is_whitespace() || matches!(c, ']' | '}'));
    if needs_quotes {
        format!("\"{}\"", b.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        b.clone()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term { field, value } => write!(f, "{field}:{}", escape_term(value)),
            Query::Phrase { field, terms, slop } => {
                let text = terms.join(" ").replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "{field}:\"{text}\"")?;
                if *slop > 0 {
                    write!(f, "~{slop}")?;
                }
                Ok(())
            }
            Query::Fuzzy {
                field,
                term,
                max_distance,
            } => write!(f, "{field}:{}~{max_distance}", escape_term(term)),
            Query::Prefix { field, prefix } => write!(f, "{field}:{}*", escape_term(prefix)),
            Query::Wildcard { field, pattern } => write!(f, "{field}:{}", escape_pattern(pattern)),
            Query::Range {
                field,
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => write!(
                f,
                "{field}:{}{} TO {}{}",
                if *lower_inclusive { '[' } else { '{' },
                escape_bound(lower),
                escape_bound(upper),
                if *upper_inclusive { ']' } else { '}' },
            ),
            Query::Boolean {
                must,
                should,
                must_not,
            } => {
                f.write_str("(")?;
                let clauses = must
                    .iter()
                    .map(|q| format!("+{q}"))
                    .chain(should.iter().map(|q| q.to_string()))
                    .chain(must_not.iter().map(|q| format!("-{q}")))
                    .collect::<Vec<_>>();
                f.write_str(&clauses.join(" "))?;
                f.write_str(")")
            }
            Query::MatchAll => f.write_str("*:*"),
        }
    }
}

/// Fluent construction of a Boolean query.
///
/// A builder with a single `must` or `should` clause builds that clause
/// itself.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    must: Vec<Query>,
    should: Vec<Query>,
    must_not: Vec<Query>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_match<F: Into<String>, V: Into<String>>(self, field: F, value: V) -> Self {
        self.must(Query::term(field, value))
    }

    pub fn should_match<F: Into<String>, V: Into<String>>(self, field: F, value: V) -> Self {
        self.should(Query::term(field, value))
    }

    pub fn must_not_match<F: Into<String>, V: Into<String>>(self, field: F, value: V) -> Self {
        self.must_not(Query::term(field, value))
    }

    /// Add an optional fuzzy clause.
    pub fn fuzzy<F: Into<String>, T: Into<String>>(self, field: F, term: T, max_distance: u32) -> Self {
        self.should(Query::fuzzy(field, term, max_distance))
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn build(mut self) -> Result<Query> {
        if self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty() {
            return Err(QuarryError::invalid_argument("query builder has no clauses"));
        }
        if self.must_not.is_empty() && self.must.len() + self.should.len() == 1 {
            if let Some(query) = self.must.pop().or_else(|| self.should.pop()) {
                return Ok(query);
            }
        }
        Ok(Query::Boolean {
            must: self.must,
            should: self.should,
            must_not: self.must_not,
        })
    }
}
