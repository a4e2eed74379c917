//! Query-string parser.
//!
//! Supported syntax:
//! - Terms: `wireless`, field-specific terms: `title:wireless`
//! - Phrases: `"wireless headphones"`, with slop: `"wireless headphones"~2`
//! - Fuzzy terms: `wireles~` (distance 2) or `wireles~1`
//! - Wildcards: `wire*` (prefix), `c?t`, `*less`
//! - Ranges: `price:[10 TO 100]`, `price:{10 TO 100]`, `date:[2024-01-01 TO *]`
//! - Modifiers: `+required`, `-forbidden`, `NOT forbidden`, `!forbidden`
//! - Operators: `AND` / `&&`, `OR` / `||`, `NOT` / `!`
//! - Groups: `(a OR b) AND c`, `title:(a b)`
//! - Match everything: `*:*`
//! - Backslash escapes: `usb\-c`, `a\*b`
//!
//! `AND` binds tighter than `OR`, which binds tighter than the implicit OR
//! between adjacent clauses. Bare terms search the parser's default fields.

use crate::error::{QuarryError, Result};
use crate::query::Query;
use crate::query::fuzzy::MAX_FUZZY_DISTANCE;

const DEFAULT_FUZZY_DISTANCE: u32 = 2;

/// Parses query strings against a set of default fields.
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    default_fields: Vec<String>,
}

impl QueryParser {
    pub fn new<I, S>(default_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryParser {
            default_fields: default_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn default_fields(&self) -> &[String] {
        &self.default_fields
    }

    /// Parse a query string.
    ///
    /// Errors carry the offending token and its character position; nothing
    /// is evaluated until the whole string has parsed.
    pub fn parse(&self, query_str: &str) -> Result<Query> {
        let mut parser = QueryStringParser::new(query_str, &self.default_fields);
        parser.skip_whitespace();
        if parser.at_end() {
            return Err(QuarryError::query_syntax("empty query", "", 0));
        }
        let query = parser.parse_sequence(false)?;
        parser.skip_whitespace();
        if let Some(c) = parser.peek() {
            return Err(parser.error_here(format!("unexpected '{c}'"), c.to_string()));
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occur {
    Must,
    Should,
    MustNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    Not,
}

/// A bare word as read from the input.
#[derive(Debug, Default)]
struct Word {
    /// Unescaped text.
    text: String,
    /// Wildcard pattern form: literal `*`, `?` and `\` stay escaped.
    pattern: String,
    /// Unescaped `*` and `?` characters.
    wildcards: usize,
    /// Whether the only wildcard is an unescaped trailing `*`.
    trailing_star: bool,
}

struct QueryStringParser<'a> {
    chars: Vec<char>,
    pos: usize,
    default_fields: &'a [String],
    /// Field applied to bare terms inside a `field:( ... )` group.
    group_field: Option<String>,
}

impl<'a> QueryStringParser<'a> {
    fn new(input: &str, default_fields: &'a [String]) -> Self {
        QueryStringParser {
            chars: input.chars().collect(),
            pos: 0,
            default_fields,
            group_field: None,
        }
    }

    /// Clauses up to the end of input, or up to `)` inside a group.
    fn parse_sequence(&mut self, in_group: bool) -> Result<Query> {
        let mut clauses = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(')') if in_group => break,
                Some(')') => return Err(self.error_here("unbalanced ')'", ")")),
                Some(_) => clauses.push(self.parse_or_expression()?),
            }
        }

        if clauses.len() == 1 {
            let (occur, query) = clauses.remove(0);
            return Ok(match occur {
                Occur::MustNot => Query::boolean(vec![], vec![], vec![query]),
                _ => query,
            });
        }
        if clauses.is_empty() {
            return Err(self.error_here("empty group", ")"));
        }

        let (mut must, mut should, mut must_not) = (Vec::new(), Vec::new(), Vec::new());
        for (occur, query) in clauses {
            match occur {
                Occur::Must => must.push(query),
                Occur::Should => should.push(query),
                Occur::MustNot => must_not.push(query),
            }
        }
        Ok(Query::boolean(must, should, must_not))
    }

    fn parse_or_expression(&mut self) -> Result<(Occur, Query)> {
        let mut operands = vec![self.parse_and_expression()?];
        while self.eat_operator(Operator::Or) {
            operands.push(self.parse_and_expression()?);
        }
        if operands.len() == 1 {
            return Ok(operands.remove(0));
        }

        let should = operands
            .into_iter()
            .map(|(occur, query)| match occur {
                // `a OR NOT b`: everything without b.
                Occur::MustNot => Query::boolean(vec![Query::MatchAll], vec![], vec![query]),
                _ => query,
            })
            .collect();
        Ok((Occur::Should, Query::boolean(vec![], should, vec![])))
    }

    fn parse_and_expression(&mut self) -> Result<(Occur, Query)> {
        let mut operands = vec![self.parse_unary()?];
        loop {
            if self.eat_operator(Operator::And) {
                operands.push(self.parse_unary()?);
            } else if self.eat_operator(Operator::Not) {
                operands.push((Occur::MustNot, self.parse_primary()?));
            } else {
                break;
            }
        }
        if operands.len() == 1 {
            return Ok(operands.remove(0));
        }

        let (mut must, mut must_not) = (Vec::new(), Vec::new());
        for (occur, query) in operands {
            match occur {
                Occur::MustNot => must_not.push(query),
                _ => must.push(query),
            }
        }
        Ok((Occur::Should, Query::boolean(must, vec![], must_not)))
    }

    fn parse_unary(&mut self) -> Result<(Occur, Query)> {
        self.skip_whitespace();
        let occur = match self.peek() {
            Some('+') => {
                self.pos += 1;
                Occur::Must
            }
            Some('-') => {
                self.pos += 1;
                Occur::MustNot
            }
            _ if self.eat_operator(Operator::Not) => Occur::MustNot,
            _ => Occur::Should,
        };
        Ok((occur, self.parse_primary()?))
    }

    fn parse_primary(&mut self) -> Result<Query> {
        self.skip_whitespace();
        let Some(c) = self.peek() else {
            return Err(self.error_here("expected a clause", ""));
        };

        match c {
            '(' => self.parse_group(None),
            '"' => {
                let field = self.group_field.clone();
                self.parse_phrase(field)
            }
            ')' | ':' | '[' | ']' | '{' | '}' | '~' => {
                Err(self.error_here(format!("unexpected '{c}'"), c.to_string()))
            }
            _ => {
                if self.looking_at_match_all() {
                    self.pos += 3;
                    return Ok(Query::MatchAll);
                }
                if let Some((keyword, _)) = self.peek_operator() {
                    return Err(self.error_here(
                        format!("expected a clause, found operator '{keyword}'"),
                        keyword,
                    ));
                }

                let start = self.pos;
                let word = self.read_word()?;
                if self.peek() == Some(':') {
                    return self.parse_field_clause(word, start);
                }
                let field = self.group_field.clone();
                self.term_clause(field, word, start)
            }
        }
    }

    /// Everything after `field:`.
    fn parse_field_clause(&mut self, word: Word, start: usize) -> Result<Query> {
        if word.wildcards > 0 || word.text.is_empty() {
            return Err(QuarryError::query_syntax(
                "invalid field name",
                word.text,
                start,
            ));
        }
        let field = word.text;
        self.pos += 1;

        match self.peek() {
            Some('(') => self.parse_group(Some(field)),
            Some('"') => self.parse_phrase(Some(field)),
            Some('[') | Some('{') => self.parse_range(field),
            Some(c) if c.is_whitespace() => {
                Err(self.error_here(format!("expected a value after '{field}:'"), field))
            }
            None => Err(self.error_here(format!("expected a value after '{field}:'"), field)),
            Some(_) => {
                let value_start = self.pos;
                let value = self.read_word()?;
                if self.peek() == Some(':') {
                    return Err(self.error_here("unexpected ':'", ":"));
                }
                self.term_clause(Some(field), value, value_start)
            }
        }
    }

    fn parse_group(&mut self, field: Option<String>) -> Result<Query> {
        let open = self.pos;
        self.pos += 1;

        let saved = match field {
            Some(f) => self.group_field.replace(f),
            None => self.group_field.clone(),
        };
        let result = self.parse_sequence(true);
        self.group_field = saved;
        let query = result?;

        if self.peek() != Some(')') {
            return Err(QuarryError::query_syntax("unclosed group", "(", open));
        }
        self.pos += 1;
        Ok(query)
    }

    fn parse_phrase(&mut self, field: Option<String>) -> Result<Query> {
        let open = self.pos;
        self.pos += 1;

        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(QuarryError::query_syntax("unterminated phrase", "\"", open)),
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => text.push(c),
                        None => return Err(self.error_here("dangling escape", "\\")),
                    }
                    self.pos += 1;
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }

        let terms: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if terms.is_empty() {
            return Err(QuarryError::query_syntax("empty phrase", "\"\"", open));
        }

        let slop = if self.peek() == Some('~') {
            self.pos += 1;
            match self.read_number()? {
                Some(n) => n,
                None => return Err(self.error_here("expected a slop after '~'", "~")),
            }
        } else {
            0
        };
        self.expect_clause_end("phrase")?;

        self.for_fields(field, open, "phrase", |field| Query::Phrase {
            field,
            terms: terms.clone(),
            slop,
        })
    }

    fn parse_range(&mut self, field: String) -> Result<Query> {
        let open = self.pos;
        let lower_inclusive = self.peek() == Some('[');
        self.pos += 1;

        self.skip_whitespace();
        let lower = self.read_bound(open)?;
        self.skip_whitespace();
        if !self.looking_at_keyword("TO") {
            let token = self.peek().map(String::from).unwrap_or_default();
            return Err(self.error_here("expected 'TO' in range", token));
        }
        self.pos += 2;
        self.skip_whitespace();
        let upper = self.read_bound(open)?;
        self.skip_whitespace();

        let upper_inclusive = match self.peek() {
            Some(']') => true,
            Some('}') => false,
            _ => return Err(QuarryError::query_syntax("unclosed range", "[", open)),
        };
        self.pos += 1;

        Ok(Query::Range {
            field,
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        })
    }

    /// One range bound; `*` is open.
    fn read_bound(&mut self, open: usize) -> Result<Option<String>> {
        if self.peek() == Some('"') {
            let quote = self.pos;
            self.pos += 1;
            let mut bound = String::new();
            loop {
                match self.peek() {
                    None => return Err(QuarryError::query_syntax("unterminated bound", "\"", quote)),
                    Some('"') => {
                        self.pos += 1;
                        return Ok(Some(bound));
                    }
                    Some('\\') => {
                        self.pos += 1;
                        let Some(c) = self.peek() else {
                            return Err(self.error_here("dangling escape", "\\"));
                        };
                        bound.push(c);
                        self.pos += 1;
                    }
                    Some(c) => {
                        bound.push(c);
                        self.pos += 1;
                    }
                }
            }
        }

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ']' | '}') {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(QuarryError::query_syntax("missing range bound", "[", open));
        }
        let bound: String = self.chars[start..self.pos].iter().collect();
        Ok((bound != "*").then_some(bound))
    }

    /// Build the query for a word: term, fuzzy, prefix or wildcard.
    fn term_clause(&mut self, field: Option<String>, word: Word, start: usize) -> Result<Query> {
        if self.peek() == Some('~') {
            self.pos += 1;
            if word.wildcards > 0 {
                return Err(QuarryError::query_syntax(
                    "fuzzy terms cannot contain wildcards",
                    word.text,
                    start,
                ));
            }
            let distance = self.read_number()?.unwrap_or(DEFAULT_FUZZY_DISTANCE);
            if distance > MAX_FUZZY_DISTANCE {
                return Err(QuarryError::query_syntax(
                    format!("fuzzy distance must be at most {MAX_FUZZY_DISTANCE}"),
                    distance.to_string(),
                    start,
                ));
            }
            self.expect_clause_end("fuzzy term")?;
            let term = word.text;
            return self.for_fields(field, start, &term, |field| Query::Fuzzy {
                field,
                term: term.clone(),
                max_distance: distance,
            });
        }

        let token = word.text.clone();
        if word.wildcards == 0 {
            let value = word.text;
            return self.for_fields(field, start, &token, |field| Query::Term {
                field,
                value: value.clone(),
            });
        }
        if word.trailing_star {
            let mut prefix = word.text;
            prefix.pop();
            return self.for_fields(field, start, &token, |field| Query::Prefix {
                field,
                prefix: prefix.clone(),
            });
        }
        let pattern = word.pattern;
        self.for_fields(field, start, &token, |field| Query::Wildcard {
            field,
            pattern: pattern.clone(),
        })
    }

    /// Apply a leaf to an explicit field, or to every default field.
    fn for_fields<F>(&self, field: Option<String>, start: usize, token: &str, build: F) -> Result<Query>
    where
        F: Fn(String) -> Query,
    {
        if let Some(field) = field {
            return Ok(build(field));
        }
        match self.default_fields {
            [] => Err(QuarryError::query_syntax(
                "no field given and no default fields configured",
                token,
                start,
            )),
            [only] => Ok(build(only.clone())),
            fields => Ok(Query::boolean(
                vec![],
                fields.iter().cloned().map(build).collect(),
                vec![],
            )),
        }
    }

    fn read_word(&mut self) -> Result<Word> {
        let start = self.pos;
        let mut word = Word::default();
        let mut last_star: Option<usize> = None;

        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"' | ':' | '[' | ']' | '{' | '}' | '~') {
                break;
            }
            if self.looking_at("&&") || self.looking_at("||") {
                break;
            }
            match c {
                '\\' => {
                    self.pos += 1;
                    let Some(escaped) = self.peek() else {
                        return Err(self.error_here("dangling escape", "\\"));
                    };
                    if matches!(escaped, '*' | '?' | '\\') {
                        word.pattern.push('\\');
                    }
                    word.pattern.push(escaped);
                    word.text.push(escaped);
                }
                '*' | '?' => {
                    word.wildcards += 1;
                    if c == '*' {
                        last_star = Some(word.pattern.len());
                    }
                    word.pattern.push(c);
                    word.text.push(c);
                }
                c => {
                    word.pattern.push(c);
                    word.text.push(c);
                }
            }
            self.pos += 1;
        }

        if self.pos == start {
            let token = self.peek().map(String::from).unwrap_or_default();
            return Err(self.error_here(format!("unexpected '{token}'"), token));
        }
        word.trailing_star = word.wildcards == 1 && last_star == Some(word.pattern.len() - 1);
        Ok(word)
    }

    /// Digits at the cursor; `None` when there are none.
    fn read_number(&mut self) -> Result<Option<u32>> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        match digits.parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => Err(QuarryError::query_syntax("number out of range", digits, start)),
        }
    }

    /// A `~` suffix must end its clause.
    fn expect_clause_end(&self, what: &str) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(c) if c.is_whitespace() || c == ')' => Ok(()),
            _ if self.looking_at("&&") || self.looking_at("||") => Ok(()),
            Some(c) => Err(self.error_here(format!("unexpected '{c}' after {what}"), c.to_string())),
        }
    }

    fn eat_operator(&mut self, operator: Operator) -> bool {
        let saved = self.pos;
        self.skip_whitespace();
        match self.peek_operator() {
            Some((_, found)) if found == operator => {
                let len = match self.peek() {
                    Some('&') | Some('|') => 2,
                    Some('!') => 1,
                    _ => match operator {
                        Operator::And | Operator::Not => 3,
                        Operator::Or => 2,
                    },
                };
                self.pos += len;
                true
            }
            _ => {
                self.pos = saved;
                false
            }
        }
    }

    fn peek_operator(&self) -> Option<(&'static str, Operator)> {
        if self.looking_at("&&") {
            Some(("&&", Operator::And))
        } else if self.looking_at("||") {
            Some(("||", Operator::Or))
        } else if self.peek() == Some('!') {
            Some(("!", Operator::Not))
        } else if self.looking_at_keyword("AND") {
            Some(("AND", Operator::And))
        } else if self.looking_at_keyword("OR") {
            Some(("OR", Operator::Or))
        } else if self.looking_at_keyword("NOT") {
            Some(("NOT", Operator::Not))
        } else {
            None
        }
    }

    fn looking_at(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// An upper-case keyword followed by a clause boundary.
    fn looking_at_keyword(&self, keyword: &str) -> bool {
        if !self.looking_at(keyword) {
            return false;
        }
        match self.chars.get(self.pos + keyword.chars().count()) {
            None => true,
            Some(c) => c.is_whitespace() || matches!(c, '(' | ')' | '"'),
        }
    }

    fn looking_at_match_all(&self) -> bool {
        self.looking_at("*:*")
            && match self.chars.get(self.pos + 3) {
                None => true,
                Some(c) => c.is_whitespace() || *c == ')',
            }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error_here<M: Into<String>, T: Into<String>>(&self, message: M, token: T) -> QuarryError {
        QuarryError::query_syntax(message, token, self.pos)
    }
}
