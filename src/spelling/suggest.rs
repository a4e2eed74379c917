//! Prefix suggestion and "did you mean" correction over a term dictionary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::error::Result;
use crate::index::inverted::InvertedIndex;
use crate::query::fuzzy::{FuzzyMode, expand_fuzzy};
use crate::query::wildcard::{CHECK_INTERVAL, expand_prefix};
use crate::search::options::Deadline;
use crate::spelling::trigram::TrigramIndex;
use crate::util::levenshtein::{EditRows, levenshtein_within};

/// Options of a prefix suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// Field to draw terms from; every default search field when absent.
    pub field: Option<String>,
    /// Edits tolerated between the prefix and the start of a term.
    pub max_edits: u32,
    pub limit: usize,
    /// Terms in fewer documents are not suggested.
    pub min_doc_freq: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        SuggestConfig {
            field: None,
            max_edits: 0,
            limit: 10,
            min_doc_freq: 1,
        }
    }
}

impl SuggestConfig {
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_max_edits(mut self, max_edits: u32) -> Self {
        self.max_edits = max_edits;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Options of a phrase correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DidYouMeanConfig {
    pub field: Option<String>,
    pub max_edits: u32,
}

impl Default for DidYouMeanConfig {
    fn default() -> Self {
        DidYouMeanConfig {
            field: None,
            max_edits: 2,
        }
    }
}

/// A suggested dictionary term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub term: String,
    pub field: String,
    pub distance: u32,
    pub doc_freq: usize,
}

/// Read access to the term dictionaries for suggestion.
pub struct Dictionary<'a> {
    inverted: &'a InvertedIndex,
    trigrams: &'a TrigramIndex,
    max_expansions: usize,
    deadline: &'a Deadline,
}

impl<'a> Dictionary<'a> {
    pub fn new(
        inverted: &'a InvertedIndex,
        trigrams: &'a TrigramIndex,
        max_expansions: usize,
        deadline: &'a Deadline,
    ) -> Self {
        Dictionary {
            inverted,
            trigrams,
            max_expansions,
            deadline,
        }
    }

    /// Terms starting with (or, with edits, close to the start of) each
    /// field's normalized prefix.
    ///
    /// Ranked by distance ascending, then document frequency descending,
    /// then term. A term found in several fields is reported once, for the
    /// field where it ranks best.
    pub fn suggest(&self, prefixes: &[(String, String)], config: &SuggestConfig) -> Result<Vec<Suggestion>> {
        let mut best: BTreeMap<String, Suggestion> = BTreeMap::new();
        for (field, prefix) in prefixes {
            for (term, distance) in self.matches(field, prefix, config.max_edits, FuzzyMode::Prefix)? {
                let doc_freq = self.inverted.document_frequency(field, term);
                if doc_freq < config.min_doc_freq.max(1) {
                    continue;
                }
                let candidate = Suggestion {
                    term: term.to_string(),
                    field: field.clone(),
                    distance,
                    doc_freq,
                };
                match best.get(term) {
                    Some(existing) if rank_key(existing) <= rank_key(&candidate) => {}
                    _ => {
                        best.insert(term.to_string(), candidate);
                    }
                }
            }
        }

        let mut suggestions: Vec<Suggestion> = best.into_values().collect();
        suggestions.sort_by(|a, b| rank_key(a).cmp(&rank_key(b)));
        suggestions.truncate(config.limit);
        Ok(suggestions)
    }

    /// Replace every token of `phrase` no field knows with its closest
    /// dictionary term. Tokens stacked on the same source span count as
    /// known when any of them is.
    pub fn did_you_mean(
        &self,
        phrase: &str,
        tokens: &[Token],
        fields: &[String],
        max_edits: u32,
    ) -> Result<String> {
        let mut spans: Vec<((usize, usize), Vec<&Token>)> = Vec::new();
        for token in tokens {
            let span = (token.start_offset, token.end_offset);
            match spans.last_mut() {
                Some((last, group)) if *last == span => group.push(token),
                _ => spans.push((span, vec![token])),
            }
        }

        let mut replacements = Vec::new();
        for ((start, end), group) in spans {
            let known = group.iter().any(|token| {
                fields
                    .iter()
                    .any(|field| self.inverted.document_frequency(field, &token.text) > 0)
            });
            if known {
                continue;
            }
            if let Some(correction) = self.closest(&group[0].text, fields, max_edits)? {
                replacements.push((start, end, correction));
            }
        }

        if replacements.is_empty() {
            return Ok(phrase.to_string());
        }
        replacements.sort_by_key(|(start, _, _)| *start);

        let mut corrected = String::with_capacity(phrase.len());
        let mut cursor = 0;
        for (start, end, term) in replacements {
            if start < cursor || phrase.get(start..end).is_none() {
                continue;
            }
            corrected.push_str(&phrase[cursor..start]);
            corrected.push_str(&term);
            cursor = end;
        }
        corrected.push_str(&phrase[cursor..]);
        Ok(corrected)
    }

    /// Nearest term over `fields`: lowest distance, then highest document
    /// frequency, then term order.
    fn closest(&self, word: &str, fields: &[String], max_edits: u32) -> Result<Option<String>> {
        let mut found: BTreeMap<&str, (u32, usize)> = BTreeMap::new();
        for field in fields {
            for (term, distance) in self.matches(field, word, max_edits, FuzzyMode::Term)? {
                let doc_freq = self.inverted.document_frequency(field, term);
                let entry = found.entry(term).or_insert((distance, 0));
                entry.0 = entry.0.min(distance);
                entry.1 += doc_freq;
            }
        }
        Ok(found
            .into_iter()
            .filter(|(term, _)| *term != word)
            .min_by(|(ta, (da, fa)), (tb, (db, fb))| {
                da.cmp(db).then_with(|| fb.cmp(fa)).then_with(|| ta.cmp(tb))
            })
            .map(|(term, _)| term.to_string()))
    }

    /// Terms of `field` within `max_edits` of `word`, with their distance.
    fn matches(
        &self,
        field: &str,
        word: &str,
        max_edits: u32,
        mode: FuzzyMode,
    ) -> Result<Vec<(&'a str, u32)>> {
        let Some(index) = self.inverted.field(field) else {
            return Ok(Vec::new());
        };
        let terms = index.terms();

        if max_edits == 0 {
            return Ok(match mode {
                FuzzyMode::Prefix => expand_prefix(terms, word, self.max_expansions, self.deadline)?
                    .into_iter()
                    .map(|term| (term, 0))
                    .collect(),
                FuzzyMode::Term => terms
                    .get_key_value(word)
                    .map(|(term, _)| vec![(term.as_str(), 0)])
                    .unwrap_or_default(),
            });
        }

        match self.trigrams.candidates(field, word, max_edits, mode) {
            Some(candidates) => {
                let mut matched = Vec::new();
                for (checked, candidate) in candidates.into_iter().enumerate() {
                    if checked % CHECK_INTERVAL == CHECK_INTERVAL - 1 {
                        self.deadline.check()?;
                    }
                    let distance = match mode {
                        FuzzyMode::Term => {
                            levenshtein_within(word, candidate, max_edits as usize).map(|d| d as u32)
                        }
                        FuzzyMode::Prefix => {
                            Some(prefix_distance(word, candidate)).filter(|d| *d <= max_edits)
                        }
                    };
                    if let (Some(distance), Some((term, _))) = (distance, terms.get_key_value(candidate)) {
                        matched.push((term.as_str(), distance));
                    }
                }
                Ok(matched)
            }
            None => Ok(expand_fuzzy(terms, word, max_edits, mode, self.max_expansions, self.deadline)?
                .into_iter()
                .map(|e| (e.term, e.distance))
                .collect()),
        }
    }
}

fn rank_key(s: &Suggestion) -> (u32, std::cmp::Reverse<usize>, &str) {
    (s.distance, std::cmp::Reverse(s.doc_freq), s.term.as_str())
}

/// Edit distance between `pattern` and the closest prefix of `term`.
fn prefix_distance(pattern: &str, term: &str) -> u32 {
    let mut rows = EditRows::new(pattern);
    for c in term.chars() {
        if rows.row_min() >= rows.prefix_distance() {
            break;
        }
        rows.push(c);
    }
    rows.prefix_distance()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::inverted::AnalyzedTerm;

    fn corpus() -> (InvertedIndex, TrigramIndex) {
        let mut inverted = InvertedIndex::new();
        let mut trigrams = TrigramIndex::new();
        let docs: [&[&str]; 4] = [
            &["wireless", "headphones"],
            &["wireless", "speaker"],
            &["wired", "headphones"],
            &["wireless", "charger"],
        ];
        for (doc_id, words) in docs.iter().enumerate() {
            let terms: Vec<AnalyzedTerm> = words
                .iter()
                .enumerate()
                .map(|(pos, w)| AnalyzedTerm::new(*w, pos as u32))
                .collect();
            for term in inverted.insert(doc_id as u64, "title", &terms) {
                trigrams.add("title", &term);
            }
        }
        (inverted, trigrams)
    }

    fn fields() -> Vec<(String, String)> {
        vec![("title".to_string(), String::new())]
    }

    #[test]
    fn test_prefix_suggest() {
        let (inverted, trigrams) = corpus();
        let deadline = Deadline::none();
        let dict = Dictionary::new(&inverted, &trigrams, 1024, &deadline);

        let mut prefixes = fields();
        prefixes[0].1 = "wi".to_string();
        let found = dict.suggest(&prefixes, &SuggestConfig::default()).unwrap();
        let terms: Vec<_> = found.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(terms, vec!["wireless", "wired"]);
        assert_eq!(found[0].doc_freq, 3);

        let limited = dict
            .suggest(&prefixes, &SuggestConfig::default().with_limit(1))
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_fuzzy_suggest() {
        let (inverted, trigrams) = corpus();
        let deadline = Deadline::none();
        let dict = Dictionary::new(&inverted, &trigrams, 1024, &deadline);

        let mut prefixes = fields();
        prefixes[0].1 = "wirle".to_string();
        let found = dict
            .suggest(&prefixes, &SuggestConfig::default().with_max_edits(1))
            .unwrap();
        let terms: Vec<_> = found.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(terms, vec!["wireless", "wired"]);
        assert!(found.iter().all(|s| s.distance == 1));

        prefixes[0].1 = "headphnes".to_string();
        let found = dict
            .suggest(&prefixes, &SuggestConfig::default().with_max_edits(1))
            .unwrap();
        assert_eq!(found[0].term, "headphones");
    }

    #[test]
    fn test_did_you_mean() {
        let (inverted, trigrams) = corpus();
        let deadline = Deadline::none();
        let dict = Dictionary::new(&inverted, &trigrams, 1024, &deadline);
        let fields = vec!["title".to_string()];

        let tokens = vec![
            Token::with_offsets("wireles", 0, 0, 7),
            Token::with_offsets("headphones", 1, 8, 18),
        ];
        assert_eq!(
            dict.did_you_mean("Wireles headphones", &tokens, &fields, 2).unwrap(),
            "wireless headphones"
        );

        let known = vec![Token::with_offsets("wired", 0, 0, 5)];
        assert_eq!(dict.did_you_mean("Wired", &known, &fields, 2).unwrap(), "Wired");

        let hopeless = vec![Token::with_offsets("zzzzzz", 0, 0, 6)];
        assert_eq!(dict.did_you_mean("zzzzzz", &hopeless, &fields, 2).unwrap(), "zzzzzz");
    }

    #[test]
    fn test_prefix_distance() {
        assert_eq!(prefix_distance("wire", "wireless"), 0);
        assert_eq!(prefix_distance("wirle", "wireless"), 1);
        assert_eq!(prefix_distance("abc", ""), 3);
    }
}
