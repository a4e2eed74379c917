//! Character-trigram index over each field's term dictionary.
//!
//! Terms are padded with two `$` on each side, so a term of `n` characters
//! has `n + 2` trigrams and each edit destroys at most three of them. A
//! term within `k` edits of a word of `n` characters therefore shares at
//! least `n + 2 - 3k` of the word's trigrams. When that bound is positive
//! it selects a complete candidate set; otherwise the caller has to scan.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;

use crate::query::fuzzy::FuzzyMode;

const PAD: &str = "$$";

/// Trigrams of `term`. Prefix mode pads only the start, since whatever
/// follows a prefix is unknown.
pub fn trigrams(term: &str, mode: FuzzyMode) -> Vec<String> {
    let mut padded: Vec<char> = PAD.chars().chain(term.chars()).collect();
    if mode == FuzzyMode::Term {
        padded.extend(PAD.chars());
    }
    padded.windows(3).map(|w| w.iter().collect()).collect()
}

#[derive(Debug, Clone, Default)]
struct FieldTrigrams {
    grams: AHashMap<String, BTreeSet<String>>,
}

/// Trigram postings per field.
#[derive(Debug, Clone, Default)]
pub struct TrigramIndex {
    fields: BTreeMap<String, FieldTrigrams>,
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, term: &str) {
        let entry = self.fields.entry(field.to_string()).or_default();
        for gram in trigrams(term, FuzzyMode::Term) {
            entry.grams.entry(gram).or_default().insert(term.to_string());
        }
    }

    pub fn remove(&mut self, field: &str, term: &str) {
        let Some(entry) = self.fields.get_mut(field) else {
            return;
        };
        for gram in trigrams(term, FuzzyMode::Term) {
            if let Some(terms) = entry.grams.get_mut(&gram) {
                terms.remove(term);
                if terms.is_empty() {
                    entry.grams.remove(&gram);
                }
            }
        }
        if entry.grams.is_empty() {
            self.fields.remove(field);
        }
    }

    /// Terms of `field` that may lie within `max_edits` of `word`.
    ///
    /// Returns `None` when the trigram bound cannot rule anything out, in
    /// which case every term is a candidate.
    pub fn candidates(
        &self,
        field: &str,
        word: &str,
        max_edits: u32,
        mode: FuzzyMode,
    ) -> Option<BTreeSet<&str>> {
        let grams = trigrams(word, mode);
        let distinct: BTreeSet<&String> = grams.iter().collect();
        let required = grams.len() as i64 - 3 * i64::from(max_edits);
        if required < 1 || distinct.len() != grams.len() {
            return None;
        }

        let Some(entry) = self.fields.get(field) else {
            return Some(BTreeSet::new());
        };
        let mut shared: AHashMap<&str, i64> = AHashMap::new();
        for gram in distinct {
            if let Some(terms) = entry.grams.get(gram) {
                for term in terms {
                    *shared.entry(term.as_str()).or_default() += 1;
                }
            }
        }
        Some(
            shared
                .into_iter()
                .filter(|(_, count)| *count >= required)
                .map(|(term, _)| term)
                .collect(),
        )
    }

    /// Distinct trigrams held for `field`.
    pub fn gram_count(&self, field: &str) -> usize {
        self.fields.get(field).map_or(0, |f| f.grams.len())
    }
}
