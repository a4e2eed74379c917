//! The inverted index: a term dictionary per field mapping each term to
//! its posting list, plus the per-field length statistics that ranking
//! needs.
//!
//! Terms are stored exactly as produced by analysis; lookups are
//! case-sensitive.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::index::posting::{DocId, Posting, PostingList};

/// A term produced for one document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedTerm {
    pub term: String,
    pub position: u32,
}

impl AnalyzedTerm {
    pub fn new<S: Into<String>>(term: S, position: u32) -> Self {
        AnalyzedTerm {
            term: term.into(),
            position,
        }
    }
}

/// Term dictionary and length statistics of one field.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    terms: BTreeMap<String, PostingList>,
    lengths: AHashMap<DocId, u32>,
    total_length: u64,
}

impl FieldIndex {
    pub fn terms(&self) -> &BTreeMap<String, PostingList> {
        &self.terms
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    /// Number of documents with at least one token in this field.
    pub fn doc_count(&self) -> usize {
        self.lengths.len()
    }

    /// Token count of the field in a document.
    pub fn length(&self, doc_id: DocId) -> u32 {
        self.lengths.get(&doc_id).copied().unwrap_or(0)
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Average token count over the documents that have the field.
    pub fn average_length(&self) -> f32 {
        if self.lengths.is_empty() {
            0.0
        } else {
            self.total_length as f32 / self.lengths.len() as f32
        }
    }

    pub fn posting_count(&self) -> usize {
        self.terms.values().map(PostingList::len).sum()
    }

    fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.lengths.is_empty()
    }
}

/// Term dictionaries of all fields, with a forward map from document to the
/// keys it contributed so deletes touch only the affected lists.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    fields: BTreeMap<String, FieldIndex>,
    doc_terms: AHashMap<DocId, Vec<(String, String)>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the tokens of one document field. Returns the terms that did not
    /// exist in the field's dictionary before.
    pub fn insert(&mut self, doc_id: DocId, field: &str, tokens: &[AnalyzedTerm]) -> Vec<String> {
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut grouped: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for token in tokens {
            grouped
                .entry(token.term.as_str())
                .or_default()
                .push(token.position);
        }
        let mut positions: Vec<u32> = tokens.iter().map(|t| t.position).collect();
        positions.sort_unstable();
        positions.dedup();

        let field_index = self.fields.entry(field.to_string()).or_default();
        *field_index.lengths.entry(doc_id).or_insert(0) += positions.len() as u32;
        field_index.total_length += positions.len() as u64;

        let keys = self.doc_terms.entry(doc_id).or_default();
        let mut created = Vec::new();
        for (term, term_positions) in grouped {
            if !field_index.terms.contains_key(term) {
                created.push(term.to_string());
            }
            let list = field_index.terms.entry(term.to_string()).or_default();
            if list.insert(Posting::new(doc_id, term_positions)) {
                keys.push((field.to_string(), term.to_string()));
            }
        }
        created
    }

    /// Remove a document from every posting list it appears in. Returns the
    /// `(field, term)` keys whose lists became empty and were dropped.
    pub fn delete(&mut self, doc_id: DocId) -> Vec<(String, String)> {
        let mut removed = Vec::new();
        let Some(keys) = self.doc_terms.remove(&doc_id) else {
            return removed;
        };

        for (field, term) in keys {
            let Some(field_index) = self.fields.get_mut(&field) else {
                continue;
            };
            if let Some(list) = field_index.terms.get_mut(&term) {
                list.remove(doc_id);
                if list.is_empty() {
                    field_index.terms.remove(&term);
                    removed.push((field, term));
                }
            }
        }

        let mut emptied = Vec::new();
        for (name, field_index) in self.fields.iter_mut() {
            if let Some(length) = field_index.lengths.remove(&doc_id) {
                field_index.total_length -= u64::from(length);
            }
            if field_index.is_empty() {
                emptied.push(name.clone());
            }
        }
        for name in emptied {
            self.fields.remove(&name);
        }
        removed
    }

    pub fn lookup(&self, field: &str, term: &str) -> Option<&PostingList> {
        self.fields.get(field).and_then(|f| f.postings(term))
    }

    pub fn document_frequency(&self, field: &str, term: &str) -> usize {
        self.lookup(field, term).map_or(0, PostingList::len)
    }

    pub fn field(&self, field: &str) -> Option<&FieldIndex> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldIndex)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn term_count(&self) -> usize {
        self.fields.values().map(|f| f.terms.len()).sum()
    }

    /// Every posting list well formed, none empty.
    pub fn is_well_formed(&self) -> bool {
        self.fields.values().all(|f| {
            f.terms
                .values()
                .all(|list| !list.is_empty() && list.is_well_formed())
        })
    }

    /// `(field, term) -> document frequency` for every key; two indexes
    /// holding the same documents produce the same map.
    pub fn dictionary_snapshot(&self) -> BTreeMap<(String, String), usize> {
        self.fields
            .iter()
            .flat_map(|(field, f)| {
                f.terms
                    .iter()
                    .map(move |(term, list)| ((field.clone(), term.clone()), list.len()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<AnalyzedTerm> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| AnalyzedTerm::new(*w, i as u32))
            .collect()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = InvertedIndex::new();
        let created = index.insert(1, "title", &terms(&["wireless", "bluetooth", "wireless"]));
        assert_eq!(created, vec!["bluetooth", "wireless"]);
        let created = index.insert(2, "title", &terms(&["bluetooth", "speaker"]));
        assert_eq!(created, vec!["speaker"]);

        let list = index.lookup("title", "wireless").unwrap();
        assert_eq!(list.get(1).unwrap().positions, vec![0, 2]);
        assert_eq!(index.document_frequency("title", "bluetooth"), 2);
        assert_eq!(index.document_frequency("title", "Bluetooth"), 0);
        assert_eq!(index.document_frequency("body", "bluetooth"), 0);

        let field = index.field("title").unwrap();
        assert_eq!(field.length(1), 3);
        assert_eq!(field.doc_count(), 2);
        assert_eq!(field.average_length(), 2.5);
        assert!(index.is_well_formed());
    }

    #[test]
    fn test_delete_is_inverse_of_insert() {
        let mut index = InvertedIndex::new();
        index.insert(1, "title", &terms(&["usb", "cable"]));
        let before = index.dictionary_snapshot();

        index.insert(2, "title", &terms(&["usb", "hub"]));
        index.insert(2, "body", &terms(&["fast"]));
        let removed = index.delete(2);

        assert_eq!(
            removed,
            vec![
                ("title".to_string(), "hub".to_string()),
                ("body".to_string(), "fast".to_string())
            ]
        );
        assert_eq!(index.dictionary_snapshot(), before);
        assert!(index.field("body").is_none());
        assert_eq!(index.field("title").unwrap().total_length(), 2);
        assert!(index.delete(2).is_empty());
    }
}
