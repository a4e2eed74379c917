//! Postings and posting lists.
//!
//! A posting list holds the postings of one `(field, term)` key, sorted by
//! document id with no duplicate ids.

use serde::Serialize;

/// Internal document ordinal. Assigned monotonically per index; a replaced
/// document gets a fresh one.
pub type DocId = u64;

/// A document's match record for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Always equal to `positions.len()`.
    pub term_frequency: u32,
    /// Token positions within the field, ascending and unique.
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc_id: DocId, mut positions: Vec<u32>) -> Self {
        positions.sort_unstable();
        positions.dedup();
        Posting {
            doc_id,
            term_frequency: positions.len() as u32,
            positions,
        }
    }

    /// Merge more positions of the same document into this posting.
    pub fn merge_positions(&mut self, positions: &[u32]) {
        self.positions.extend_from_slice(positions);
        self.positions.sort_unstable();
        self.positions.dedup();
        self.term_frequency = self.positions.len() as u32;
    }
}

/// The postings of one term, ordered by document id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a posting. A posting for a document already in the list is
    /// merged into the existing one. Returns true when the document was
    /// not in the list before.
    pub fn insert(&mut self, posting: Posting) -> bool {
        // Ids are assigned in increasing order, so appending is the usual case.
        if self
            .postings
            .last()
            .is_none_or(|last| last.doc_id < posting.doc_id)
        {
            self.postings.push(posting);
            return true;
        }

        match self
            .postings
            .binary_search_by_key(&posting.doc_id, |p| p.doc_id)
        {
            Ok(index) => {
                self.postings[index].merge_positions(&posting.positions);
                false
            }
            Err(index) => {
                self.postings.insert(index, posting);
                true
            }
        }
    }

    pub fn remove(&mut self, doc_id: DocId) -> Option<Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|index| self.postings.remove(index))
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|index| &self.postings[index])
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.get(doc_id).is_some()
    }

    /// Number of postings, i.e. the document frequency of the term.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Posting> {
        self.postings.iter()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.postings.iter().map(|p| p.doc_id)
    }

    /// Sorted by doc id, no duplicates, frequencies matching positions.
    pub fn is_well_formed(&self) -> bool {
        self.postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id)
            && self.postings.iter().all(|p| {
                p.term_frequency as usize == p.positions.len()
                    && p.term_frequency > 0
                    && p.positions.windows(2).all(|w| w[0] < w[1])
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_new_sorts_positions() {
        let posting = Posting::new(3, vec![7, 2, 7, 4]);
        assert_eq!(posting.positions, vec![2, 4, 7]);
        assert_eq!(posting.term_frequency, 3);
    }

    #[test]
    fn test_posting_list() {
        let mut list = PostingList::new();
        assert!(list.insert(Posting::new(5, vec![0])));
        assert!(list.insert(Posting::new(9, vec![1, 3])));
        assert!(list.insert(Posting::new(2, vec![4])));
        assert!(!list.insert(Posting::new(9, vec![6])));

        assert_eq!(list.doc_ids().collect::<Vec<_>>(), vec![2, 5, 9]);
        assert_eq!(list.get(9).unwrap().term_frequency, 3);
        assert!(list.is_well_formed());

        assert!(list.remove(5).is_some());
        assert!(list.remove(5).is_none());
        assert_eq!(list.len(), 2);
        assert!(!list.contains(5));
    }
}
