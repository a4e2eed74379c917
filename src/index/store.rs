//! Stored field values and the external id map.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::document::FieldValue;
use crate::index::posting::DocId;

/// The stored part of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub boost: f32,
    /// Values of the fields declared `stored`.
    pub fields: BTreeMap<String, Vec<FieldValue>>,
}

impl StoredDocument {
    pub fn values(&self, field: &str) -> &[FieldValue] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Live documents by internal id, plus the external id lookup.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: BTreeMap<DocId, StoredDocument>,
    ids: AHashMap<String, DocId>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc_id: DocId, doc: StoredDocument) {
        self.ids.insert(doc.id.clone(), doc_id);
        self.docs.insert(doc_id, doc);
    }

    /// Remove a document by external id.
    pub fn remove(&mut self, id: &str) -> Option<(DocId, StoredDocument)> {
        let doc_id = self.ids.remove(id)?;
        self.docs.remove(&doc_id).map(|doc| (doc_id, doc))
    }

    pub fn doc_id(&self, id: &str) -> Option<DocId> {
        self.ids.get(id).copied()
    }

    pub fn get(&self, doc_id: DocId) -> Option<&StoredDocument> {
        self.docs.get(&doc_id)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&StoredDocument> {
        self.doc_id(id).and_then(|doc_id| self.docs.get(&doc_id))
    }

    /// External id of a live document.
    pub fn external_id(&self, doc_id: DocId) -> Option<&str> {
        self.docs.get(&doc_id).map(|d| d.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Live document ids, ascending.
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.docs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
