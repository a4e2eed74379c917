//! A named, searchable collection of documents.
//!
//! An [`Index`] owns its schema, term dictionaries, value columns and
//! stored documents. Readers share one [`RwLock`] and always see a
//! committed state; writers are serialized by a separate mutex and do
//! their analysis before taking the exclusive lock, so a batch becomes
//! visible all at once and a failing document leaves nothing behind.

pub mod columns;
pub mod inverted;
pub mod posting;
pub mod store;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, AnalyzerRegistry, Token};
use crate::config::{EngineConfig, IndexConfig, Limits};
use crate::document::{Document, DocumentField, FieldValue};
use crate::error::{QuarryError, Result};
use crate::highlight::{HighlightConfig, HighlightFragment};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::query::{Query, QueryParser};
use crate::schema::{FieldEntry, FieldType, GeoAxis, Schema};
use crate::search::executor::SearchContext;
use crate::search::options::{Deadline, SearchOptions, SearchResults};
use crate::spelling::suggest::Dictionary;
use crate::spelling::{DidYouMeanConfig, SuggestCache, SuggestConfig, Suggestion, TrigramIndex};
use crate::util::clock::{Clock, SystemClock};

use self::columns::{ColumnValue, FieldColumns};
use self::inverted::{AnalyzedTerm, InvertedIndex};
use self::posting::DocId;
use self::store::{DocumentStore, StoredDocument};

/// Positions left empty between the values of a multi-valued field, so a
/// phrase cannot match across two values.
pub const POSITION_GAP: u32 = 100;

/// Everything a reader sees, replaced only under the write lock.
#[derive(Debug, Default)]
struct IndexState {
    schema: Schema,
    inverted: InvertedIndex,
    columns: FieldColumns,
    store: DocumentStore,
    trigrams: TrigramIndex,
    next_doc_id: DocId,
    /// Bumped by every committed write.
    generation: u64,
}

/// A document analyzed against the schema, ready to apply.
#[derive(Debug)]
struct PreparedDocument {
    id: String,
    boost: f32,
    terms: Vec<(String, Vec<AnalyzedTerm>)>,
    columns: Vec<(String, FieldType, Vec<ColumnValue>)>,
    stored: BTreeMap<String, Vec<FieldValue>>,
}

/// Size and shape of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub name: String,
    pub document_count: usize,
    pub generation: u64,
    pub fields: BTreeMap<String, FieldStatistics>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub field_type: FieldType,
    pub indexed: bool,
    pub stored: bool,
    /// Distinct terms in the dictionary.
    pub term_count: usize,
    pub posting_count: usize,
    pub total_tokens: u64,
}

#[derive(Debug)]
pub struct Index {
    name: String,
    config: IndexConfig,
    analyzers: AnalyzerRegistry,
    default_analyzer: String,
    limits: Limits,
    default_timeout: Option<Duration>,
    state: RwLock<IndexState>,
    writer: Mutex<()>,
    metrics: Metrics,
    engine_metrics: Option<Arc<Metrics>>,
    suggestions: SuggestCache<Vec<Suggestion>>,
    corrections: SuggestCache<String>,
}

impl Index {
    /// An index with engine defaults and the system clock.
    pub fn new<S: Into<String>>(name: S, config: IndexConfig) -> Result<Self> {
        Self::with_engine_config(
            name,
            config,
            &EngineConfig::default(),
            Arc::new(SystemClock::new()),
            None,
        )
    }

    /// An index that takes its defaults and limits from `engine` and also
    /// records into `engine_metrics`.
    pub fn with_engine_config<S: Into<String>>(
        name: S,
        config: IndexConfig,
        engine: &EngineConfig,
        clock: Arc<dyn Clock>,
        engine_metrics: Option<Arc<Metrics>>,
    ) -> Result<Self> {
        let name = name.into();
        let analyzers = AnalyzerRegistry::from_configs(&config.analyzers)?;
        let default_analyzer = config
            .default_analyzer
            .clone()
            .unwrap_or_else(|| engine.default_analyzer.clone());
        analyzers.get(&default_analyzer)?;
        config.scoring.validate()?;

        let schema = Schema::from_fields(config.fields.iter().cloned())?;
        for entry in schema.fields() {
            if let Some(analyzer) = &entry.analyzer {
                analyzers.get(analyzer)?;
            }
        }
        for field in &config.default_fields {
            let entry = schema
                .get(field)
                .ok_or_else(|| QuarryError::unknown_field(field))?;
            if !entry.field_type.has_terms() {
                return Err(QuarryError::field_type_mismatch(
                    field,
                    "text or keyword",
                    entry.field_type.name(),
                ));
            }
        }

        let mut limits = engine.limits.clone();
        if let Some(max) = config.max_documents {
            limits.max_documents_per_index = max;
        }

        log::info!(
            "created index '{name}' with {} declared fields (analyzer '{default_analyzer}')",
            schema.len()
        );
        Ok(Index {
            name,
            analyzers,
            default_analyzer,
            limits,
            default_timeout: engine.default_timeout(),
            state: RwLock::new(IndexState {
                schema,
                ..IndexState::default()
            }),
            writer: Mutex::new(()),
            metrics: Metrics::new(),
            engine_metrics,
            suggestions: SuggestCache::new(
                engine.suggest_cache_ttl(),
                engine.suggest_cache_capacity,
                clock.clone(),
            ),
            corrections: SuggestCache::new(
                engine.suggest_cache_ttl(),
                engine.suggest_cache_capacity,
                clock,
            ),
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The current schema, including dynamically added fields.
    pub fn schema(&self) -> Schema {
        self.state.read().schema.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Add or replace one document.
    pub fn add(&self, document: Document) -> Result<()> {
        self.add_bulk(vec![document]).map(|_| ())
    }

    /// Add or replace a batch of documents atomically. Returns the number
    /// of documents written.
    ///
    /// Later documents in the batch replace earlier ones with the same id.
    pub fn add_bulk(&self, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let started = Instant::now();
        let _writer = self.writer.lock();

        // Only this writer changes the schema, so the copy stays current
        // until it is committed below.
        let (mut schema, live, present) = {
            let state = self.state.read();
            let present: usize = documents
                .iter()
                .map(Document::id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter(|id| state.store.contains(id))
                .count();
            (state.schema.clone(), state.store.len(), present)
        };

        let distinct = documents.iter().map(Document::id).collect::<BTreeSet<_>>().len();
        let after = live + distinct - present;
        if after > self.limits.max_documents_per_index {
            log::warn!(
                "rejected batch of {} documents for '{}': {after} would exceed the limit of {}",
                documents.len(),
                self.name,
                self.limits.max_documents_per_index
            );
            return Err(QuarryError::resource_exhausted(format!(
                "index '{}' is limited to {} documents",
                self.name, self.limits.max_documents_per_index
            )));
        }

        for document in &documents {
            self.extend_schema(&mut schema, document)?;
        }
        let prepared = documents
            .par_iter()
            .map(|document| self.prepare(&schema, document))
            .collect::<Result<Vec<_>>>()?;

        let count = prepared.len();
        {
            let mut state = self.state.write();
            state.schema = schema;
            for document in prepared {
                apply(&mut state, document);
            }
            state.generation += 1;
        }
        self.invalidate_caches();
        self.record_indexed(count as u64);
        log::debug!(
            "indexed {count} documents into '{}' in {:?}",
            self.name,
            started.elapsed()
        );
        Ok(count)
    }

    /// Delete a document by id. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let _writer = self.writer.lock();
        let removed = {
            let mut state = self.state.write();
            let removed = remove(&mut state, id);
            if removed {
                state.generation += 1;
            }
            removed
        };
        if removed {
            self.invalidate_caches();
            self.metrics.record_deleted(1);
            if let Some(engine) = &self.engine_metrics {
                engine.record_deleted(1);
            }
            log::debug!("deleted '{id}' from '{}'", self.name);
        }
        Ok(removed)
    }

    /// The stored part of a document.
    pub fn get(&self, id: &str) -> Option<StoredDocument> {
        self.state.read().store.get_by_id(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.read().store.contains(id)
    }

    /// Fields bare query terms search.
    pub fn default_fields(&self) -> Vec<String> {
        let state = self.state.read();
        self.default_fields_of(&state.schema)
    }

    fn default_fields_of(&self, schema: &Schema) -> Vec<String> {
        if self.config.default_fields.is_empty() {
            schema.indexed_text_fields()
        } else {
            self.config.default_fields.clone()
        }
    }

    /// Parse a query string against this index's default fields.
    pub fn parse_query(&self, query: &str) -> Result<Query> {
        QueryParser::new(self.default_fields()).parse(query)
    }

    pub fn search(&self, query: &Query, options: &SearchOptions) -> Result<SearchResults> {
        let started = Instant::now();
        let deadline = Deadline::new(
            options.timeout.or(self.default_timeout),
            options.cancel.clone(),
        );
        let result = {
            let state = self.state.read();
            self.context(&state).search(query, options, &deadline)
        };

        let latency = started.elapsed();
        self.metrics.record_query(latency, result.is_ok());
        if let Some(engine) = &self.engine_metrics {
            engine.record_query(latency, result.is_ok());
        }
        match &result {
            Ok(results) => log::debug!(
                "query '{query}' on '{}': {} hits in {latency:?}",
                self.name,
                results.total_hits
            ),
            Err(err) => log::debug!("query '{query}' on '{}' failed: {err}", self.name),
        }
        result
    }

    pub fn search_str(&self, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        let parsed = self.parse_query(query)?;
        self.search(&parsed, options)
    }

    /// Fragments of a stored Text field of document `id` with `terms`
    /// marked. Terms are analyzed like the field.
    pub fn highlight<S: AsRef<str>>(
        &self,
        id: &str,
        field: &str,
        terms: &[S],
        config: &HighlightConfig,
    ) -> Result<Vec<HighlightFragment>> {
        let state = self.state.read();
        let ctx = self.context(&state);
        let entry = state
            .schema
            .get(field)
            .ok_or_else(|| QuarryError::unknown_field(field))?;

        let mut analyzed = BTreeSet::new();
        if entry.field_type == FieldType::Text {
            let analyzer = ctx.analyzer_for(entry)?;
            for term in terms {
                analyzed.extend(analyzer.tokens(term.as_ref())?.into_iter().map(|t| t.text));
            }
        }
        let doc = state
            .store
            .get_by_id(id)
            .ok_or_else(|| QuarryError::document_not_found(id))?;
        ctx.highlight(doc, field, &analyzed, config)
    }

    /// Indexed terms starting with `prefix`, best first.
    pub fn suggest(&self, prefix: &str, config: &SuggestConfig) -> Result<Vec<Suggestion>> {
        let state = self.state.read();
        let key = format!("{prefix}\u{1f}{config:?}");
        if let Some(cached) = self.suggestions.get(&key, state.generation) {
            return Ok(cached);
        }

        let fields = self.suggestion_fields(&state.schema, config.field.as_deref())?;
        let mut prefixes = Vec::with_capacity(fields.len());
        for field in fields {
            let normalized = self.normalize_for(&state.schema, &field, prefix)?;
            prefixes.push((field, normalized));
        }

        let deadline = Deadline::new(self.default_timeout, None);
        let dictionary = Dictionary::new(
            &state.inverted,
            &state.trigrams,
            self.limits.max_expansions,
            &deadline,
        );
        let suggestions = dictionary.suggest(&prefixes, config)?;
        self.suggestions
            .insert(key, state.generation, suggestions.clone());
        Ok(suggestions)
    }

    /// `phrase` with every unknown term replaced by its closest indexed
    /// term; unchanged when every term is known.
    pub fn did_you_mean(&self, phrase: &str, config: &DidYouMeanConfig) -> Result<String> {
        let state = self.state.read();
        let key = format!("{phrase}\u{1f}{config:?}");
        if let Some(cached) = self.corrections.get(&key, state.generation) {
            return Ok(cached);
        }

        let fields = self.suggestion_fields(&state.schema, config.field.as_deref())?;
        let Some(first) = fields.first() else {
            return Ok(phrase.to_string());
        };
        let tokens = match state.schema.get(first) {
            Some(entry) if entry.field_type == FieldType::Text => {
                self.analyzer_for(entry)?.tokens(phrase)?
            }
            _ => keyword_tokens(phrase),
        };

        let deadline = Deadline::new(self.default_timeout, None);
        let dictionary = Dictionary::new(
            &state.inverted,
            &state.trigrams,
            self.limits.max_expansions,
            &deadline,
        );
        let corrected = dictionary.did_you_mean(phrase, &tokens, &fields, config.max_edits)?;
        self.corrections
            .insert(key, state.generation, corrected.clone());
        Ok(corrected)
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        let mut fields = BTreeMap::new();
        for entry in state.schema.fields() {
            let dictionary = state.inverted.field(&entry.name);
            fields.insert(
                entry.name.clone(),
                FieldStatistics {
                    field_type: entry.field_type,
                    indexed: entry.indexed,
                    stored: entry.stored,
                    term_count: dictionary.map(|d| d.terms().len()).unwrap_or(0),
                    posting_count: dictionary.map(|d| d.posting_count()).unwrap_or(0),
                    total_tokens: dictionary.map(|d| d.total_length()).unwrap_or(0),
                },
            );
        }
        IndexStats {
            name: self.name.clone(),
            document_count: state.store.len(),
            generation: state.generation,
            fields,
            metrics: self.metrics.snapshot(),
        }
    }

    /// Document frequency of every `(field, term)` key.
    pub fn dictionary_snapshot(&self) -> BTreeMap<(String, String), usize> {
        self.state.read().inverted.dictionary_snapshot()
    }

    /// Whether every posting list is sorted, duplicate-free and non-empty.
    pub fn is_well_formed(&self) -> bool {
        self.state.read().inverted.is_well_formed()
    }

    pub fn document_frequency(&self, field: &str, term: &str) -> usize {
        self.state.read().inverted.document_frequency(field, term)
    }

    fn context<'a>(&'a self, state: &'a IndexState) -> SearchContext<'a> {
        SearchContext {
            schema: &state.schema,
            inverted: &state.inverted,
            columns: &state.columns,
            store: &state.store,
            analyzers: &self.analyzers,
            default_analyzer: &self.default_analyzer,
            facet_fields: &self.config.facet_fields,
            scoring: self.config.scoring,
            limits: &self.limits,
        }
    }

    fn analyzer_for(&self, entry: &FieldEntry) -> Result<Arc<dyn Analyzer>> {
        self.analyzers
            .get(entry.analyzer.as_deref().unwrap_or(&self.default_analyzer))
    }

    fn suggestion_fields(&self, schema: &Schema, field: Option<&str>) -> Result<Vec<String>> {
        match field {
            Some(field) => {
                let entry = schema
                    .get(field)
                    .ok_or_else(|| QuarryError::unknown_field(field))?;
                if !entry.field_type.has_terms() {
                    return Err(QuarryError::field_type_mismatch(
                        field,
                        "text or keyword",
                        entry.field_type.name(),
                    ));
                }
                Ok(vec![field.to_string()])
            }
            None => Ok(self.default_fields_of(schema)),
        }
    }

    fn normalize_for(&self, schema: &Schema, field: &str, term: &str) -> Result<String> {
        match schema.get(field) {
            Some(entry) if entry.field_type == FieldType::Text => {
                self.analyzer_for(entry)?.normalize(term)
            }
            _ => Ok(term.to_string()),
        }
    }

    fn invalidate_caches(&self) {
        self.suggestions.invalidate();
        self.corrections.invalidate();
    }

    fn record_indexed(&self, count: u64) {
        self.metrics.record_indexed(count);
        if let Some(engine) = &self.engine_metrics {
            engine.record_indexed(count);
        }
    }

    /// Declare the undeclared fields of `document`, or reject them when
    /// the index is not dynamic.
    fn extend_schema(&self, schema: &mut Schema, document: &Document) -> Result<()> {
        for (name, field) in document.fields() {
            if schema.contains(name) {
                continue;
            }
            if !self.config.dynamic {
                log::warn!(
                    "rejected document '{}' for '{}': undeclared field '{name}'",
                    document.id(),
                    self.name
                );
                return Err(QuarryError::unknown_field(name));
            }
            let Some(field_type) = field
                .field_type
                .or_else(|| field.values.iter().find_map(FieldValue::inferred_type))
            else {
                continue;
            };
            log::debug!("index '{}': added field '{name}' as {field_type}", self.name);
            schema.add_field(FieldEntry::new(name, field_type))?;
        }
        Ok(())
    }

    fn prepare(&self, schema: &Schema, document: &Document) -> Result<PreparedDocument> {
        let mut prepared = PreparedDocument {
            id: document.id().to_string(),
            boost: document.boost(),
            terms: Vec::new(),
            columns: Vec::new(),
            stored: BTreeMap::new(),
        };

        for (name, field) in document.fields() {
            let Some(entry) = schema.get(name) else {
                // Only fields without a single non-null value get here.
                continue;
            };
            let values = self.coerce_field(name, entry, field)?;
            if values.is_empty() {
                continue;
            }

            if entry.indexed {
                match entry.field_type {
                    FieldType::Text => {
                        let analyzer = self.analyzer_for(entry)?;
                        prepared
                            .terms
                            .push((name.to_string(), analyze_values(analyzer.as_ref(), &values)?));
                    }
                    FieldType::Keyword => {
                        let terms = values
                            .iter()
                            .filter_map(FieldValue::as_text)
                            .enumerate()
                            .map(|(i, v)| AnalyzedTerm::new(v, i as u32 * (1 + POSITION_GAP)))
                            .collect();
                        prepared.terms.push((name.to_string(), terms));
                    }
                    FieldType::GeoPoint => {
                        for axis in [GeoAxis::Lat, GeoAxis::Lon] {
                            let column = values
                                .iter()
                                .filter_map(|v| match (v, axis) {
                                    (FieldValue::GeoPoint { lat, .. }, GeoAxis::Lat) => Some(*lat),
                                    (FieldValue::GeoPoint { lon, .. }, GeoAxis::Lon) => Some(*lon),
                                    _ => None,
                                })
                                .map(ColumnValue::number)
                                .collect();
                            prepared.columns.push((
                                format!("{name}.{}", axis.suffix()),
                                FieldType::Number,
                                column,
                            ));
                        }
                    }
                    _ => {}
                }
            }

            let columnar = (entry.indexed && entry.field_type.has_column())
                || self.config.facet_fields.iter().any(|f| f == name);
            if columnar {
                let column: Vec<ColumnValue> =
                    values.iter().filter_map(ColumnValue::from_field_value).collect();
                if !column.is_empty() {
                    prepared
                        .columns
                        .push((name.to_string(), entry.field_type, column));
                }
            }

            if entry.stored {
                prepared.stored.insert(name.to_string(), values);
            }
        }
        Ok(prepared)
    }

    /// The values of one field converted to the schema type.
    fn coerce_field(
        &self,
        name: &str,
        entry: &FieldEntry,
        field: &DocumentField,
    ) -> Result<Vec<FieldValue>> {
        if let Some(declared) = field.field_type {
            let compatible = declared == entry.field_type
                || (declared.has_terms() && entry.field_type.has_terms());
            if !compatible {
                return Err(QuarryError::field_type_mismatch(
                    name,
                    entry.field_type.name(),
                    declared.name(),
                ));
            }
        }

        // JSON byte arrays arrive as numbers.
        if entry.field_type == FieldType::Binary
            && !field.values.is_empty()
            && field.values.iter().all(|v| matches!(v, FieldValue::Number(_)))
        {
            let bytes = field
                .values
                .iter()
                .filter_map(FieldValue::as_number)
                .map(|n| {
                    (n.fract() == 0.0 && (0.0..=255.0).contains(&n))
                        .then_some(n as u8)
                        .ok_or_else(|| {
                            QuarryError::field_type_mismatch(name, "byte (0-255)", n.to_string())
                        })
                })
                .collect::<Result<Vec<u8>>>()?;
            return Ok(vec![FieldValue::Binary(bytes)]);
        }

        let mut values = Vec::with_capacity(field.values.len());
        for value in &field.values {
            let value = value.clone().coerce(name, entry.field_type)?;
            if let Some(text) = value.as_text() {
                if text.len() > self.limits.max_field_length {
                    return Err(QuarryError::resource_exhausted(format!(
                        "field '{name}' value of {} bytes exceeds the limit of {}",
                        text.len(),
                        self.limits.max_field_length
                    )));
                }
            }
            values.push(value);
        }
        Ok(values)
    }
}

/// Positioned terms of a multi-valued Text field; each value starts
/// [`POSITION_GAP`] positions after the last token of the previous one.
fn analyze_values(analyzer: &dyn Analyzer, values: &[FieldValue]) -> Result<Vec<AnalyzedTerm>> {
    let mut terms = Vec::new();
    let mut base = 0u32;
    for text in values.iter().filter_map(FieldValue::as_text) {
        let mut last = None;
        for token in analyzer.analyze(text)? {
            let position = base + token.position as u32;
            last = Some(position);
            terms.push(AnalyzedTerm::new(token.text, position));
        }
        if let Some(last) = last {
            base = last + 1 + POSITION_GAP;
        }
    }
    Ok(terms)
}

/// Whitespace tokens with offsets, for fields that are not analyzed.
fn keyword_tokens(phrase: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in phrase.char_indices().chain([(phrase.len(), ' ')]) {
        match (start, c.is_whitespace()) {
            (None, false) => start = Some(i),
            (Some(s), true) => {
                tokens.push(Token::with_offsets(
                    &phrase[s..i],
                    tokens.len(),
                    s,
                    i,
                ));
                start = None;
            }
            _ => {}
        }
    }
    tokens
}

fn remove(state: &mut IndexState, id: &str) -> bool {
    let Some((doc_id, _)) = state.store.remove(id) else {
        return false;
    };
    for (field, term) in state.inverted.delete(doc_id) {
        state.trigrams.remove(&field, &term);
    }
    state.columns.remove(doc_id);
    true
}

fn apply(state: &mut IndexState, document: PreparedDocument) {
    remove(state, &document.id);

    let doc_id = state.next_doc_id;
    state.next_doc_id += 1;
    for (field, terms) in &document.terms {
        for term in state.inverted.insert(doc_id, field, terms) {
            state.trigrams.add(field, &term);
        }
    }
    for (field, field_type, values) in document.columns {
        state.columns.insert(doc_id, &field, field_type, values);
    }
    state.store.insert(
        doc_id,
        StoredDocument {
            id: document.id,
            boost: document.boost,
            fields: document.stored,
        },
    );
}
