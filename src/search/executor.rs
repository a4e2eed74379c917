//! Query execution against one consistent snapshot of an index.
//!
//! Every node of the query tree evaluates to a candidate set: the matching
//! documents with their scores. Boolean nodes combine the sets of their
//! children. The search then applies document boosts, `min_score`, facets,
//! sorting, pagination and highlighting, in that order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::{Analyzer, AnalyzerRegistry};
use crate::config::Limits;
use crate::document::field_value::parse_date;
use crate::document::fields_to_json;
use crate::error::{QuarryError, Result};
use crate::facet::FacetAggregator;
use crate::highlight::{HighlightConfig, HighlightFragment, Highlighter};
use crate::index::columns::{Column, ColumnValue, FieldColumns, is_valid_range};
use crate::index::inverted::{FieldIndex, InvertedIndex};
use crate::index::posting::{DocId, PostingList};
use crate::index::store::{DocumentStore, StoredDocument};
use crate::query::Query;
use crate::query::fuzzy::{FuzzyMode, MAX_FUZZY_DISTANCE, expand_fuzzy};
use crate::query::wildcard::{CHECK_INTERVAL, WildcardPattern, expand_prefix, expand_wildcard};
use crate::schema::{FieldEntry, FieldType, ResolvedField, Schema};
use crate::search::options::{Deadline, SearchHit, SearchOptions, SearchResults, SortBy, SortOrder};
use crate::search::scoring::{Scorer, ScoringConfig, TermStatistics};

/// Matching documents and their scores.
pub type Candidates = BTreeMap<DocId, f32>;

/// Terms that matched, per field, for highlighting.
pub type MatchedTerms = BTreeMap<String, BTreeSet<String>>;

/// Read-only view of an index that queries run against.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub schema: &'a Schema,
    pub inverted: &'a InvertedIndex,
    pub columns: &'a FieldColumns,
    pub store: &'a DocumentStore,
    pub analyzers: &'a AnalyzerRegistry,
    /// Analyzer of Text fields that do not name one.
    pub default_analyzer: &'a str,
    pub facet_fields: &'a [String],
    pub scoring: ScoringConfig,
    pub limits: &'a Limits,
}

impl<'a> SearchContext<'a> {
    pub fn analyzer_for(&self, entry: &FieldEntry) -> Result<Arc<dyn Analyzer>> {
        self.analyzers
            .get(entry.analyzer.as_deref().unwrap_or(self.default_analyzer))
    }

    fn resolve(&self, field: &str) -> Result<ResolvedField<'a>> {
        self.schema
            .resolve(field)
            .ok_or_else(|| QuarryError::unknown_field(field))
    }

    /// The value column backing facets and sorts on `field`.
    pub fn value_column(&self, field: &str) -> Result<(FieldType, Option<&'a Column>)> {
        let resolved = self.resolve(field)?;
        let columnar = resolved.geo_axis.is_some()
            || (resolved.indexed() && resolved.field_type.has_column())
            || (self.facet_fields.iter().any(|f| f == field)
                && !matches!(
                    resolved.field_type,
                    FieldType::Binary | FieldType::GeoPoint
                ));
        if !columnar {
            return Err(QuarryError::invalid_argument(format!(
                "field '{field}' has no value column; declare it indexed or list it in facet_fields"
            )));
        }
        Ok((resolved.field_type, self.columns.get(field)))
    }

    /// Run a search: evaluate, filter, facet, sort, paginate and highlight.
    pub fn search(
        &self,
        query: &Query,
        options: &SearchOptions,
        deadline: &Deadline,
    ) -> Result<SearchResults> {
        let started = Instant::now();
        deadline.check()?;

        // Explicit facet and sort fields must exist before anything runs.
        let mut sort_columns = Vec::with_capacity(options.sort.len());
        for key in &options.sort {
            match key {
                SortBy::Field { field, .. } => sort_columns.push(self.value_column(field)?.1),
                SortBy::Score => sort_columns.push(None),
            }
        }
        if let Some(facets) = &options.facets {
            for (_, request) in facets.iter() {
                self.value_column(request.field())?;
            }
        }

        let mut executor = Executor::new(self, deadline);
        let candidates = executor.execute(query)?;

        let scored: Vec<(DocId, f32)> = candidates
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let boost = self.store.get(doc_id)?.boost;
                Some((doc_id, score * boost))
            })
            .filter(|(_, score)| options.min_score.is_none_or(|min| *score >= min))
            .collect();
        let total_hits = scored.len();

        let mut facets = BTreeMap::new();
        if let Some(spec) = &options.facets {
            let matched: Vec<DocId> = scored.iter().map(|(doc_id, _)| *doc_id).collect();
            let aggregator = FacetAggregator::new(
                &matched,
                self.store.len(),
                self.limits.max_facet_buckets,
                deadline,
            );
            for (name, request) in spec.iter() {
                let (field_type, column) = self.value_column(request.field())?;
                facets.insert(
                    name.to_string(),
                    aggregator.aggregate(request, field_type, column)?,
                );
            }
        }

        deadline.check()?;
        let scored = self.sort(scored, &options.sort, &sort_columns);

        let mut hits = Vec::new();
        for (doc_id, score) in scored.into_iter().skip(options.offset).take(options.limit) {
            let Some(doc) = self.store.get(doc_id) else {
                continue;
            };
            let highlights = match &options.highlight {
                Some(config) => self.highlight_hit(doc, executor.matched_terms(), config)?,
                None => BTreeMap::new(),
            };
            hits.push(SearchHit {
                id: doc.id.clone(),
                score: options.include_scores.then_some(score),
                highlights,
                fields: options.include_stored.then(|| {
                    fields_to_json(doc.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
                }),
            });
        }

        Ok(SearchResults {
            hits,
            total_hits,
            facets,
            took: started.elapsed(),
        })
    }

    fn sort(
        &self,
        scored: Vec<(DocId, f32)>,
        keys: &[SortBy],
        columns: &[Option<&'a Column>],
    ) -> Vec<(DocId, f32)> {
        struct Entry<'k> {
            doc_id: DocId,
            score: f32,
            external: &'k str,
            values: Vec<Option<&'k ColumnValue>>,
        }

        let mut entries: Vec<Entry<'a>> = scored
            .into_iter()
            .map(|(doc_id, score)| {
                let values = keys
                    .iter()
                    .zip(columns)
                    .map(|(key, column)| {
                        let values = (*column)?.get(doc_id)?;
                        match key {
                            SortBy::Field {
                                order: SortOrder::Asc,
                                ..
                            } => values.iter().min(),
                            _ => values.iter().max(),
                        }
                    })
                    .collect();
                Entry {
                    doc_id,
                    score,
                    external: self.store.external_id(doc_id).unwrap_or_default(),
                    values,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            if keys.is_empty() {
                return b.score.total_cmp(&a.score).then_with(|| a.external.cmp(b.external));
            }
            for (k, key) in keys.iter().enumerate() {
                let ordering = match key {
                    SortBy::Score => b.score.total_cmp(&a.score),
                    SortBy::Field { order, .. } => match (a.values[k], b.values[k]) {
                        (Some(x), Some(y)) if *order == SortOrder::Asc => x.cmp(y),
                        (Some(x), Some(y)) => y.cmp(x),
                        // Missing values last in either direction.
                        (Some(_), None) => Ordering::Less,
                        (None, Some(_)) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    },
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.external.cmp(b.external)
        });
        entries.into_iter().map(|e| (e.doc_id, e.score)).collect()
    }

    fn highlight_hit(
        &self,
        doc: &StoredDocument,
        matched: &MatchedTerms,
        config: &HighlightConfig,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let empty = BTreeSet::new();
        let fields: Vec<&str> = if config.fields.is_empty() {
            matched
                .keys()
                .map(String::as_str)
                .filter(|field| {
                    self.schema.get(field).is_some_and(|entry| {
                        entry.stored && entry.field_type == FieldType::Text
                    })
                })
                .collect()
        } else {
            config.fields.iter().map(String::as_str).collect()
        };

        let mut highlights = BTreeMap::new();
        for field in fields {
            let terms = matched.get(field).unwrap_or(&empty);
            let fragments = self.highlight(doc, field, terms, config)?;
            if !fragments.is_empty() {
                highlights.insert(
                    field.to_string(),
                    fragments.into_iter().map(|f| f.text).collect(),
                );
            }
        }
        Ok(highlights)
    }

    /// Fragments of a stored Text field with `terms` marked.
    pub fn highlight(
        &self,
        doc: &StoredDocument,
        field: &str,
        terms: &BTreeSet<String>,
        config: &HighlightConfig,
    ) -> Result<Vec<HighlightFragment>> {
        let resolved = self.resolve(field)?;
        if !resolved.stored() {
            return Err(QuarryError::field_not_stored(field));
        }
        if resolved.field_type != FieldType::Text {
            return Err(QuarryError::field_type_mismatch(
                field,
                FieldType::Text.name(),
                resolved.field_type.name(),
            ));
        }

        let analyzer = self.analyzer_for(resolved.entry)?;
        let highlighter = Highlighter::new(config.clone());
        let mut fragments = Vec::new();
        for text in doc.values(field).iter().filter_map(|v| v.as_text()) {
            fragments.extend(highlighter.highlight(text, analyzer.as_ref(), terms)?);
            if fragments.len() >= config.max_fragments {
                break;
            }
        }
        fragments.truncate(config.max_fragments);
        Ok(fragments)
    }
}

/// Evaluates a query tree into a candidate set.
pub struct Executor<'a, 'c> {
    ctx: &'c SearchContext<'a>,
    deadline: &'c Deadline,
    matched_terms: MatchedTerms,
    /// Depth of `must_not` nesting; terms matched under it are not recorded.
    negated: usize,
}

impl<'a, 'c> Executor<'a, 'c> {
    pub fn new(ctx: &'c SearchContext<'a>, deadline: &'c Deadline) -> Self {
        Executor {
            ctx,
            deadline,
            matched_terms: MatchedTerms::new(),
            negated: 0,
        }
    }

    pub fn matched_terms(&self) -> &MatchedTerms {
        &self.matched_terms
    }

    pub fn execute(&mut self, query: &Query) -> Result<Candidates> {
        self.deadline.check()?;
        match query {
            Query::Term { field, value } => self.term(field, value),
            Query::Phrase { field, terms, slop } => self.phrase(field, &terms.join(" "), *slop),
            Query::Fuzzy {
                field,
                term,
                max_distance,
            } => self.fuzzy(field, term, *max_distance),
            Query::Prefix { field, prefix } => self.prefix(field, prefix),
            Query::Wildcard { field, pattern } => self.wildcard(field, pattern),
            Query::Range {
                field,
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => {
                let lower = bound(lower.as_deref(), *lower_inclusive);
                let upper = bound(upper.as_deref(), *upper_inclusive);
                self.range(field, lower, upper)
            }
            Query::Boolean {
                must,
                should,
                must_not,
            } => self.boolean(must, should, must_not),
            Query::MatchAll => Ok(self.ctx.store.doc_ids().map(|id| (id, 1.0)).collect()),
        }
    }

    fn boolean(&mut self, must: &[Query], should: &[Query], must_not: &[Query]) -> Result<Candidates> {
        if must.is_empty() && should.is_empty() {
            return Ok(Candidates::new());
        }

        // Every required clause runs, even once the intersection is empty.
        let mut required: Option<Candidates> = None;
        for clause in must {
            let matched = self.execute(clause)?;
            required = Some(match required {
                None => matched,
                Some(acc) => acc
                    .into_iter()
                    .filter_map(|(doc_id, score)| matched.get(&doc_id).map(|s| (doc_id, score + s)))
                    .collect(),
            });
        }

        let mut optional = Candidates::new();
        for clause in should {
            for (doc_id, score) in self.optional_clause(clause)? {
                *optional.entry(doc_id).or_insert(0.0) += score;
            }
        }

        let mut result = match required {
            Some(mut required) => {
                for (doc_id, score) in required.iter_mut() {
                    if let Some(extra) = optional.get(doc_id) {
                        *score += extra;
                    }
                }
                required
            }
            None => optional,
        };

        if !must_not.is_empty() {
            self.negated += 1;
            let mut excluded = BTreeSet::new();
            let outcome = must_not.iter().try_for_each(|clause| {
                excluded.extend(self.optional_clause(clause)?.into_keys());
                Ok::<(), QuarryError>(())
            });
            self.negated -= 1;
            outcome?;
            result.retain(|doc_id, _| !excluded.contains(doc_id));
        }
        Ok(result)
    }

    /// A `should` / `must_not` clause: some errors degrade to no match.
    fn optional_clause(&mut self, clause: &Query) -> Result<Candidates> {
        match self.execute(clause) {
            Err(err) if err.is_clause_recoverable() => {
                log::warn!("clause '{clause}' matches nothing: {err}");
                Ok(Candidates::new())
            }
            other => other,
        }
    }

    fn record<S: Into<String>>(&mut self, field: &str, term: S) {
        if self.negated == 0 {
            self.matched_terms
                .entry(field.to_string())
                .or_default()
                .insert(term.into());
        }
    }

    /// Term dictionary of a field that may hold terms, or `None` when nothing
    /// was indexed into it.
    fn dictionary(&self, resolved: &ResolvedField<'a>) -> Result<Option<&'a FieldIndex>> {
        if !resolved.field_type.has_terms() {
            return Err(QuarryError::field_type_mismatch(
                &resolved.name,
                "text or keyword",
                resolved.field_type.name(),
            ));
        }
        if !resolved.indexed() {
            log::debug!("field '{}' is not indexed", resolved.name);
            return Ok(None);
        }
        Ok(self.ctx.inverted.field(&resolved.name))
    }

    fn scorer(&self, field_index: &FieldIndex, postings: &PostingList) -> Box<dyn Scorer> {
        self.ctx.scoring.scorer(TermStatistics {
            doc_freq: postings.len() as u64,
            total_docs: self.ctx.store.len() as u64,
            avg_field_length: field_index.average_length(),
        })
    }

    /// Scores of each term's documents, each weighted; a document keeps its
    /// best weighted score.
    fn best_of_terms(
        &mut self,
        field: &str,
        field_index: &FieldIndex,
        terms: &[(&str, f32)],
    ) -> Candidates {
        let mut candidates = Candidates::new();
        for &(term, weight) in terms {
            let Some(postings) = field_index.postings(term) else {
                continue;
            };
            let scorer = self.scorer(field_index, postings);
            for posting in postings.iter() {
                let length = field_index.length(posting.doc_id) as f32;
                let score = weight * scorer.score(posting.term_frequency as f32, length);
                let entry = candidates.entry(posting.doc_id).or_insert(0.0);
                if score > *entry {
                    *entry = score;
                }
            }
            self.record(field, term);
        }
        candidates
    }

    fn term(&mut self, field: &str, value: &str) -> Result<Candidates> {
        let resolved = self.ctx.resolve(field)?;
        match resolved.field_type {
            FieldType::Keyword => {
                let Some(field_index) = self.dictionary(&resolved)? else {
                    return Ok(Candidates::new());
                };
                Ok(self.best_of_terms(field, field_index, &[(value, 1.0)]))
            }
            FieldType::Text => self.phrase(field, value, 0),
            FieldType::Number | FieldType::Boolean | FieldType::Date => {
                let value = column_value(field, resolved.field_type, value)?;
                if !resolved.indexed() {
                    return Ok(Candidates::new());
                }
                Ok(self.column_range(
                    field,
                    Bound::Included(value.clone()),
                    Bound::Included(value),
                ))
            }
            FieldType::Binary | FieldType::GeoPoint => Err(QuarryError::field_type_mismatch(
                field,
                "a searchable type",
                resolved.field_type.name(),
            )),
        }
    }

    /// Analyzed Text: a single position is a term lookup (several tokens
    /// there are alternatives); several positions form a phrase.
    fn phrase(&mut self, field: &str, text: &str, slop: u32) -> Result<Candidates> {
        let resolved = self.ctx.resolve(field)?;
        if resolved.field_type != FieldType::Text {
            if resolved.field_type == FieldType::Keyword && slop == 0 {
                return self.term(field, text);
            }
            return Err(QuarryError::field_type_mismatch(
                field,
                FieldType::Text.name(),
                resolved.field_type.name(),
            ));
        }
        let Some(field_index) = self.dictionary(&resolved)? else {
            return Ok(Candidates::new());
        };

        let analyzer = self.ctx.analyzer_for(resolved.entry)?;
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut last_position = None;
        for token in analyzer.tokens(text)? {
            if last_position == Some(token.position) {
                if let Some(group) = groups.last_mut() {
                    group.push(token.text);
                }
            } else {
                last_position = Some(token.position);
                groups.push(vec![token.text]);
            }
        }

        match groups.as_slice() {
            [] => Ok(Candidates::new()),
            [alternatives] => {
                let terms: Vec<(&str, f32)> =
                    alternatives.iter().map(|t| (t.as_str(), 1.0)).collect();
                Ok(self.best_of_terms(field, field_index, &terms))
            }
            _ => {
                let terms: Vec<String> = groups.into_iter().filter_map(|g| g.into_iter().next()).collect();
                Ok(self.exact_phrase(field, field_index, &terms, slop))
            }
        }
    }

    fn exact_phrase(
        &mut self,
        field: &str,
        field_index: &FieldIndex,
        terms: &[String],
        slop: u32,
    ) -> Candidates {
        let mut lists = Vec::with_capacity(terms.len());
        for term in terms {
            match field_index.postings(term) {
                Some(list) => lists.push(list),
                None => return Candidates::new(),
            }
        }
        let scorers: Vec<Box<dyn Scorer>> =
            lists.iter().map(|list| self.scorer(field_index, list)).collect();

        // Drive the intersection from the shortest list.
        let Some(shortest) = lists.iter().min_by_key(|list| list.len()) else {
            return Candidates::new();
        };
        let mut candidates = Candidates::new();
        for doc_id in shortest.doc_ids() {
            let mut positions = Vec::with_capacity(lists.len());
            for list in &lists {
                match list.get(doc_id) {
                    Some(posting) => positions.push(posting.positions.as_slice()),
                    None => break,
                }
            }
            if positions.len() != lists.len() {
                continue;
            }
            let freq = phrase_frequency(&positions, slop);
            if freq > 0.0 {
                let length = field_index.length(doc_id) as f32;
                let score = scorers.iter().map(|s| s.score(freq, length)).sum();
                candidates.insert(doc_id, score);
            }
        }

        if !candidates.is_empty() {
            for term in terms {
                self.record(field, term.as_str());
            }
        }
        candidates
    }

    /// Normalized form of a query term for a Text field; Keyword terms are
    /// used verbatim.
    fn normalize(&self, resolved: &ResolvedField<'a>, term: &str) -> Result<String> {
        if resolved.field_type == FieldType::Text {
            self.ctx.analyzer_for(resolved.entry)?.normalize(term)
        } else {
            Ok(term.to_string())
        }
    }

    fn fuzzy(&mut self, field: &str, term: &str, max_distance: u32) -> Result<Candidates> {
        if max_distance > MAX_FUZZY_DISTANCE {
            return Err(QuarryError::invalid_argument(format!(
                "fuzzy distance must be at most {MAX_FUZZY_DISTANCE}, got {max_distance}"
            )));
        }
        let resolved = self.ctx.resolve(field)?;
        let Some(field_index) = self.dictionary(&resolved)? else {
            return Ok(Candidates::new());
        };
        let pattern = self.normalize(&resolved, term)?;
        let expansions = expand_fuzzy(
            field_index.terms(),
            &pattern,
            max_distance,
            FuzzyMode::Term,
            self.ctx.limits.max_expansions,
            self.deadline,
        )?;
        log::debug!("fuzzy '{pattern}'~{max_distance} expanded to {} terms", expansions.len());

        let weighted: Vec<(&str, f32)> = expansions
            .iter()
            .map(|e| (e.term, 1.0 / (1.0 + e.distance as f32)))
            .collect();
        Ok(self.best_of_terms(field, field_index, &weighted))
    }

    fn prefix(&mut self, field: &str, prefix: &str) -> Result<Candidates> {
        let resolved = self.ctx.resolve(field)?;
        let Some(field_index) = self.dictionary(&resolved)? else {
            return Ok(Candidates::new());
        };
        let prefix = self.normalize(&resolved, prefix)?;
        let terms = expand_prefix(
            field_index.terms(),
            &prefix,
            self.ctx.limits.max_expansions,
            self.deadline,
        )?;
        let weighted: Vec<(&str, f32)> = terms.into_iter().map(|t| (t, 1.0)).collect();
        Ok(self.best_of_terms(field, field_index, &weighted))
    }

    fn wildcard(&mut self, field: &str, pattern: &str) -> Result<Candidates> {
        let resolved = self.ctx.resolve(field)?;
        let Some(field_index) = self.dictionary(&resolved)? else {
            return Ok(Candidates::new());
        };
        let pattern = WildcardPattern::new(&self.normalize(&resolved, pattern)?)?;
        let terms = expand_wildcard(
            field_index.terms(),
            &pattern,
            self.ctx.limits.max_expansions,
            self.deadline,
        )?;
        let weighted: Vec<(&str, f32)> = terms.into_iter().map(|t| (t, 1.0)).collect();
        Ok(self.best_of_terms(field, field_index, &weighted))
    }

    fn range(
        &mut self,
        field: &str,
        lower: Bound<String>,
        upper: Bound<String>,
    ) -> Result<Candidates> {
        let resolved = self.ctx.resolve(field)?;
        if !resolved.indexed() {
            log::debug!("field '{field}' is not indexed");
            return Ok(Candidates::new());
        }
        match resolved.field_type {
            FieldType::Text => self.term_range(&resolved, lower, upper),
            FieldType::Keyword | FieldType::Number | FieldType::Boolean | FieldType::Date => {
                let ty = resolved.field_type;
                let lower = map_bound(lower, |v| column_value(field, ty, &v))?;
                let upper = map_bound(upper, |v| column_value(field, ty, &v))?;
                Ok(self.column_range(field, lower, upper))
            }
            FieldType::Binary | FieldType::GeoPoint => Err(QuarryError::field_type_mismatch(
                field,
                "a rangeable type",
                resolved.field_type.name(),
            )),
        }
    }

    fn column_range(
        &self,
        field: &str,
        lower: Bound<ColumnValue>,
        upper: Bound<ColumnValue>,
    ) -> Candidates {
        self.ctx
            .columns
            .get(field)
            .map(|column| column.range(lower, upper).into_iter().map(|id| (id, 1.0)).collect())
            .unwrap_or_default()
    }

    /// Lexicographic range over the normalized terms of a Text field.
    fn term_range(
        &mut self,
        resolved: &ResolvedField<'a>,
        lower: Bound<String>,
        upper: Bound<String>,
    ) -> Result<Candidates> {
        let Some(field_index) = self.dictionary(resolved)? else {
            return Ok(Candidates::new());
        };
        let lower = map_bound(lower, |v| self.normalize(resolved, &v))?;
        let upper = map_bound(upper, |v| self.normalize(resolved, &v))?;
        let lower = as_str_bound(&lower);
        let upper = as_str_bound(&upper);
        if !is_valid_range(&lower, &upper) {
            return Ok(Candidates::new());
        }

        let mut candidates = Candidates::new();
        for (visited, (_, postings)) in field_index
            .terms()
            .range::<str, _>((lower, upper))
            .enumerate()
        {
            if visited % CHECK_INTERVAL == CHECK_INTERVAL - 1 {
                self.deadline.check()?;
            }
            if visited == self.ctx.limits.max_expansions {
                log::warn!(
                    "range on '{}' truncated at {} terms",
                    resolved.name,
                    self.ctx.limits.max_expansions
                );
                break;
            }
            candidates.extend(postings.doc_ids().map(|id| (id, 1.0)));
        }
        Ok(candidates)
    }
}

/// How often the terms occur within `slop` of each other, weighting each
/// occurrence by `1 / (1 + spread)`.
///
/// Position lists are shifted by their index in the phrase, so an exact
/// phrase lines up on one value; the spread of a candidate is the distance
/// between its smallest and largest shifted position.
pub fn phrase_frequency(positions: &[&[u32]], slop: u32) -> f32 {
    if positions.iter().any(|p| p.is_empty()) {
        return 0.0;
    }
    let shifted: Vec<Vec<i64>> = positions
        .iter()
        .enumerate()
        .map(|(i, p)| p.iter().map(|&x| x as i64 - i as i64).collect())
        .collect();

    let mut cursor = vec![0usize; shifted.len()];
    let mut freq = 0.0f32;
    loop {
        let mut min = (i64::MAX, 0usize);
        let mut max = i64::MIN;
        for (i, list) in shifted.iter().enumerate() {
            let value = list[cursor[i]];
            if value < min.0 {
                min = (value, i);
            }
            max = max.max(value);
        }
        let spread = (max - min.0) as u32;
        if spread <= slop {
            freq += 1.0 / (1.0 + spread as f32);
        }
        cursor[min.1] += 1;
        if cursor[min.1] == shifted[min.1].len() {
            return freq;
        }
    }
}

fn bound(value: Option<&str>, inclusive: bool) -> Bound<String> {
    match value {
        None => Bound::Unbounded,
        Some(v) if inclusive => Bound::Included(v.to_string()),
        Some(v) => Bound::Excluded(v.to_string()),
    }
}

fn map_bound<T, U, F>(bound: Bound<T>, f: F) -> Result<Bound<U>>
where
    F: FnOnce(T) -> Result<U>,
{
    Ok(match bound {
        Bound::Included(v) => Bound::Included(f(v)?),
        Bound::Excluded(v) => Bound::Excluded(f(v)?),
        Bound::Unbounded => Bound::Unbounded,
    })
}

fn as_str_bound(bound: &Bound<String>) -> Bound<&str> {
    match bound {
        Bound::Included(v) => Bound::Included(v.as_str()),
        Bound::Excluded(v) => Bound::Excluded(v.as_str()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Parse a query-side value for a column of the given type.
fn column_value(field: &str, field_type: FieldType, raw: &str) -> Result<ColumnValue> {
    let mismatch = || QuarryError::field_type_mismatch(field, field_type.name(), format!("{raw:?}"));
    match field_type {
        FieldType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ColumnValue::number)
            .ok_or_else(mismatch),
        FieldType::Date => parse_date(raw.trim())
            .map(|d| d.timestamp_millis() as f64)
            .or_else(|| raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()))
            .map(ColumnValue::number)
            .ok_or_else(mismatch),
        FieldType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(ColumnValue::Boolean(true)),
            "false" => Ok(ColumnValue::Boolean(false)),
            _ => Err(mismatch()),
        },
        FieldType::Text | FieldType::Keyword => Ok(ColumnValue::Text(raw.to_string())),
        FieldType::Binary | FieldType::GeoPoint => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_frequency_exact() {
        // "a b" with a at 0 and 5, b at 1.
        assert_eq!(phrase_frequency(&[&[0, 5], &[1]], 0), 1.0);
        assert_eq!(phrase_frequency(&[&[0], &[2]], 0), 0.0);
    }

    #[test]
    fn test_phrase_frequency_slop() {
        // Two tokens between a and b.
        let positions: [&[u32]; 2] = [&[0], &[3]];
        assert_eq!(phrase_frequency(&positions, 1), 0.0);
        assert!((phrase_frequency(&positions, 2) - 1.0 / 3.0).abs() < 1e-6);

        // Reversed order costs two.
        let reversed: [&[u32]; 2] = [&[1], &[0]];
        assert_eq!(phrase_frequency(&reversed, 1), 0.0);
        assert!(phrase_frequency(&reversed, 2) > 0.0);
    }

    #[test]
    fn test_column_value_parsing() {
        assert_eq!(
            column_value("price", FieldType::Number, "10").unwrap(),
            ColumnValue::number(10.0)
        );
        assert!(matches!(
            column_value("price", FieldType::Number, "cheap"),
            Err(QuarryError::FieldTypeMismatch { .. })
        ));
        assert_eq!(
            column_value("day", FieldType::Date, "1970-01-02").unwrap(),
            ColumnValue::number(86_400_000.0)
        );
        assert_eq!(
            column_value("ok", FieldType::Boolean, "TRUE").unwrap(),
            ColumnValue::Boolean(true)
        );
    }
}
