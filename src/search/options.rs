//! Search options, cancellation and result types.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QuarryError, Result};
use crate::facet::{FacetResult, FacetSpec};
use crate::highlight::HighlightConfig;

/// A cloneable flag a caller sets to abandon a running search.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Point in time after which a read gives up with a timeout error.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(timeout: Duration) -> Self {
        Deadline {
            at: Instant::now().checked_add(timeout),
            cancel: None,
        }
    }

    pub fn new(timeout: Option<Duration>, cancel: Option<CancellationToken>) -> Self {
        Deadline {
            at: timeout.and_then(|t| Instant::now().checked_add(t)),
            cancel,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
            || self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn check(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(QuarryError::timeout("operation cancelled"));
        }
        if self.at.is_some_and(|at| Instant::now() >= at) {
            return Err(QuarryError::timeout("deadline exceeded"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// One key of a multi-key sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Relevance, highest first.
    Score,
    Field { field: String, order: SortOrder },
}

impl SortBy {
    pub fn field<S: Into<String>>(field: S, order: SortOrder) -> Self {
        SortBy::Field {
            field: field.into(),
            order,
        }
    }
}

/// Options of a single search.
///
/// Sort keys apply left to right; ties after the last key (or by score when
/// there are no keys) break on document id ascending.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub offset: usize,
    /// Hits scoring below this are dropped before counting and faceting.
    pub min_score: Option<f32>,
    pub include_scores: bool,
    /// Return stored field values with each hit.
    pub include_stored: bool,
    pub highlight: Option<HighlightConfig>,
    pub facets: Option<FacetSpec>,
    pub sort: Vec<SortBy>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            limit: 10,
            offset: 0,
            min_score: None,
            include_scores: true,
            include_stored: false,
            highlight: None,
            facets: None,
            sort: Vec::new(),
            timeout: None,
            cancel: None,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn include_scores(mut self, include: bool) -> Self {
        self.include_scores = include;
        self
    }

    pub fn include_stored(mut self, include: bool) -> Self {
        self.include_stored = include;
        self
    }

    pub fn with_highlight(mut self, config: HighlightConfig) -> Self {
        self.highlight = Some(config);
        self
    }

    pub fn with_facets(mut self, facets: FacetSpec) -> Self {
        self.facets = Some(facets);
        self
    }

    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Highlighted fragments per field, in source order.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub highlights: BTreeMap<String, Vec<String>>,
    /// Stored values, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
}

/// The page of hits plus aggregate information about the full match set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// Matching documents before pagination.
    pub total_hits: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, FacetResult>,
    #[serde(serialize_with = "serialize_millis")]
    pub took: Duration,
}

impl SearchResults {
    /// Ids of the hits, in rank order.
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline() {
        assert!(Deadline::none().check().is_ok());
        assert!(Deadline::after(Duration::ZERO).check().is_err());
        assert!(Deadline::after(Duration::from_secs(60)).check().is_ok());

        let token = CancellationToken::new();
        let deadline = Deadline::new(None, Some(token.clone()));
        assert!(!deadline.is_expired());
        token.cancel();
        let err = deadline.check().unwrap_err();
        assert_eq!(err.kind().code(), "ERR_TIMEOUT");
    }

    #[test]
    fn test_sort_serde() {
        let sort: SortBy =
            serde_json::from_str(r#"{"field": {"field": "price", "order": "asc"}}"#).unwrap();
        assert_eq!(sort, SortBy::field("price", SortOrder::Asc));
        let score: SortBy = serde_json::from_str(r#""score""#).unwrap();
        assert_eq!(score, SortBy::Score);
    }
}
