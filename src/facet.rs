//! Faceted aggregation over the documents matched by a query.
//!
//! Facets are computed from the per-field value columns after the full
//! candidate set of the base query is known, so pagination never changes
//! them.
//!
//! ```json
//! {
//!   "by_brand": {"type": "terms", "field": "brand", "size": 5},
//!   "price_bands": {"type": "range", "field": "price",
//!                   "ranges": [{"to": 25}, {"from": 25, "to": 100}, {"from": 100}]},
//!   "per_month": {"type": "date_histogram", "field": "released", "interval": "month"}
//! }
//! ```

pub mod calendar;
pub mod hyperloglog;

use std::collections::BTreeMap;

use ahash::AHashSet;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};
use crate::index::columns::{Column, ColumnValue, format_number};
use crate::index::posting::DocId;
use crate::query::wildcard::CHECK_INTERVAL;
use crate::schema::FieldType;
use crate::search::options::Deadline;

pub use calendar::CalendarInterval;
pub use hyperloglog::HyperLogLog;

/// Distinct values counted exactly before switching to a sketch.
pub const EXACT_CARDINALITY_THRESHOLD: usize = 3000;

/// Named facet requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetSpec {
    requests: BTreeMap<String, FacetRequest>,
}

impl FacetSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn add<S: Into<String>>(mut self, name: S, request: FacetRequest) -> Self {
        self.requests.insert(name.into(), request);
        self
    }

    pub fn terms<S: Into<String>, F: Into<String>>(self, name: S, field: F, size: usize) -> Self {
        self.add(
            name,
            FacetRequest::Terms {
                field: field.into(),
                size,
                min_count: 1,
            },
        )
    }

    pub fn range<S: Into<String>, F: Into<String>>(
        self,
        name: S,
        field: F,
        ranges: Vec<RangeSpec>,
    ) -> Self {
        self.add(
            name,
            FacetRequest::Range {
                field: field.into(),
                ranges,
            },
        )
    }

    pub fn histogram<S: Into<String>, F: Into<String>>(
        self,
        name: S,
        field: F,
        interval: f64,
    ) -> Self {
        self.add(
            name,
            FacetRequest::Histogram {
                field: field.into(),
                interval,
            },
        )
    }

    pub fn date_histogram<S: Into<String>, F: Into<String>>(
        self,
        name: S,
        field: F,
        interval: CalendarInterval,
    ) -> Self {
        self.add(
            name,
            FacetRequest::DateHistogram {
                field: field.into(),
                interval,
            },
        )
    }

    pub fn stats<S: Into<String>, F: Into<String>>(self, name: S, field: F) -> Self {
        self.add(name, FacetRequest::Stats { field: field.into() })
    }

    pub fn cardinality<S: Into<String>, F: Into<String>>(self, name: S, field: F) -> Self {
        self.add(
            name,
            FacetRequest::Cardinality {
                field: field.into(),
                precision: hyperloglog::DEFAULT_PRECISION,
            },
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FacetRequest)> {
        self.requests.iter().map(|(name, request)| (name.as_str(), request))
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn default_size() -> usize {
    10
}

fn default_min_count() -> u64 {
    1
}

fn default_precision() -> u8 {
    hyperloglog::DEFAULT_PRECISION
}

/// A single aggregation over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacetRequest {
    /// Count per exact value.
    Terms {
        field: String,
        #[serde(default = "default_size")]
        size: usize,
        #[serde(default = "default_min_count")]
        min_count: u64,
    },
    /// Caller-defined numeric ranges, `[from, to)` except the last, which
    /// is closed.
    Range { field: String, ranges: Vec<RangeSpec> },
    /// Fixed-width numeric buckets starting at the smallest matched value.
    Histogram { field: String, interval: f64 },
    DateHistogram {
        field: String,
        interval: CalendarInterval,
    },
    Stats { field: String },
    Cardinality {
        field: String,
        #[serde(default = "default_precision")]
        precision: u8,
    },
}

impl FacetRequest {
    pub fn field(&self) -> &str {
        match self {
            FacetRequest::Terms { field, .. }
            | FacetRequest::Range { field, .. }
            | FacetRequest::Histogram { field, .. }
            | FacetRequest::DateHistogram { field, .. }
            | FacetRequest::Stats { field }
            | FacetRequest::Cardinality { field, .. } => field,
        }
    }
}

/// One bucket of a range facet. Open sides are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
}

impl RangeSpec {
    pub fn new(from: Option<f64>, to: Option<f64>) -> Self {
        RangeSpec {
            key: None,
            from,
            to,
        }
    }

    pub fn with_key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The explicit key, or `<from>_<to>` with `*` for an open side.
    pub fn key(&self) -> String {
        if let Some(key) = &self.key {
            return key.clone();
        }
        let side = |v: Option<f64>| v.map(format_number).unwrap_or_else(|| "*".to_string());
        format!("{}_{}", side(self.from), side(self.to))
    }

    fn contains(&self, value: f64, closed: bool) -> bool {
        let above = self.from.is_none_or(|from| value >= from);
        let below = self
            .to
            .is_none_or(|to| if closed { value <= to } else { value < to });
        above && below
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub key: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

impl FacetBucket {
    fn keyed<S: Into<String>>(key: S, count: u64) -> Self {
        FacetBucket {
            key: key.into(),
            count,
            from: None,
            to: None,
        }
    }
}

/// Statistics of a numeric field over the matched documents. Dates are
/// epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacetResult {
    Terms {
        buckets: Vec<FacetBucket>,
        /// Documents counted in buckets cut by `size`.
        other_count: u64,
        /// Matched documents without a value.
        missing: u64,
    },
    Range { buckets: Vec<FacetBucket> },
    Histogram { buckets: Vec<FacetBucket> },
    DateHistogram { buckets: Vec<FacetBucket> },
    Stats(FieldStats),
    Cardinality { value: u64, exact: bool },
}

impl FacetResult {
    /// Buckets of a bucketing facet; empty for stats and cardinality.
    pub fn buckets(&self) -> &[FacetBucket] {
        match self {
            FacetResult::Terms { buckets, .. }
            | FacetResult::Range { buckets }
            | FacetResult::Histogram { buckets }
            | FacetResult::DateHistogram { buckets } => buckets,
            FacetResult::Stats(_) | FacetResult::Cardinality { .. } => &[],
        }
    }

    /// Count of the bucket with the given key.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.buckets().iter().find(|b| b.key == key).map(|b| b.count)
    }
}

/// Computes facets over one matched document set.
#[derive(Debug)]
pub struct FacetAggregator<'a> {
    matched: &'a [DocId],
    total_docs: usize,
    max_buckets: usize,
    deadline: &'a Deadline,
}

impl<'a> FacetAggregator<'a> {
    /// `total_docs` is the index size; a match of every document takes the
    /// running-statistics fast path.
    pub fn new(
        matched: &'a [DocId],
        total_docs: usize,
        max_buckets: usize,
        deadline: &'a Deadline,
    ) -> Self {
        FacetAggregator {
            matched,
            total_docs,
            max_buckets,
            deadline,
        }
    }

    /// Aggregate `request` over `column`, whose values have `field_type`.
    /// A missing column means no matched document has a value.
    pub fn aggregate(
        &self,
        request: &FacetRequest,
        field_type: FieldType,
        column: Option<&Column>,
    ) -> Result<FacetResult> {
        let field = request.field();
        match request {
            FacetRequest::Terms {
                size, min_count, ..
            } => self.terms(field_type, column, *size, *min_count),
            FacetRequest::Range { ranges, .. } => {
                require_numeric(field, field_type)?;
                self.range(column, ranges)
            }
            FacetRequest::Histogram { interval, .. } => {
                require_numeric(field, field_type)?;
                self.histogram(column, *interval)
            }
            FacetRequest::DateHistogram { interval, .. } => {
                if field_type != FieldType::Date {
                    return Err(QuarryError::field_type_mismatch(
                        field,
                        FieldType::Date.name(),
                        field_type.name(),
                    ));
                }
                self.date_histogram(column, *interval)
            }
            FacetRequest::Stats { .. } => {
                require_numeric(field, field_type)?;
                self.stats(column)
            }
            FacetRequest::Cardinality { precision, .. } => self.cardinality(column, *precision),
        }
    }

    /// Matched documents with their values, checking the deadline as it
    /// goes.
    fn for_each_doc<'c, F>(&self, column: Option<&'c Column>, mut f: F) -> Result<()>
    where
        F: FnMut(Option<&'c [ColumnValue]>),
    {
        for (i, doc_id) in self.matched.iter().enumerate() {
            if i % CHECK_INTERVAL == 0 {
                self.deadline.check()?;
            }
            f(column
                .and_then(|c| c.get(*doc_id))
                .filter(|values| !values.is_empty()));
        }
        Ok(())
    }

    fn terms(
        &self,
        field_type: FieldType,
        column: Option<&Column>,
        size: usize,
        min_count: u64,
    ) -> Result<FacetResult> {
        let mut counts: BTreeMap<&ColumnValue, u64> = BTreeMap::new();
        let mut missing = 0u64;
        self.for_each_doc(column, |values| match values {
            Some(values) => {
                for value in distinct(values) {
                    *counts.entry(value).or_insert(0) += 1;
                }
            }
            None => missing += 1,
        })?;

        let mut buckets: Vec<(&ColumnValue, u64)> = counts
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .collect();
        buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let other_count = buckets.iter().skip(size).map(|(_, count)| count).sum();
        buckets.truncate(size);

        Ok(FacetResult::Terms {
            buckets: buckets
                .into_iter()
                .map(|(value, count)| FacetBucket::keyed(value.render(field_type), count))
                .collect(),
            other_count,
            missing,
        })
    }

    fn range(&self, column: Option<&Column>, ranges: &[RangeSpec]) -> Result<FacetResult> {
        for spec in ranges {
            if let (Some(from), Some(to)) = (spec.from, spec.to) {
                if from > to {
                    return Err(QuarryError::invalid_argument(format!(
                        "range bucket '{}' has from > to",
                        spec.key()
                    )));
                }
            }
        }

        let mut counts = vec![0u64; ranges.len()];
        let last = ranges.len().saturating_sub(1);
        self.for_each_doc(column, |values| {
            let Some(values) = values else { return };
            for (i, spec) in ranges.iter().enumerate() {
                if numbers(values).any(|v| spec.contains(v, i == last)) {
                    counts[i] += 1;
                }
            }
        })?;

        Ok(FacetResult::Range {
            buckets: ranges
                .iter()
                .zip(counts)
                .map(|(spec, count)| FacetBucket {
                    key: spec.key(),
                    count,
                    from: spec.from,
                    to: spec.to,
                })
                .collect(),
        })
    }

    fn histogram(&self, column: Option<&Column>, interval: f64) -> Result<FacetResult> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(QuarryError::invalid_argument(format!(
                "histogram interval must be positive, got {interval}"
            )));
        }

        let mut docs: Vec<&[ColumnValue]> = Vec::new();
        self.for_each_doc(column, |values| docs.extend(values))?;
        let Some(min) = docs
            .iter()
            .flat_map(|values| numbers(values))
            .min_by(f64::total_cmp)
        else {
            return Ok(FacetResult::Histogram { buckets: Vec::new() });
        };

        let slot = |v: f64| ((v - min) / interval).floor() as usize;
        let max_slot = docs
            .iter()
            .flat_map(|values| numbers(values))
            .map(slot)
            .max()
            .unwrap_or(0);
        if max_slot >= self.max_buckets {
            return Err(QuarryError::resource_exhausted(format!(
                "histogram would produce {} buckets, limit is {}",
                max_slot.saturating_add(1),
                self.max_buckets
            )));
        }

        let mut counts = vec![0u64; max_slot + 1];
        for values in docs {
            let mut slots: Vec<usize> = numbers(values).map(slot).collect();
            slots.sort_unstable();
            slots.dedup();
            for s in slots {
                counts[s] += 1;
            }
        }

        Ok(FacetResult::Histogram {
            buckets: counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| {
                    let lower = min + i as f64 * interval;
                    FacetBucket {
                        key: format_number(lower),
                        count,
                        from: Some(lower),
                        to: Some(lower + interval),
                    }
                })
                .collect(),
        })
    }

    fn date_histogram(
        &self,
        column: Option<&Column>,
        interval: CalendarInterval,
    ) -> Result<FacetResult> {
        let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
        self.for_each_doc(column, |values| {
            let Some(values) = values else { return };
            let mut starts: Vec<i64> = numbers(values)
                .filter_map(|ms| DateTime::from_timestamp_millis(ms as i64))
                .map(|t| interval.floor(t).timestamp_millis())
                .collect();
            starts.sort_unstable();
            starts.dedup();
            for start in starts {
                *counts.entry(start).or_insert(0) += 1;
            }
        })?;

        let (Some((&first, _)), Some((&last, _))) =
            (counts.first_key_value(), counts.last_key_value())
        else {
            return Ok(FacetResult::DateHistogram { buckets: Vec::new() });
        };

        let overflow = || QuarryError::invalid_argument("date histogram bucket out of range");
        let mut buckets = Vec::new();
        let mut current = DateTime::from_timestamp_millis(first).ok_or_else(overflow)?;
        loop {
            if buckets.len() >= self.max_buckets {
                return Err(QuarryError::resource_exhausted(format!(
                    "date histogram exceeds the limit of {} buckets",
                    self.max_buckets
                )));
            }
            let start = current.timestamp_millis();
            let next = interval.next(current).ok_or_else(overflow)?;
            buckets.push(FacetBucket {
                key: current.to_rfc3339(),
                count: counts.get(&start).copied().unwrap_or(0),
                from: Some(start as f64),
                to: Some(next.timestamp_millis() as f64),
            });
            if start >= last {
                break;
            }
            current = next;
        }

        Ok(FacetResult::DateHistogram { buckets })
    }

    fn stats(&self, column: Option<&Column>) -> Result<FacetResult> {
        let Some(column) = column else {
            return Ok(FacetResult::Stats(FieldStats::default()));
        };

        if self.matched.len() == self.total_docs {
            let count = column.value_count();
            let sum = column.sum();
            return Ok(FacetResult::Stats(FieldStats {
                count,
                min: column.min().and_then(ColumnValue::as_f64),
                max: column.max().and_then(ColumnValue::as_f64),
                sum,
                avg: (count > 0).then(|| sum / count as f64),
            }));
        }

        let mut stats = FieldStats::default();
        self.for_each_doc(Some(column), |values| {
            for v in values.into_iter().flat_map(numbers) {
                stats.count += 1;
                stats.sum += v;
                stats.min = Some(stats.min.map_or(v, |m| m.min(v)));
                stats.max = Some(stats.max.map_or(v, |m| m.max(v)));
            }
        })?;
        stats.avg = (stats.count > 0).then(|| stats.sum / stats.count as f64);
        Ok(FacetResult::Stats(stats))
    }

    fn cardinality(&self, column: Option<&Column>, precision: u8) -> Result<FacetResult> {
        let mut sketch = HyperLogLog::new(precision)?;
        let mut exact: Option<AHashSet<&ColumnValue>> = Some(AHashSet::new());

        self.for_each_doc(column, |values| {
            let Some(values) = values else { return };
            for value in values {
                let overflowed = match exact.as_mut() {
                    Some(set) => {
                        set.insert(value);
                        set.len() > EXACT_CARDINALITY_THRESHOLD
                    }
                    None => {
                        sketch.insert(value);
                        false
                    }
                };
                if overflowed {
                    for v in exact.take().into_iter().flatten() {
                        sketch.insert(v);
                    }
                }
            }
        })?;

        Ok(match exact {
            Some(set) => FacetResult::Cardinality {
                value: set.len() as u64,
                exact: true,
            },
            None => FacetResult::Cardinality {
                value: sketch.estimate(),
                exact: false,
            },
        })
    }
}

fn require_numeric(field: &str, field_type: FieldType) -> Result<()> {
    if field_type.is_numeric() {
        Ok(())
    } else {
        Err(QuarryError::field_type_mismatch(
            field,
            FieldType::Number.name(),
            field_type.name(),
        ))
    }
}

fn numbers(values: &[ColumnValue]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(ColumnValue::as_f64)
}

fn distinct(values: &[ColumnValue]) -> Vec<&ColumnValue> {
    let mut distinct: Vec<&ColumnValue> = values.iter().collect();
    distinct.sort();
    distinct.dedup();
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(field_type: FieldType, values: &[(DocId, Vec<ColumnValue>)]) -> Column {
        let mut column = Column::new(field_type);
        for (doc, v) in values {
            column.insert(*doc, v.clone());
        }
        column
    }

    fn text(s: &str) -> ColumnValue {
        ColumnValue::Text(s.to_string())
    }

    fn prices() -> Column {
        column(
            FieldType::Number,
            &[
                (1, vec![ColumnValue::number(5.0)]),
                (2, vec![ColumnValue::number(10.0)]),
                (3, vec![ColumnValue::number(55.0)]),
                (4, vec![ColumnValue::number(100.0)]),
                (5, vec![ColumnValue::number(150.0)]),
            ],
        )
    }

    #[test]
    fn test_terms_counts_and_missing() {
        let brands = column(
            FieldType::Keyword,
            &[
                (1, vec![text("acme")]),
                (2, vec![text("zenith")]),
                (3, vec![text("acme")]),
                (4, vec![text("bolt")]),
            ],
        );
        let deadline = Deadline::none();
        let matched = [1, 2, 3, 4, 5];
        let aggregator = FacetAggregator::new(&matched, 5, 100, &deadline);
        let request = FacetRequest::Terms {
            field: "brand".into(),
            size: 2,
            min_count: 1,
        };

        let result = aggregator
            .aggregate(&request, FieldType::Keyword, Some(&brands))
            .unwrap();
        let FacetResult::Terms {
            buckets,
            other_count,
            missing,
        } = &result
        else {
            panic!("expected terms, got {result:?}");
        };
        let keys: Vec<(&str, u64)> = buckets.iter().map(|b| (b.key.as_str(), b.count)).collect();
        // Ties break by key.
        assert_eq!(keys, vec![("acme", 2), ("bolt", 1)]);
        assert_eq!(*other_count, 1);
        assert_eq!(*missing, 1);

        let counted: u64 = buckets.iter().map(|b| b.count).sum::<u64>() + other_count;
        assert_eq!(counted + missing, matched.len() as u64);
    }

    #[test]
    fn test_range_last_bucket_closed() {
        let deadline = Deadline::none();
        let matched = [1, 2, 3, 4, 5];
        let aggregator = FacetAggregator::new(&matched, 5, 100, &deadline);
        let request = FacetRequest::Range {
            field: "price".into(),
            ranges: vec![
                RangeSpec::new(None, Some(25.0)),
                RangeSpec::new(Some(25.0), Some(100.0)),
                RangeSpec::new(Some(100.0), Some(150.0)),
            ],
        };
        let result = aggregator
            .aggregate(&request, FieldType::Number, Some(&prices()))
            .unwrap();
        assert_eq!(result.count("*_25"), Some(2));
        assert_eq!(result.count("25_100"), Some(1));
        assert_eq!(result.count("100_150"), Some(2));
    }

    #[test]
    fn test_histogram_fills_empty_buckets() {
        let deadline = Deadline::none();
        let matched = [1, 3, 5];
        let aggregator = FacetAggregator::new(&matched, 5, 100, &deadline);
        let request = FacetRequest::Histogram {
            field: "price".into(),
            interval: 50.0,
        };
        let result = aggregator
            .aggregate(&request, FieldType::Number, Some(&prices()))
            .unwrap();
        let buckets: Vec<(&str, u64)> = result
            .buckets()
            .iter()
            .map(|b| (b.key.as_str(), b.count))
            .collect();
        assert_eq!(buckets, vec![("5", 1), ("55", 1), ("105", 1)]);

        let tight = FacetAggregator::new(&matched, 5, 2, &deadline);
        let err = tight
            .aggregate(&request, FieldType::Number, Some(&prices()))
            .unwrap_err();
        assert!(matches!(err, QuarryError::ResourceExhausted(_)));
    }

    #[test]
    fn test_date_histogram_by_month() {
        let ms = |s: &str| {
            ColumnValue::number(
                DateTime::parse_from_rfc3339(s).unwrap().timestamp_millis() as f64,
            )
        };
        let dates = column(
            FieldType::Date,
            &[
                (1, vec![ms("2024-01-15T10:00:00Z")]),
                (2, vec![ms("2024-01-31T23:59:59Z")]),
                (3, vec![ms("2024-03-01T00:00:00Z")]),
            ],
        );
        let deadline = Deadline::none();
        let matched = [1, 2, 3];
        let aggregator = FacetAggregator::new(&matched, 3, 100, &deadline);
        let request = FacetRequest::DateHistogram {
            field: "released".into(),
            interval: CalendarInterval::Month,
        };
        let result = aggregator
            .aggregate(&request, FieldType::Date, Some(&dates))
            .unwrap();
        let buckets: Vec<(&str, u64)> = result
            .buckets()
            .iter()
            .map(|b| (b.key.as_str(), b.count))
            .collect();
        assert_eq!(
            buckets,
            vec![
                ("2024-01-01T00:00:00+00:00", 2),
                ("2024-02-01T00:00:00+00:00", 0),
                ("2024-03-01T00:00:00+00:00", 1),
            ]
        );

        let err = aggregator
            .aggregate(&request, FieldType::Number, Some(&dates))
            .unwrap_err();
        assert!(matches!(err, QuarryError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn test_stats_fast_path_matches_scan() {
        let deadline = Deadline::none();
        let all = [1, 2, 3, 4, 5];
        let request = FacetRequest::Stats {
            field: "price".into(),
        };
        let fast = FacetAggregator::new(&all, 5, 100, &deadline)
            .aggregate(&request, FieldType::Number, Some(&prices()))
            .unwrap();
        // Same documents, but not flagged as the whole index.
        let scanned = FacetAggregator::new(&all, 6, 100, &deadline)
            .aggregate(&request, FieldType::Number, Some(&prices()))
            .unwrap();
        assert_eq!(fast, scanned);
        assert_eq!(
            fast,
            FacetResult::Stats(FieldStats {
                count: 5,
                min: Some(5.0),
                max: Some(150.0),
                sum: 320.0,
                avg: Some(64.0),
            })
        );

        let err = FacetAggregator::new(&all, 5, 100, &deadline)
            .aggregate(&request, FieldType::Keyword, None)
            .unwrap_err();
        assert!(matches!(err, QuarryError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn test_cardinality_switches_to_sketch() {
        let n = 5000u64;
        let values: Vec<(DocId, Vec<ColumnValue>)> = (0..n)
            .map(|i| (i, vec![ColumnValue::number((i % 4000) as f64)]))
            .collect();
        let ids = column(FieldType::Number, &values);
        let matched: Vec<DocId> = (0..n).collect();
        let deadline = Deadline::none();
        let aggregator = FacetAggregator::new(&matched, n as usize, 100, &deadline);

        let result = aggregator
            .aggregate(
                &FacetRequest::Cardinality {
                    field: "id".into(),
                    precision: 14,
                },
                FieldType::Number,
                Some(&ids),
            )
            .unwrap();
        let FacetResult::Cardinality { value, exact } = result else {
            panic!("expected cardinality");
        };
        assert!(!exact);
        assert!((value as f64 - 4000.0).abs() < 4000.0 * 0.05, "estimate {value}");

        let small = FacetAggregator::new(&matched[..10], n as usize, 100, &deadline)
            .aggregate(
                &FacetRequest::Cardinality {
                    field: "id".into(),
                    precision: 14,
                },
                FieldType::Number,
                Some(&ids),
            )
            .unwrap();
        assert_eq!(
            small,
            FacetResult::Cardinality {
                value: 10,
                exact: true
            }
        );
    }

    #[test]
    fn test_spec_from_json() {
        let spec = FacetSpec::from_json_str(
            r#"{"brands": {"type": "terms", "field": "brand"},
                "bands": {"type": "range", "field": "price", "ranges": [{"to": 25}, {"from": 25}]}}"#,
        )
        .unwrap();
        assert_eq!(spec.len(), 2);
        let (name, request) = spec.iter().next().unwrap();
        assert_eq!(name, "bands");
        assert_eq!(request.field(), "price");
        assert_eq!(
            spec.iter().nth(1).unwrap().1,
            &FacetRequest::Terms {
                field: "brand".into(),
                size: 10,
                min_count: 1
            }
        );
    }
}
