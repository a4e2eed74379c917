//! Per-field value columns.
//!
//! A column maps each document to its scalar values and keeps a sorted
//! value-to-documents map beside it. Columns back range queries on scalar
//! fields, field sorts and facet aggregation, and carry running statistics
//! for the numeric facet fast path.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::ops::Bound;

use ahash::AHashMap;
use chrono::DateTime;

use crate::document::FieldValue;
use crate::index::posting::DocId;
use crate::schema::FieldType;

/// A scalar value as held in a column. Dates are epoch milliseconds.
#[derive(Debug, Clone)]
pub enum ColumnValue {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl ColumnValue {
    pub fn number(n: f64) -> Self {
        // -0.0 and 0.0 must share a key.
        ColumnValue::Number(if n == 0.0 { 0.0 } else { n })
    }

    /// Column representation of a field value; GeoPoints and binaries have
    /// none.
    pub fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Number(n) => Some(Self::number(*n)),
            FieldValue::Date(d) => Some(Self::number(d.timestamp_millis() as f64)),
            FieldValue::Boolean(b) => Some(ColumnValue::Boolean(*b)),
            FieldValue::Text(s) | FieldValue::Keyword(s) => Some(ColumnValue::Text(s.clone())),
            FieldValue::Binary(_) | FieldValue::GeoPoint { .. } | FieldValue::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render the value for bucket keys, given the column's field type.
    pub fn render(&self, field_type: FieldType) -> String {
        match self {
            ColumnValue::Number(n) if field_type == FieldType::Date => {
                DateTime::from_timestamp_millis(*n as i64)
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| format_number(*n))
            }
            ColumnValue::Number(n) => format_number(*n),
            ColumnValue::Boolean(b) => b.to_string(),
            ColumnValue::Text(s) => s.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ColumnValue::Number(_) => 0,
            ColumnValue::Boolean(_) => 1,
            ColumnValue::Text(_) => 2,
        }
    }
}

impl Ord for ColumnValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ColumnValue::Number(a), ColumnValue::Number(b)) => a.total_cmp(b),
            (ColumnValue::Boolean(a), ColumnValue::Boolean(b)) => a.cmp(b),
            (ColumnValue::Text(a), ColumnValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for ColumnValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ColumnValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ColumnValue {}

impl Hash for ColumnValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            ColumnValue::Number(n) => n.to_bits().hash(state),
            ColumnValue::Boolean(b) => b.hash(state),
            ColumnValue::Text(s) => s.hash(state),
        }
    }
}

/// Format a number without a trailing `.0` when it is integral.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Whether `(lower, upper)` describes a non-empty range that
/// `BTreeMap::range` accepts.
pub fn is_valid_range<T: Ord>(lower: &Bound<T>, upper: &Bound<T>) -> bool {
    match (lower, upper) {
        (Bound::Included(l), Bound::Included(u)) => l <= u,
        (Bound::Included(l), Bound::Excluded(u))
        | (Bound::Excluded(l), Bound::Included(u))
        | (Bound::Excluded(l), Bound::Excluded(u)) => l < u,
        _ => true,
    }
}

/// Values of one field.
#[derive(Debug, Clone)]
pub struct Column {
    field_type: FieldType,
    values: AHashMap<DocId, Vec<ColumnValue>>,
    sorted: BTreeMap<ColumnValue, BTreeSet<DocId>>,
    sum: f64,
    value_count: u64,
}

impl Column {
    pub fn new(field_type: FieldType) -> Self {
        Column {
            field_type,
            values: AHashMap::new(),
            sorted: BTreeMap::new(),
            sum: 0.0,
            value_count: 0,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn insert(&mut self, doc_id: DocId, values: Vec<ColumnValue>) {
        if values.is_empty() {
            return;
        }
        self.remove(doc_id);
        for value in &values {
            if let Some(n) = value.as_f64() {
                self.sum += n;
            }
            self.value_count += 1;
            self.sorted.entry(value.clone()).or_default().insert(doc_id);
        }
        self.values.insert(doc_id, values);
    }

    pub fn remove(&mut self, doc_id: DocId) -> bool {
        let Some(values) = self.values.remove(&doc_id) else {
            return false;
        };
        for value in values {
            if let Some(n) = value.as_f64() {
                self.sum -= n;
            }
            self.value_count -= 1;
            if let Some(docs) = self.sorted.get_mut(&value) {
                docs.remove(&doc_id);
                if docs.is_empty() {
                    self.sorted.remove(&value);
                }
            }
        }
        true
    }

    pub fn get(&self, doc_id: DocId) -> Option<&[ColumnValue]> {
        self.values.get(&doc_id).map(Vec::as_slice)
    }

    /// Documents with at least one value inside the bounds, ascending.
    pub fn range(&self, lower: Bound<ColumnValue>, upper: Bound<ColumnValue>) -> BTreeSet<DocId> {
        if !is_valid_range(&lower, &upper) {
            return BTreeSet::new();
        }
        self.sorted
            .range((lower, upper))
            .flat_map(|(_, docs)| docs.iter().copied())
            .collect()
    }

    pub fn min(&self) -> Option<&ColumnValue> {
        self.sorted.keys().next()
    }

    pub fn max(&self) -> Option<&ColumnValue> {
        self.sorted.keys().next_back()
    }

    /// Sum of all numeric values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn value_count(&self) -> u64 {
        self.value_count
    }

    pub fn doc_count(&self) -> usize {
        self.values.len()
    }

    pub fn distinct_count(&self) -> usize {
        self.sorted.len()
    }
}

/// All columns of an index, keyed by field name (GeoPoint axes as
/// `<name>.lat` / `<name>.lon`).
#[derive(Debug, Clone, Default)]
pub struct FieldColumns {
    columns: BTreeMap<String, Column>,
}

impl FieldColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        doc_id: DocId,
        field: &str,
        field_type: FieldType,
        values: Vec<ColumnValue>,
    ) {
        self.columns
            .entry(field.to_string())
            .or_insert_with(|| Column::new(field_type))
            .insert(doc_id, values);
    }

    pub fn remove(&mut self, doc_id: DocId) {
        for column in self.columns.values_mut() {
            column.remove(doc_id);
        }
        self.columns.retain(|_, column| column.doc_count() > 0);
    }

    pub fn get(&self, field: &str) -> Option<&Column> {
        self.columns.get(field)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_column() -> Column {
        let mut column = Column::new(FieldType::Number);
        for (doc, price) in [(1, 5.0), (2, 10.0), (3, 55.0), (4, 100.0), (5, 150.0)] {
            column.insert(doc, vec![ColumnValue::number(price)]);
        }
        column
    }

    #[test]
    fn test_range_bounds() {
        let column = price_column();
        let inclusive = column.range(
            Bound::Included(ColumnValue::number(10.0)),
            Bound::Included(ColumnValue::number(100.0)),
        );
        assert_eq!(inclusive.into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);

        let exclusive = column.range(
            Bound::Excluded(ColumnValue::number(10.0)),
            Bound::Excluded(ColumnValue::number(100.0)),
        );
        assert_eq!(exclusive.into_iter().collect::<Vec<_>>(), vec![3]);

        let open = column.range(Bound::Unbounded, Bound::Excluded(ColumnValue::number(10.0)));
        assert_eq!(open.into_iter().collect::<Vec<_>>(), vec![1]);

        let inverted = column.range(
            Bound::Included(ColumnValue::number(100.0)),
            Bound::Included(ColumnValue::number(10.0)),
        );
        assert!(inverted.is_empty());
        let empty = column.range(
            Bound::Excluded(ColumnValue::number(10.0)),
            Bound::Excluded(ColumnValue::number(10.0)),
        );
        assert!(empty.is_empty());
    }

    #[test]
    fn test_running_stats() {
        let mut column = price_column();
        assert_eq!(column.sum(), 320.0);
        assert_eq!(column.value_count(), 5);
        assert!(column.remove(5));
        assert!(!column.remove(5));
        assert_eq!(column.sum(), 170.0);
        assert_eq!(column.max(), Some(&ColumnValue::number(100.0)));
        assert_eq!(column.min(), Some(&ColumnValue::number(5.0)));
    }

    #[test]
    fn test_render() {
        assert_eq!(ColumnValue::number(25.0).render(FieldType::Number), "25");
        assert_eq!(ColumnValue::number(2.5).render(FieldType::Number), "2.5");
        assert_eq!(
            ColumnValue::number(0.0).render(FieldType::Date),
            "1970-01-01T00:00:00+00:00"
        );
        assert_eq!(ColumnValue::number(-0.0), ColumnValue::number(0.0));
    }
}
