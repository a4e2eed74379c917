//! Counters for indexing and query activity.
//!
//! Each index keeps its own [`Metrics`]; the engine keeps one more that
//! every index also records into. Nothing here exports the numbers; a
//! caller reads a [`MetricsSnapshot`] and ships it wherever it likes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct Metrics {
    documents_indexed: AtomicU64,
    documents_deleted: AtomicU64,
    queries_executed: AtomicU64,
    query_errors: AtomicU64,
    total_query_micros: AtomicU64,
    max_query_micros: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_indexed(&self, count: u64) {
        self.documents_indexed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_deleted(&self, count: u64) {
        self.documents_deleted.fetch_add(count, Ordering::Relaxed);
    }

    /// Record one query and its latency. Failed queries count toward both
    /// `queries_executed` and `query_errors`.
    pub fn record_query(&self, latency: Duration, succeeded: bool) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.query_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.total_query_micros.fetch_add(micros, Ordering::Relaxed);
        self.max_query_micros.fetch_max(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let queries_executed = self.queries_executed.load(Ordering::Relaxed);
        let total_query_micros = self.total_query_micros.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            queries_executed,
            query_errors: self.query_errors.load(Ordering::Relaxed),
            total_query_micros,
            max_query_micros: self.max_query_micros.load(Ordering::Relaxed),
            avg_query_micros: if queries_executed == 0 {
                0.0
            } else {
                total_query_micros as f64 / queries_executed as f64
            },
        }
    }
}

/// Point-in-time copy of a [`Metrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub documents_indexed: u64,
    pub documents_deleted: u64,
    pub queries_executed: u64,
    pub query_errors: u64,
    pub total_query_micros: u64,
    pub max_query_micros: u64,
    pub avg_query_micros: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_snapshot() {
        let metrics = Metrics::new();
        metrics.record_indexed(3);
        metrics.record_deleted(1);
        metrics.record_query(Duration::from_micros(100), true);
        metrics.record_query(Duration::from_micros(300), false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_indexed, 3);
        assert_eq!(snapshot.documents_deleted, 1);
        assert_eq!(snapshot.queries_executed, 2);
        assert_eq!(snapshot.query_errors, 1);
        assert_eq!(snapshot.total_query_micros, 400);
        assert_eq!(snapshot.max_query_micros, 300);
        assert_eq!(snapshot.avg_query_micros, 200.0);
    }
}
