//! Relevance scoring.
//!
//! A [`Scorer`] is built per query term from the term's collection
//! statistics and then scores each matching document from its term
//! frequency and field length.

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};

fn default_k1() -> f32 {
    1.2
}

fn default_b() -> f32 {
    0.75
}

fn default_true() -> bool {
    true
}

/// Scoring function of an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringConfig {
    /// Okapi BM25.
    Bm25 {
        /// Term frequency saturation.
        #[serde(default = "default_k1")]
        k1: f32,
        /// Length normalization, 0 (none) to 1 (full).
        #[serde(default = "default_b")]
        b: f32,
    },
    /// Classic TF-IDF.
    TfIdf {
        /// Use `1 + ln(tf)` instead of the raw term frequency.
        #[serde(default = "default_true")]
        sublinear_tf: bool,
        /// Use `ln((1 + N) / (1 + df)) + 1` instead of `ln(N / df) + 1`.
        #[serde(default = "default_true")]
        smooth_idf: bool,
    },
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig::Bm25 {
            k1: default_k1(),
            b: default_b(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if let ScoringConfig::Bm25 { k1, b } = self {
            if !k1.is_finite() || *k1 < 0.0 {
                return Err(QuarryError::invalid_argument(format!(
                    "BM25 k1 must be >= 0, got {k1}"
                )));
            }
            if !(0.0..=1.0).contains(b) {
                return Err(QuarryError::invalid_argument(format!(
                    "BM25 b must be in [0, 1], got {b}"
                )));
            }
        }
        Ok(())
    }

    /// Build the scorer for one term.
    pub fn scorer(&self, stats: TermStatistics) -> Box<dyn Scorer> {
        match *self {
            ScoringConfig::Bm25 { k1, b } => Box::new(Bm25Scorer::new(stats, k1, b)),
            ScoringConfig::TfIdf {
                sublinear_tf,
                smooth_idf,
            } => Box::new(TfIdfScorer::new(stats, sublinear_tf, smooth_idf)),
        }
    }
}

/// Collection statistics of a term in one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStatistics {
    /// Documents containing the term.
    pub doc_freq: u64,
    /// Live documents in the index.
    pub total_docs: u64,
    /// Mean token count of the field over documents that have it.
    pub avg_field_length: f32,
}

/// Scores documents for a single term.
pub trait Scorer: Send + Sync {
    /// Score a document given its frequency of the term and the token count
    /// of the field.
    fn score(&self, term_freq: f32, field_length: f32) -> f32;

    fn idf(&self) -> f32;

    fn name(&self) -> &'static str;
}

/// Okapi BM25.
#[derive(Debug, Clone)]
pub struct Bm25Scorer {
    stats: TermStatistics,
    k1: f32,
    b: f32,
    idf: f32,
}

impl Bm25Scorer {
    pub fn new(stats: TermStatistics, k1: f32, b: f32) -> Self {
        let n = stats.total_docs as f64;
        let df = stats.doc_freq as f64;
        let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln() as f32;
        Bm25Scorer { stats, k1, b, idf }
    }
}

impl Scorer for Bm25Scorer {
    fn score(&self, term_freq: f32, field_length: f32) -> f32 {
        if term_freq <= 0.0 {
            return 0.0;
        }
        let avg = self.stats.avg_field_length;
        let norm = if avg > 0.0 {
            1.0 - self.b + self.b * (field_length / avg)
        } else {
            1.0
        };
        // TF = (tf * (k1 + 1)) / (tf + k1 * norm)
        self.idf * (term_freq * (self.k1 + 1.0)) / (term_freq + self.k1 * norm)
    }

    fn idf(&self) -> f32 {
        self.idf
    }

    fn name(&self) -> &'static str {
        "bm25"
    }
}

/// TF-IDF with optional sublinear tf and smoothed idf.
#[derive(Debug, Clone)]
pub struct TfIdfScorer {
    sublinear_tf: bool,
    idf: f32,
}

impl TfIdfScorer {
    pub fn new(stats: TermStatistics, sublinear_tf: bool, smooth_idf: bool) -> Self {
        let n = stats.total_docs as f64;
        let df = stats.doc_freq as f64;
        let idf = if smooth_idf {
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        } else if df > 0.0 {
            (n / df).ln() + 1.0
        } else {
            0.0
        };
        TfIdfScorer {
            sublinear_tf,
            idf: idf as f32,
        }
    }
}

impl Scorer for TfIdfScorer {
    fn score(&self, term_freq: f32, _field_length: f32) -> f32 {
        if term_freq <= 0.0 {
            return 0.0;
        }
        // Phrase frequencies below 1 stay linear so the score stays positive.
        let tf = if self.sublinear_tf && term_freq >= 1.0 {
            1.0 + term_freq.ln()
        } else {
            term_freq
        };
        tf * self.idf
    }

    fn idf(&self) -> f32 {
        self.idf
    }

    fn name(&self) -> &'static str {
        "tf_idf"
    }
}
