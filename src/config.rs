//! Engine and index configuration.
//!
//! Both structs load from JSON; every field has a documented default so a
//! partial document such as `{"max_indexes": 16}` is valid.
//!
//! # Examples
//!
//! ```
//! use quarry::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{"default_limit": 25}"#).unwrap();
//! assert_eq!(config.default_limit, 25);
//! assert_eq!(config.max_indexes, 1024);
//! assert_eq!(config.limits.max_expansions, 1024);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzerConfig;
use crate::error::{QuarryError, Result};
use crate::schema::FieldEntry;
use crate::search::scoring::ScoringConfig;

/// Resource limits applied to every index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Live documents per index.
    pub max_documents_per_index: usize,

    /// Bytes per Text or Keyword value.
    pub max_field_length: usize,

    /// Dictionary terms a single fuzzy, prefix, wildcard or range clause
    /// may expand to.
    pub max_expansions: usize,

    /// Buckets a single histogram facet may produce.
    pub max_facet_buckets: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_documents_per_index: 10_000_000,
            max_field_length: 1024 * 1024,
            max_expansions: 1024,
            max_facet_buckets: 10_000,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_indexes: usize,

    /// Analyzer for Text fields of indexes that do not name one.
    pub default_analyzer: String,

    pub limits: Limits,

    /// Result page size when a query does not give `LIMIT`.
    pub default_limit: usize,

    /// Time budget for queries that do not carry their own.
    pub default_timeout_ms: Option<u64>,

    pub suggest_cache_ttl_ms: u64,

    /// Entries per index suggestion cache; 0 disables caching.
    pub suggest_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_indexes: 1024,
            default_analyzer: "standard".to_string(),
            limits: Limits::default(),
            default_limit: 10,
            default_timeout_ms: None,
            suggest_cache_ttl_ms: 60_000,
            suggest_cache_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_indexes == 0 {
            return Err(QuarryError::invalid_argument("max_indexes must be at least 1"));
        }
        if self.default_limit == 0 {
            return Err(QuarryError::invalid_argument("default_limit must be at least 1"));
        }
        if self.limits.max_expansions == 0 || self.limits.max_facet_buckets == 0 {
            return Err(QuarryError::invalid_argument(
                "max_expansions and max_facet_buckets must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    pub fn suggest_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.suggest_cache_ttl_ms)
    }
}

/// Per-index configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub fields: Vec<FieldEntry>,

    /// Analyzer for Text fields without their own; the engine default when
    /// absent.
    pub default_analyzer: Option<String>,

    /// Custom analyzers, usable by name alongside the presets.
    pub analyzers: BTreeMap<String, AnalyzerConfig>,

    /// Fields searched by bare query terms. Empty means every indexed Text
    /// field.
    pub default_fields: Vec<String>,

    /// Fields that get a value column for faceting even when their type
    /// would not.
    pub facet_fields: Vec<String>,

    pub scoring: ScoringConfig,

    /// Whether undeclared document fields are added to the schema with an
    /// inferred type.
    pub dynamic: bool,

    /// Overrides the engine's `max_documents_per_index`.
    pub max_documents: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            fields: Vec::new(),
            default_analyzer: None,
            analyzers: BTreeMap::new(),
            default_fields: Vec::new(),
            facet_fields: Vec::new(),
            scoring: ScoringConfig::default(),
            dynamic: true,
            max_documents: None,
        }
    }
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_field(mut self, field: FieldEntry) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields<I: IntoIterator<Item = FieldEntry>>(mut self, fields: I) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_default_analyzer<S: Into<String>>(mut self, analyzer: S) -> Self {
        self.default_analyzer = Some(analyzer.into());
        self
    }

    pub fn with_analyzer<S: Into<String>>(mut self, name: S, config: AnalyzerConfig) -> Self {
        self.analyzers.insert(name.into(), config);
        self
    }

    pub fn with_default_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_facet_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facet_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = Some(max_documents);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.limits.max_field_length, 1024 * 1024);
        assert_eq!(config.suggest_cache_ttl(), Duration::from_secs(60));
        assert!(config.default_timeout().is_none());
    }

    #[test]
    fn test_engine_config_validation() {
        assert!(EngineConfig::from_json_str(r#"{"max_indexes": 0}"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{"default_limit": 0}"#).is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_index_config_from_json() {
        let config = IndexConfig::from_json_str(
            r#"{
                "fields": [
                    {"name": "title", "type": "text", "analyzer": "english"},
                    {"name": "price", "type": "number"}
                ],
                "facet_fields": ["brand"],
                "scoring": {"type": "tf_idf", "sublinear_tf": true, "smooth_idf": true},
                "dynamic": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[1].field_type, FieldType::Number);
        assert!(!config.dynamic);
        assert_eq!(config.facet_fields, vec!["brand"]);
        assert!(matches!(config.scoring, ScoringConfig::TfIdf { sublinear_tf: true, .. }));
    }
}
