//! The engine: a registry of named indexes.
//!
//! # Examples
//!
//! ```
//! use quarry::config::{EngineConfig, IndexConfig};
//! use quarry::document::Document;
//! use quarry::engine::Engine;
//! use quarry::schema::FieldEntry;
//! use quarry::search::SearchOptions;
//!
//! let engine = Engine::new(EngineConfig::default());
//! engine
//!     .create_index("products", IndexConfig::new().with_field(FieldEntry::text("title")))
//!     .unwrap();
//!
//! let doc = Document::builder()
//!     .id("1")
//!     .text("title", "Wireless Bluetooth Headphones")
//!     .build()
//!     .unwrap();
//! engine.add("products", doc).unwrap();
//!
//! let results = engine
//!     .search_str("products", "title:wireless", &SearchOptions::new())
//!     .unwrap();
//! assert_eq!(results.ids(), vec!["1"]);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{EngineConfig, IndexConfig};
use crate::document::Document;
use crate::error::{QuarryError, Result};
use crate::highlight::{HighlightConfig, HighlightFragment};
use crate::index::Index;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::query::Query;
use crate::search::options::{SearchOptions, SearchResults};
use crate::spelling::{DidYouMeanConfig, SuggestConfig, Suggestion};
use crate::util::clock::{Clock, SystemClock};

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    indexes: RwLock<BTreeMap<String, Arc<Index>>>,
    metrics: Arc<Metrics>,
    clock: Arc<dyn Clock>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// An engine whose suggestion caches expire by `clock`.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Engine {
            config,
            indexes: RwLock::new(BTreeMap::new()),
            metrics: Arc::new(Metrics::new()),
            clock,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Search options carrying the engine's default page size.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::new().with_limit(self.config.default_limit)
    }

    pub fn create_index<S: Into<String>>(&self, name: S, config: IndexConfig) -> Result<Arc<Index>> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(QuarryError::invalid_argument(format!(
                "invalid index name '{name}'"
            )));
        }

        let mut indexes = self.indexes.write();
        if indexes.contains_key(&name) {
            return Err(QuarryError::index_already_exists(name));
        }
        if indexes.len() >= self.config.max_indexes {
            return Err(QuarryError::resource_exhausted(format!(
                "the engine is limited to {} indexes",
                self.config.max_indexes
            )));
        }

        let index = Arc::new(Index::with_engine_config(
            name.clone(),
            config,
            &self.config,
            self.clock.clone(),
            Some(self.metrics.clone()),
        )?);
        indexes.insert(name, index.clone());
        Ok(index)
    }

    /// Remove an index. Searches already holding it finish normally.
    pub fn drop_index(&self, name: &str) -> Result<()> {
        match self.indexes.write().remove(name) {
            Some(_) => {
                log::info!("dropped index '{name}'");
                Ok(())
            }
            None => Err(QuarryError::index_not_found(name)),
        }
    }

    pub fn index(&self, name: &str) -> Result<Arc<Index>> {
        self.indexes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| QuarryError::index_not_found(name))
    }

    pub fn list_indexes(&self) -> Vec<String> {
        self.indexes.read().keys().cloned().collect()
    }

    /// Counters summed over every index, including dropped ones.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn add(&self, index: &str, document: Document) -> Result<()> {
        self.index(index)?.add(document)
    }

    pub fn add_bulk(&self, index: &str, documents: Vec<Document>) -> Result<usize> {
        self.index(index)?.add_bulk(documents)
    }

    pub fn delete(&self, index: &str, id: &str) -> Result<bool> {
        self.index(index)?.delete(id)
    }

    pub fn search(&self, index: &str, query: &Query, options: &SearchOptions) -> Result<SearchResults> {
        self.index(index)?.search(query, options)
    }

    pub fn search_str(&self, index: &str, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        self.index(index)?.search_str(query, options)
    }

    pub fn suggest(&self, index: &str, prefix: &str, config: &SuggestConfig) -> Result<Vec<Suggestion>> {
        self.index(index)?.suggest(prefix, config)
    }

    pub fn did_you_mean(&self, index: &str, phrase: &str, config: &DidYouMeanConfig) -> Result<String> {
        self.index(index)?.did_you_mean(phrase, config)
    }

    pub fn highlight<S: AsRef<str>>(
        &self,
        index: &str,
        id: &str,
        field: &str,
        terms: &[S],
        config: &HighlightConfig,
    ) -> Result<Vec<HighlightFragment>> {
        self.index(index)?.highlight(id, field, terms, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lifecycle() {
        let engine = Engine::default();
        engine.create_index("a", IndexConfig::new()).unwrap();
        engine.create_index("b", IndexConfig::new()).unwrap();
        assert_eq!(engine.list_indexes(), vec!["a", "b"]);

        let err = engine.create_index("a", IndexConfig::new()).unwrap_err();
        assert!(matches!(err, QuarryError::IndexAlreadyExists(_)));

        engine.drop_index("a").unwrap();
        assert!(matches!(
            engine.index("a").unwrap_err(),
            QuarryError::IndexNotFound(_)
        ));
        assert!(engine.drop_index("a").is_err());
        assert!(engine.create_index("bad name", IndexConfig::new()).is_err());
    }

    #[test]
    fn test_index_limit() {
        let config = EngineConfig {
            max_indexes: 1,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config);
        engine.create_index("a", IndexConfig::new()).unwrap();
        assert!(matches!(
            engine.create_index("b", IndexConfig::new()).unwrap_err(),
            QuarryError::ResourceExhausted(_)
        ));
    }

    #[test]
    fn test_engine_metrics_aggregate() {
        let engine = Engine::default();
        for name in ["a", "b"] {
            engine.create_index(name, IndexConfig::new()).unwrap();
            let doc = Document::builder().id("1").text("title", "x").build().unwrap();
            engine.add(name, doc).unwrap();
        }
        engine.search_str("a", "title:x", &SearchOptions::new()).unwrap();
        let metrics = engine.metrics();
        assert_eq!(metrics.documents_indexed, 2);
        assert_eq!(metrics.queries_executed, 1);
    }
}
