//! # Quarry
//!
//! An embeddable full-text search engine.
//!
//! ## Features
//!
//! - Named indexes with typed schemas and dynamic field inference
//! - Configurable text analysis pipelines
//! - A Lucene-style query language with phrases, ranges, fuzzy and wildcard terms
//! - BM25 and TF-IDF scoring
//! - Facets, highlighting, suggestions and spelling correction
//! - A line-oriented text command protocol
//!
//! ## Example
//!
//! ```
//! use quarry::prelude::*;
//!
//! let engine = Engine::default();
//! let schema = IndexConfig::new()
//!     .with_field(FieldEntry::text("title"))
//!     .with_field(FieldEntry::number("price"));
//! engine.create_index("products", schema).unwrap();
//!
//! let doc = Document::builder()
//!     .id("p1")
//!     .text("title", "Wireless Bluetooth Headphones")
//!     .number("price", 79.99)
//!     .build()
//!     .unwrap();
//! engine.add("products", doc).unwrap();
//!
//! let results = engine
//!     .search_str("products", "title:headphones AND price:[50 TO 100]", &SearchOptions::new())
//!     .unwrap();
//! assert_eq!(results.total_hits, 1);
//! ```

pub mod analysis;
pub mod cli;
pub mod command;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod facet;
pub mod highlight;
pub mod index;
pub mod metrics;
pub mod query;
pub mod schema;
pub mod search;
pub mod spelling;
pub mod util;

pub mod prelude {
    pub use crate::command::{Command, Reply};
    pub use crate::config::{EngineConfig, IndexConfig};
    pub use crate::document::Document;
    pub use crate::engine::Engine;
    pub use crate::error::{QuarryError, Result};
    pub use crate::facet::FacetRequest;
    pub use crate::document::FieldValue;
    pub use crate::highlight::HighlightConfig;
    pub use crate::index::Index;
    pub use crate::query::Query;
    pub use crate::schema::{FieldEntry, FieldType, Schema};
    pub use crate::search::{SearchOptions, SearchResults, SortBy, SortOrder};
    pub use crate::spelling::{DidYouMeanConfig, SuggestConfig};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
