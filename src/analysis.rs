//! Text analysis: tokenizers, token filters and the analyzers that chain
//! them.
//!
//! Analysis is deterministic: the same text and analyzer configuration
//! always produce the same token sequence, which is what makes the index
//! rebuildable from the stored documents.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::config::{AnalyzerConfig, FilterConfig, TokenizerConfig};
pub use analyzer::registry::AnalyzerRegistry;
pub use analyzer::{Analyzer, PipelineAnalyzer};
pub use token::{Token, TokenStream};
