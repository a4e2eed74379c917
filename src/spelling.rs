//! Term suggestion and spelling correction.
//!
//! Both draw candidates from the index's own term dictionary through a
//! character-trigram index kept in step with it, and verify every
//! candidate with an exact edit-distance computation.

pub mod cache;
pub mod suggest;
pub mod trigram;

pub use cache::SuggestCache;
pub use suggest::{DidYouMeanConfig, SuggestConfig, Suggestion};
pub use trigram::TrigramIndex;
