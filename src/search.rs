//! Query execution, scoring and the options and results of a search.

pub mod executor;
pub mod options;
pub mod scoring;

pub use executor::{Candidates, Executor, SearchContext};
pub use options::{
    CancellationToken, Deadline, SearchHit, SearchOptions, SearchResults, SortBy, SortOrder,
};
pub use scoring::{Scorer, ScoringConfig, TermStatistics};
