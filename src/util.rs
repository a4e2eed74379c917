//! Shared utility modules used across Quarry components.

pub mod clock;
pub mod levenshtein;
