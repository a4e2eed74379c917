//! Edit-distance expansion against a sorted term dictionary.
//!
//! The dictionary is walked in order while edit-distance rows are kept for
//! the current term. Consecutive terms share prefixes, so only the rows past
//! the shared prefix are recomputed. When every cell of a row exceeds the
//! bound, no term starting with that prefix can match and the walk jumps
//! straight past all of them.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::Result;
use crate::query::wildcard::CHECK_INTERVAL;
use crate::search::options::Deadline;
use crate::util::levenshtein::EditRows;

/// Largest edit distance a fuzzy clause may ask for.
pub const MAX_FUZZY_DISTANCE: u32 = 4;

/// What the pattern is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyMode {
    /// The whole term.
    Term,
    /// The closest prefix of the term.
    Prefix,
}

/// A dictionary term within the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyExpansion<'a> {
    pub term: &'a str,
    pub distance: u32,
}

/// Terms within `max_distance` edits of `pattern`.
///
/// At most `limit` expansions are returned, closest first; ties order by
/// term.
pub fn expand_fuzzy<'a, V>(
    terms: &'a BTreeMap<String, V>,
    pattern: &str,
    max_distance: u32,
    mode: FuzzyMode,
    limit: usize,
    deadline: &Deadline,
) -> Result<Vec<FuzzyExpansion<'a>>> {
    let mut rows = EditRows::new(pattern);
    let mut current: Vec<char> = Vec::new();
    let mut matched = Vec::new();
    let mut visited = 0usize;
    let mut iter = terms.range::<str, _>(..);

    while let Some((term, _)) = iter.next() {
        visited += 1;
        if visited % CHECK_INTERVAL == 0 {
            deadline.check()?;
        }

        let chars: Vec<char> = term.chars().collect();
        let shared = current
            .iter()
            .zip(&chars)
            .take_while(|(a, b)| a == b)
            .count();
        rows.truncate(shared);
        current.truncate(shared);

        let mut dead = false;
        for &c in &chars[shared..] {
            rows.push(c);
            current.push(c);
            let reachable = rows.row_min() <= max_distance
                || (mode == FuzzyMode::Prefix && rows.prefix_distance() <= max_distance);
            if !reachable {
                dead = true;
                break;
            }
        }

        if dead {
            match successor(&current) {
                Some(next) => {
                    iter = terms.range::<str, _>((Bound::Included(next.as_str()), Bound::Unbounded));
                    continue;
                }
                None => break,
            }
        }

        let distance = match mode {
            FuzzyMode::Term => rows.distance(),
            FuzzyMode::Prefix => rows.prefix_distance(),
        };
        if distance <= max_distance {
            matched.push(FuzzyExpansion {
                term: term.as_str(),
                distance,
            });
        }
    }

    if matched.len() > limit {
        matched.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.term.cmp(b.term)));
        matched.truncate(limit);
        log::warn!("fuzzy '{pattern}' truncated at {limit} terms");
    }
    Ok(matched)
}

/// The smallest string greater than every string starting with `prefix`.
fn successor(prefix: &[char]) -> Option<String> {
    let mut chars = prefix.to_vec();
    while let Some(last) = chars.pop() {
        let next = match last {
            char::MAX => None,
            '\u{D7FF}' => Some('\u{E000}'),
            c => char::from_u32(c as u32 + 1),
        };
        if let Some(next) = next {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}
