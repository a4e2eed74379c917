//! Levenshtein distance algorithms.
//!
//! The free functions compare two whole strings. [`EditRows`] keeps the
//! dynamic-programming rows of a pattern against a growing candidate, so a
//! walk over a sorted term dictionary can reuse the rows of a shared prefix
//! and abandon a prefix as soon as no extension can stay within bounds.

use std::cmp::min;

/// Minimum number of single-character insertions, deletions or
/// substitutions needed to turn `s1` into `s2`.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = min(min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Levenshtein distance with early termination.
///
/// Returns `None` as soon as the distance is known to exceed `threshold`.
pub fn levenshtein_within(s1: &str, s2: &str, threshold: usize) -> Option<usize> {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.len().abs_diff(b.len()) > threshold {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = min(min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
            row_min = min(row_min, curr[j + 1]);
        }
        if row_min > threshold {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= threshold).then_some(distance)
}

/// Incremental edit-distance rows of a fixed pattern against a candidate
/// that is extended and truncated one character at a time.
///
/// Row `i` holds the distances between the first `i` candidate characters
/// and every prefix of the pattern.
#[derive(Debug, Clone)]
pub struct EditRows {
    pattern: Vec<char>,
    rows: Vec<Vec<u32>>,
}

impl EditRows {
    pub fn new(pattern: &str) -> Self {
        let pattern: Vec<char> = pattern.chars().collect();
        let first = (0..=pattern.len() as u32).collect();
        EditRows {
            pattern,
            rows: vec![first],
        }
    }

    /// Number of candidate characters currently pushed.
    pub fn depth(&self) -> usize {
        self.rows.len() - 1
    }

    /// Drop rows until only `depth` candidate characters remain.
    pub fn truncate(&mut self, depth: usize) {
        self.rows.truncate(depth + 1);
    }

    /// Extend the candidate by one character.
    pub fn push(&mut self, c: char) {
        let prev = &self.rows[self.rows.len() - 1];
        let mut row = Vec::with_capacity(prev.len());
        row.push(prev[0] + 1);
        for (j, pc) in self.pattern.iter().enumerate() {
            let cost = u32::from(*pc != c);
            let value = min(min(prev[j + 1] + 1, row[j] + 1), prev[j] + cost);
            row.push(value);
        }
        self.rows.push(row);
    }

    /// Distance between the whole pattern and the current candidate.
    pub fn distance(&self) -> u32 {
        let last = &self.rows[self.rows.len() - 1];
        last[last.len() - 1]
    }

    /// Smallest value in the current row. When it exceeds a bound, no
    /// extension of the candidate can come back within that bound.
    pub fn row_min(&self) -> u32 {
        self.rows[self.rows.len() - 1]
            .iter()
            .copied()
            .min()
            .unwrap_or(0)
    }

    /// Distance between the whole pattern and the closest prefix of the
    /// current candidate.
    pub fn prefix_distance(&self) -> u32 {
        self.rows
            .iter()
            .map(|row| row[row.len() - 1])
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("wireles", "wireless"), 1);
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
    }

    #[test]
    fn test_levenshtein_within() {
        assert_eq!(levenshtein_within("kitten", "sitting", 3), Some(3));
        assert_eq!(levenshtein_within("kitten", "sitting", 2), None);
        assert_eq!(levenshtein_within("a", "abcdef", 2), None);
        assert_eq!(levenshtein_within("same", "same", 0), Some(0));
    }

    #[test]
    fn test_edit_rows_matches_full_distance() {
        let mut rows = EditRows::new("wireless");
        for c in "wirless".chars() {
            rows.push(c);
        }
        assert_eq!(rows.distance(), 1);

        rows.truncate(3);
        assert_eq!(rows.depth(), 3);
        for c in "eless".chars() {
            rows.push(c);
        }
        assert_eq!(rows.distance(), 0);
    }

    #[test]
    fn test_edit_rows_prefix_distance() {
        let mut rows = EditRows::new("blue");
        for c in "bluetooth".chars() {
            rows.push(c);
        }
        assert_eq!(rows.prefix_distance(), 0);
        assert_eq!(rows.distance(), 5);

        let mut rows = EditRows::new("zzz");
        rows.push('a');
        rows.push('b');
        rows.push('c');
        assert!(rows.row_min() >= 2);
    }
}
