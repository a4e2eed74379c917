//! Highlighting of matched terms in stored field text.
//!
//! The stored text is re-analyzed with the field's analyzer; tokens whose
//! term matched the query mark spans in the source text. Fragments are
//! windows of `fragment_size` characters centered on those spans, widened
//! so they never cut a span in half, and merged where they overlap.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeSet;
//!
//! use quarry::analysis::AnalyzerConfig;
//! use quarry::highlight::{HighlightConfig, Highlighter};
//!
//! let analyzer = AnalyzerConfig::preset("standard").unwrap().build("standard").unwrap();
//! let terms: BTreeSet<String> = ["wireless".to_string()].into();
//! let highlighter = Highlighter::new(HighlightConfig::default());
//!
//! let fragments = highlighter
//!     .highlight("Wireless Bluetooth Headphones", &analyzer, &terms)
//!     .unwrap();
//! assert_eq!(fragments[0].text, "<em>Wireless</em> Bluetooth Headphones");
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::error::Result;

/// Configuration for text highlighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Fields to highlight. Empty means every stored Text field the query
    /// matched terms in.
    pub fields: Vec<String>,
    /// Inserted before each matched span. Defaults to `<em>`.
    pub pre_tag: String,
    /// Inserted after each matched span. Defaults to `</em>`.
    pub post_tag: String,
    /// Length of each fragment in characters.
    pub fragment_size: usize,
    /// Most fragments returned per field; the best-scoring ones are kept.
    pub max_fragments: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            fields: Vec::new(),
            pre_tag: "<em>".to_string(),
            post_tag: "</em>".to_string(),
            fragment_size: 150,
            max_fragments: 3,
        }
    }
}

impl HighlightConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<P: Into<String>, Q: Into<String>>(mut self, pre_tag: P, post_tag: Q) -> Self {
        self.pre_tag = pre_tag.into();
        self.post_tag = post_tag.into();
        self
    }

    pub fn fragment_size(mut self, fragment_size: usize) -> Self {
        self.fragment_size = fragment_size;
        self
    }

    pub fn max_fragments(mut self, max_fragments: usize) -> Self {
        self.max_fragments = max_fragments;
        self
    }
}

/// Represents a highlighted fragment of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightFragment {
    /// The fragment with matched terms wrapped in the configured tags.
    pub text: String,
    /// Byte offset of the fragment in the source text.
    pub start_offset: usize,
    pub end_offset: usize,
    /// Number of matched spans inside the fragment.
    pub score: f32,
}

/// Builds highlighted fragments.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    config: HighlightConfig,
}

impl Highlighter {
    pub fn new(config: HighlightConfig) -> Self {
        Highlighter { config }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Highlight `terms` in `text`. Fragments come back in source order.
    pub fn highlight(
        &self,
        text: &str,
        analyzer: &dyn Analyzer,
        terms: &BTreeSet<String>,
    ) -> Result<Vec<HighlightFragment>> {
        if terms.is_empty() || text.is_empty() || self.config.max_fragments == 0 {
            return Ok(Vec::new());
        }

        let spans = self.find_spans(text, analyzer, terms)?;
        if spans.is_empty() {
            return Ok(Vec::new());
        }

        // Byte offset of every char boundary, including the end.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_spans: Vec<(usize, usize)> = spans
            .iter()
            .map(|&(s, e)| (char_index(&boundaries, s), char_index(&boundaries, e)))
            .collect();

        let windows = self.windows(&char_spans, boundaries.len() - 1);
        let mut fragments: Vec<(usize, usize, usize)> = windows
            .into_iter()
            .map(|(start, end)| {
                let count = char_spans
                    .iter()
                    .filter(|(s, e)| *s >= start && *e <= end)
                    .count();
                (start, end, count)
            })
            .collect();

        // Best first, earlier first on ties; then back to source order.
        fragments.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        fragments.truncate(self.config.max_fragments);
        fragments.sort_by_key(|f| f.0);

        Ok(fragments
            .into_iter()
            .map(|(start, end, count)| {
                let (byte_start, byte_end) = (boundaries[start], boundaries[end]);
                HighlightFragment {
                    text: self.render(text, byte_start, byte_end, &spans),
                    start_offset: byte_start,
                    end_offset: byte_end,
                    score: count as f32,
                }
            })
            .collect())
    }

    /// Byte ranges of matched tokens, sorted, with overlaps merged.
    fn find_spans(
        &self,
        text: &str,
        analyzer: &dyn Analyzer,
        terms: &BTreeSet<String>,
    ) -> Result<Vec<(usize, usize)>> {
        let mut spans: Vec<(usize, usize)> = analyzer
            .tokens(text)?
            .into_iter()
            .filter(|token| token.end_offset > token.start_offset && terms.contains(&token.text))
            .map(|token| (token.start_offset, token.end_offset.min(text.len())))
            .collect();
        spans.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        Ok(merged)
    }

    /// Fragment windows in chars, one per span, widened to whole spans and
    /// merged where they overlap.
    fn windows(&self, spans: &[(usize, usize)], text_chars: usize) -> Vec<(usize, usize)> {
        let size = self.config.fragment_size.max(1);
        let mut windows: Vec<(usize, usize)> = Vec::with_capacity(spans.len());

        for &(span_start, span_end) in spans {
            let width = size.max(span_end - span_start).min(text_chars);
            let center = (span_start + span_end) / 2;
            let mut start = center.saturating_sub(width / 2).min(text_chars - width);
            let mut end = start + width;

            // Never cut a span.
            loop {
                let mut changed = false;
                for &(s, e) in spans {
                    if s < start && e > start {
                        start = s;
                        changed = true;
                    }
                    if s < end && e > end {
                        end = e;
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }

            match windows.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => windows.push((start, end)),
            }
        }
        windows
    }

    fn render(&self, text: &str, start: usize, end: usize, spans: &[(usize, usize)]) -> String {
        let mut out = String::with_capacity(end - start + 16);
        let mut cursor = start;
        for &(s, e) in spans.iter().filter(|(s, e)| *s >= start && *e <= end) {
            out.push_str(&text[cursor..s]);
            out.push_str(&self.config.pre_tag);
            out.push_str(&text[s..e]);
            out.push_str(&self.config.post_tag);
            cursor = e;
        }
        out.push_str(&text[cursor..end]);
        out
    }
}

fn char_index(boundaries: &[usize], byte: usize) -> usize {
    match boundaries.binary_search(&byte) {
        Ok(i) => i,
        Err(i) => i,
    }
}
