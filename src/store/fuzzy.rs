//! Fuzzy search index over request URLs and names.
//!
//! The index keeps lowercased haystacks aligned with the request vector. It is
//! rebuilt only when the store's `index_revision` moves (requests inserted,
//! removed, cleared, or a URL rewritten), so typing a query never rebuilds it.

use crate::domain::Request;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Entry {
    url: String,
    name: String,
}

#[derive(Default)]
pub struct FuzzyIndex {
    revision: Option<u64>,
    entries: Vec<Entry>,
    matcher: SkimMatcherV2,
}

impl std::fmt::Debug for FuzzyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzyIndex")
            .field("revision", &self.revision)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl FuzzyIndex {
    /// Rebuilds the haystacks if `revision` differs from the last build.
    ///
    /// Returns true when a rebuild happened.
    pub fn sync(&mut self, revision: u64, requests: &[Arc<Request>]) -> bool {
        if self.revision == Some(revision) && self.entries.len() == requests.len() {
            return false;
        }

        let _span = tracing::debug_span!("fuzzy_index_rebuild", count = requests.len()).entered();
        self.entries = requests
            .iter()
            .map(|request| Entry {
                url: request.url.to_lowercase(),
                name: request.name.to_lowercase(),
            })
            .collect();
        self.revision = Some(revision);
        true
    }

    /// Scores every request against `query`.
    ///
    /// The query is split on whitespace; each token must fuzzy-match the URL
    /// or the name, and its better score counts. Returns `(position, score)`
    /// pairs sorted by descending score, ties kept in insertion order.
    #[must_use]
    pub fn rank(&self, query: &str) -> Vec<(usize, i64)> {
        let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if tokens.is_empty() {
            return (0..self.entries.len()).map(|i| (i, 0)).collect();
        }

        let mut scored: Vec<(usize, i64)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                tokens
                    .iter()
                    .map(|token| self.token_score(entry, token))
                    .sum::<Option<i64>>()
                    .map(|score| (position, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
    }

    fn token_score(&self, entry: &Entry, token: &str) -> Option<i64> {
        let url = self.matcher.fuzzy_match(&entry.url, token);
        let name = self.matcher.fuzzy_match(&entry.name, token);
        url.max(name)
    }
}

/// Coalesces the matched character indices of `text` into `(start, end)` ranges.
///
/// Each whitespace-separated token of `query` is matched on its own, as in
/// [`FuzzyIndex::rank`]; tokens that only match elsewhere (the URL) add
/// nothing. Used by the list view to highlight fuzzy matches; end is exclusive.
#[must_use]
pub fn highlight_ranges(text: &str, query: &str) -> Vec<(usize, usize)> {
    let matcher = SkimMatcherV2::default();
    let matched: BTreeSet<usize> = query
        .split_whitespace()
        .filter_map(|token| matcher.fuzzy_indices(text, token))
        .flat_map(|(_score, indices)| indices)
        .collect();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for idx in matched {
        match ranges.last_mut() {
            Some((_, end)) if *end == idx => *end = idx + 1,
            _ => ranges.push((idx, idx + 1)),
        }
    }
    ranges
}
