//! Id-tagged search result pools for relevance selection.
//!
//! Ids are assigned once, when a pool is built from one query batch, and the
//! id travels inside the same record as the result it names. A judgment can
//! therefore only ever select entries of the pool it was produced for.

use serde::Serialize;

use crate::core::types::{RelevanceJudgment, SearchResult};

/// A search result paired with its position-based id inside one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedResult {
    id: usize,
    #[serde(flatten)]
    result: SearchResult,
}

impl TaggedResult {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn into_result(self) -> SearchResult {
        self.result
    }
}

/// Remaining candidates of one query batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPool {
    entries: Vec<TaggedResult>,
}

impl ResultPool {
    /// Tag `results` with ids `0..n` in the order given.
    pub fn tag(results: impl IntoIterator<Item = SearchResult>) -> Self {
        Self {
            entries: results
                .into_iter()
                .enumerate()
                .map(|(id, result)| TaggedResult { id, result })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[TaggedResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every entry named by a verified judgment.
    ///
    /// Entries come back in pool order. Judgments below the relevance
    /// threshold, or naming ids not present in this pool, select nothing.
    pub fn take_verified(&mut self, judgments: &[RelevanceJudgment]) -> Vec<TaggedResult> {
        let (verified, remaining): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(|entry| {
                judgments
                    .iter()
                    .any(|judgment| judgment.id == entry.id && judgment.is_verified())
            });
        self.entries = remaining;
        verified
    }
}
