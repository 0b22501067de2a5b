//! In-memory vector index with atomic generation swap.
//!
//! The store holds one immutable generation of entries behind an `Arc`.
//! `rebuild` swaps the whole generation in one pointer write, so a query
//! running during a rebuild observes either the old or the new index,
//! never a mix.

use crate::types::{IndexedEntry, QueryResult, SourceType};
use recall_core::{RecallError, RecallResult};
use std::sync::{Arc, PoisonError, RwLock};

/// Vector index over `IndexedEntry` values.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    generation: RwLock<Arc<Vec<IndexedEntry>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation. Cheap: clones the `Arc`, not the entries.
    pub fn snapshot(&self) -> Arc<Vec<IndexedEntry>> {
        let guard = self
            .generation
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Append entries, publishing a new generation.
    pub fn add(&self, entries: Vec<IndexedEntry>) {
        let mut guard = self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut next: Vec<IndexedEntry> = guard.as_ref().clone();
        next.extend(entries);
        *guard = Arc::new(next);
    }

    /// Replace the index wholesale with a new generation.
    pub fn rebuild(&self, entries: Vec<IndexedEntry>) {
        let mut guard = self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(entries);
    }

    /// Return the k nearest entries by cosine similarity, optionally
    /// restricted to the given source types.
    ///
    /// Ties are broken by insertion order, earliest first. An empty index
    /// yields an empty result, not an error; fewer than k entries yield all
    /// of them.
    pub fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&[SourceType]>,
    ) -> RecallResult<Vec<QueryResult>> {
        let generation = self.snapshot();

        if generation.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if let Some(first) = generation.first() {
            if first.embedding.len() != vector.len() {
                return Err(RecallError::Index(format!(
                    "Query vector has {} dimensions, index entries have {}",
                    vector.len(),
                    first.embedding.len()
                )));
            }
        }

        let mut scored: Vec<(usize, f32)> = generation
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                filter.map_or(true, |types| types.contains(&entry.record.source_type()))
            })
            .map(|(i, entry)| (i, cosine_similarity(vector, &entry.embedding)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (index, score))| QueryResult {
                entry: generation[index].clone(),
                score,
                rank: i + 1,
            })
            .collect())
    }
}

/// Cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Provenance, SourceRecord};
    use chrono::Utc;

    fn entry(text: &str, provenance: Provenance, embedding: Vec<f32>) -> IndexedEntry {
        IndexedEntry {
            record: SourceRecord {
                text: text.to_string(),
                provenance,
                merged_from: Vec::new(),
                created_at: Utc::now(),
            },
            embedding,
        }
    }

    fn doc_entry(text: &str, embedding: Vec<f32>) -> IndexedEntry {
        entry(
            text,
            Provenance::Document {
                file: "doc.md".to_string(),
                page: 1,
                chunk: 0,
            },
            embedding,
        )
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = MemoryIndex::new();
        let results = index.query(&[1.0, 0.0], 5, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_fewer_entries_than_k_returns_all() {
        let index = MemoryIndex::new();
        index.rebuild(vec![
            doc_entry("a", vec![1.0, 0.0]),
            doc_entry("b", vec![0.0, 1.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 10, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
    }

    #[test]
    fn test_ordering_by_similarity() {
        let index = MemoryIndex::new();
        index.rebuild(vec![
            doc_entry("orthogonal", vec![0.0, 1.0]),
            doc_entry("aligned", vec![1.0, 0.0]),
            doc_entry("diagonal", vec![1.0, 1.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 3, None).unwrap();
        assert_eq!(results[0].entry.record.text, "aligned");
        assert_eq!(results[1].entry.record.text, "diagonal");
        assert_eq!(results[2].entry.record.text, "orthogonal");
    }

    #[test]
    fn test_ties_broken_by_insertion_order() {
        let index = MemoryIndex::new();
        index.rebuild(vec![
            doc_entry("first", vec![1.0, 0.0]),
            doc_entry("second", vec![1.0, 0.0]),
            doc_entry("third", vec![2.0, 0.0]), // same direction, same cosine
        ]);

        let results = index.query(&[1.0, 0.0], 3, None).unwrap();
        assert_eq!(results[0].entry.record.text, "first");
        assert_eq!(results[1].entry.record.text, "second");
        assert_eq!(results[2].entry.record.text, "third");
    }

    #[test]
    fn test_source_type_filter() {
        let index = MemoryIndex::new();
        index.rebuild(vec![
            doc_entry("doc", vec![1.0, 0.0]),
            entry(
                "row",
                Provenance::AuditRow { row_id: 1 },
                vec![1.0, 0.0],
            ),
            entry(
                "inc",
                Provenance::Incident {
                    number: "INC1".to_string(),
                },
                vec![1.0, 0.0],
            ),
        ]);

        let results = index
            .query(&[1.0, 0.0], 10, Some(&[SourceType::Incident]))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.record.text, "inc");
        assert_eq!(results[0].rank, 1);

        let results = index
            .query(
                &[1.0, 0.0],
                10,
                Some(&[SourceType::Document, SourceType::AuditLog]),
            )
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_is_an_index_error() {
        let index = MemoryIndex::new();
        index.rebuild(vec![doc_entry("a", vec![1.0, 0.0, 0.0])]);

        let result = index.query(&[1.0, 0.0], 1, None);
        assert!(matches!(result, Err(RecallError::Index(_))));
    }

    #[test]
    fn test_add_appends_to_generation() {
        let index = MemoryIndex::new();
        index.add(vec![doc_entry("a", vec![1.0, 0.0])]);
        index.add(vec![doc_entry("b", vec![0.0, 1.0])]);

        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_rebuild_replaces_wholesale() {
        let index = MemoryIndex::new();
        index.rebuild(vec![doc_entry("old", vec![1.0, 0.0])]);
        index.rebuild(vec![
            doc_entry("new-1", vec![1.0, 0.0]),
            doc_entry("new-2", vec![0.0, 1.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 10, None).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.entry.record.text.starts_with("new")));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
    }
}
