//! Normalizer: common record shape, chunking, provenance stamping.
//!
//! Converts raw units from any reader into `SourceRecord` values. Long texts
//! are segmented into bounded-size chunks with overlap so each chunk stays
//! semantically retrievable. Chunking is deterministic: the same input and
//! settings always yield the same boundaries and count.

use crate::types::{SourceBatch, SourceRecord};
use chrono::{DateTime, Utc};
use recall_core::DedupePolicy;
use std::collections::HashMap;

/// Chunking and provenance stamping policy.
#[derive(Debug, Clone)]
pub struct Normalizer {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Normalizer {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Produce records for one reader batch.
    ///
    /// `fallback_created_at` stamps records whose source carries no
    /// timestamp; the pipeline passes the rebuild time, tests pass a fixed
    /// instant.
    pub fn normalize(
        &self,
        batch: &SourceBatch,
        fallback_created_at: DateTime<Utc>,
    ) -> Vec<SourceRecord> {
        let mut records = Vec::new();

        for unit in &batch.units {
            let created_at = unit.created_at.unwrap_or(fallback_created_at);

            for (i, piece) in self.chunk(&unit.text).into_iter().enumerate() {
                records.push(SourceRecord {
                    text: piece,
                    provenance: unit.provenance.with_chunk(i as u32),
                    merged_from: Vec::new(),
                    created_at,
                });
            }
        }

        tracing::debug!(
            "Normalized {} {} units into {} records",
            batch.units.len(),
            batch.source_type,
            records.len()
        );

        records
    }

    /// Split text into chunks of at most `chunk_size` characters with
    /// `chunk_overlap` characters of overlap.
    ///
    /// Boundaries always land on `char` boundaries. A trailing fragment that
    /// the previous chunk's overlap already covers is not re-emitted, so no
    /// text is lost and nothing is duplicated as a whole chunk.
    fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let step = if self.chunk_size > self.chunk_overlap {
            self.chunk_size - self.chunk_overlap
        } else {
            self.chunk_size
        };

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            // the tail is already inside the previous chunk's overlap
            if start > 0 && text.len() - start <= self.chunk_overlap {
                break;
            }

            let mut end = (start + self.chunk_size).min(text.len());
            while end > start && !text.is_char_boundary(end) {
                end -= 1;
            }

            let piece = text[start..end].trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if end == text.len() {
                break;
            }

            let mut next = start + step;
            while next < text.len() && !text.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }

        chunks
    }
}

/// Apply the configured duplicate policy to the full record set of a rebuild.
///
/// `KeepSeparate` returns the records untouched. `MergeProvenance` collapses
/// byte-identical texts into the first-seen record, which collects the other
/// origins in `merged_from` and keeps the earliest timestamp. Insertion order
/// is preserved either way.
pub fn apply_dedupe(records: Vec<SourceRecord>, policy: DedupePolicy) -> Vec<SourceRecord> {
    match policy {
        DedupePolicy::KeepSeparate => records,
        DedupePolicy::MergeProvenance => {
            let mut merged: Vec<SourceRecord> = Vec::with_capacity(records.len());
            let mut seen: HashMap<String, usize> = HashMap::new();

            for record in records {
                let key = record.content_key();
                match seen.get(&key).copied() {
                    Some(i) => {
                        let kept = &mut merged[i];
                        if record.created_at < kept.created_at {
                            kept.created_at = record.created_at;
                        }
                        kept.merged_from.push(record.provenance);
                    }
                    None => {
                        seen.insert(key, merged.len());
                        merged.push(record);
                    }
                }
            }

            merged
        }
    }
}
