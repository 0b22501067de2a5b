//! Rebuild orchestration: fan out readers, embed, swap atomically.
//!
//! Per-source failures are isolated: one reader failing does not abort the
//! other two, and the report says which sources succeeded, which failed, and
//! why. The index is only touched after every reader finishes, so the
//! atomic-rebuild guarantee of the store holds across the whole pass.

use crate::index::MemoryIndex;
use crate::normalize::{apply_dedupe, Normalizer};
use crate::sources::SourceReader;
use crate::types::{
    IndexedEntry, RebuildReport, SourceOutcome, SourceRecord, SourceStatus, SourceType,
};
use chrono::Utc;
use recall_core::{DedupePolicy, RecallConfig, RecallError, RecallResult};
use recall_embed::EmbeddingProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Ingestion pipeline bound to one index and one embedder.
pub struct Pipeline {
    index: Arc<MemoryIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    normalizer: Normalizer,
    dedupe: DedupePolicy,
    timeout: Duration,
    batch_size: usize,
    rebuild_gate: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        index: Arc<MemoryIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &RecallConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            normalizer: Normalizer::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            dedupe: config.dedupe,
            timeout: config.timeout(),
            batch_size: config.embedding.batch_size.max(1),
            rebuild_gate: Mutex::new(()),
        }
    }

    /// Rebuild the index from the given readers.
    ///
    /// Readers run concurrently; each is bounded by the configured timeout.
    /// Returns `Busy` when another rebuild is in progress. If every source
    /// fails the previous generation is kept and the report carries the
    /// failures; an embedding failure likewise leaves the old index intact.
    pub async fn rebuild(&self, readers: &[Box<dyn SourceReader>]) -> RecallResult<RebuildReport> {
        let _gate = self
            .rebuild_gate
            .try_lock()
            .map_err(|_| RecallError::Busy)?;

        let start = Instant::now();
        let rebuild_time = Utc::now();
        let timeout_secs = self.timeout.as_secs();

        tracing::info!("Starting rebuild across {} sources", readers.len());

        let reads = readers.iter().map(|reader| async move {
            let result = match tokio::time::timeout(self.timeout, reader.read()).await {
                Ok(result) => result,
                Err(_) => Err(RecallError::Timeout(
                    format!("{} ingestion", reader.source_type()),
                    timeout_secs,
                )),
            };
            (reader.source_type(), reader.describe(), result)
        });

        let results = futures::future::join_all(reads).await;

        let mut outcomes = Vec::with_capacity(results.len());
        let mut records: Vec<SourceRecord> = Vec::new();

        for (source_type, detail, result) in results {
            match result {
                Ok(batch) => {
                    let batch_records = self.normalizer.normalize(&batch, rebuild_time);
                    tracing::info!(
                        "{}: {} units -> {} records (complete: {})",
                        source_type,
                        batch.units.len(),
                        batch_records.len(),
                        batch.complete
                    );

                    outcomes.push(SourceOutcome {
                        source_type,
                        detail,
                        status: SourceStatus::Indexed {
                            records: batch_records.len(),
                            complete: batch.complete,
                        },
                    });
                    records.extend(batch_records);
                }
                Err(e) => {
                    tracing::warn!("{} ingestion failed: {}", source_type, e);
                    outcomes.push(SourceOutcome {
                        source_type,
                        detail,
                        status: SourceStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        let any_indexed = outcomes
            .iter()
            .any(|o| matches!(o.status, SourceStatus::Indexed { .. }));

        if !any_indexed {
            tracing::warn!("Every source failed; keeping the previous index generation");
            return Ok(RebuildReport {
                sources: outcomes,
                total_records: 0,
                duration_secs: start.elapsed().as_secs_f64(),
            });
        }

        let records = apply_dedupe(records, self.dedupe);
        let entries = self.embed_records(records).await?;
        let total_records = entries.len();

        self.index.rebuild(entries);

        let duration_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            "Rebuilt index with {} entries in {:.2}s",
            total_records,
            duration_secs
        );

        Ok(RebuildReport {
            sources: outcomes,
            total_records,
            duration_secs,
        })
    }

    async fn embed_records(
        &self,
        records: Vec<SourceRecord>,
    ) -> RecallResult<Vec<IndexedEntry>> {
        let timeout_secs = self.timeout.as_secs();
        let mut entries = Vec::with_capacity(records.len());

        for batch in records.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();

            let embeddings = tokio::time::timeout(self.timeout, self.embedder.embed_batch(&texts))
                .await
                .map_err(|_| {
                    RecallError::Timeout("Embedding request".to_string(), timeout_secs)
                })??;

            if embeddings.len() != batch.len() {
                return Err(RecallError::Embedding(format!(
                    "Provider returned {} embeddings for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (record, embedding) in batch.iter().cloned().zip(embeddings) {
                entries.push(IndexedEntry { record, embedding });
            }
        }

        Ok(entries)
    }

    /// Build the readers for every configured source, plus the skip list for
    /// unconfigured ones.
    pub fn readers_from_config(
        config: &RecallConfig,
    ) -> RecallResult<(Vec<Box<dyn SourceReader>>, Vec<SourceOutcome>)> {
        use crate::sources::{AuditLogReader, DocumentReader, IncidentReader};

        let mut readers: Vec<Box<dyn SourceReader>> = Vec::new();
        let mut skipped = Vec::new();

        match &config.sources.document {
            Some(document) => {
                readers.push(Box::new(DocumentReader::new(
                    config.resolve_path(&document.path),
                )));
            }
            None => skipped.push(skip_outcome(SourceType::Document)),
        }

        match &config.sources.audit {
            Some(audit) => {
                readers.push(Box::new(AuditLogReader::new(
                    config.resolve_path(&audit.db_path),
                    audit.fetch_limit,
                )));
            }
            None => skipped.push(skip_outcome(SourceType::AuditLog)),
        }

        match &config.sources.incidents {
            Some(incidents) => {
                readers.push(Box::new(IncidentReader::new(
                    incidents.base_url.clone(),
                    config.resolve_incident_token(),
                    incidents.page_size,
                    incidents.max_pages,
                    config.timeout(),
                )?));
            }
            None => skipped.push(skip_outcome(SourceType::Incident)),
        }

        Ok((readers, skipped))
    }
}

fn skip_outcome(source_type: SourceType) -> SourceOutcome {
    SourceOutcome {
        source_type,
        detail: "-".to_string(),
        status: SourceStatus::Skipped {
            reason: "not configured".to_string(),
        },
    }
}
