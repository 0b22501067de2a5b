//! Query routing: embed free text, search the index, annotate hits.

use crate::index::MemoryIndex;
use crate::types::{SearchHit, SourceType};
use recall_core::{RecallConfig, RecallError, RecallResult};
use recall_embed::EmbeddingProvider;
use std::sync::Arc;
use std::time::Duration;

/// Options for a single query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Override the configured top-k
    pub top_k: Option<usize>,

    /// Restrict results to these source types
    pub sources: Option<Vec<SourceType>>,
}

/// Routes free-text queries through the embedder to the index store.
pub struct QueryRouter {
    index: Arc<MemoryIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    timeout: Duration,
}

impl QueryRouter {
    pub fn new(
        index: Arc<MemoryIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &RecallConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            top_k: config.retrieval.top_k,
            timeout: config.timeout(),
        }
    }

    /// Answer a free-text query with ranked, provenance-annotated hits.
    ///
    /// An empty index yields an empty hit list. Failures surface with the
    /// failing component in the error variant; there is no fallback to
    /// stale results.
    pub async fn query(&self, text: &str, options: &QueryOptions) -> RecallResult<Vec<SearchHit>> {
        let text = text.trim();
        if text.is_empty() {
            tracing::warn!("Empty query text; returning no hits");
            return Ok(Vec::new());
        }

        let k = options.top_k.unwrap_or(self.top_k);

        tracing::debug!("Querying for top-{} hits: {}", k, text);

        let vector = tokio::time::timeout(self.timeout, self.embedder.embed(text))
            .await
            .map_err(|_| {
                RecallError::Timeout("Query embedding".to_string(), self.timeout.as_secs())
            })??;

        let results = self
            .index
            .query(&vector, k, options.sources.as_deref())?;

        if results.is_empty() {
            tracing::info!("No hits for query");
        } else {
            tracing::info!(
                "Retrieved {} hits (top score: {:.3})",
                results.len(),
                results[0].score
            );
        }

        Ok(results
            .into_iter()
            .map(|result| {
                let record = result.entry.record;
                SearchHit {
                    source_type: record.source_type(),
                    provenance: record.provenance_label(),
                    text: record.text,
                    score: result.score,
                    rank: result.rank,
                }
            })
            .collect())
    }
}
