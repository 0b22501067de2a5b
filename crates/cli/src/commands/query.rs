//! Query command handler.

use clap::Args;
use recall_core::{config::RecallConfig, RecallResult};
use recall_corpus::snapshot;
use recall_corpus::{MemoryIndex, QueryOptions, QueryRouter, SourceType};
use std::sync::Arc;

/// Query the index with free text
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Query text
    pub query: String,

    /// Number of hits to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Restrict results to source types (document, audit_log, incident);
    /// repeatable
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &RecallConfig) -> RecallResult<()> {
        tracing::info!("Executing query command");

        let (entries, meta) = snapshot::load(&config.index_path())?;
        meta.ensure_compatible(&config.embedding)?;

        let index = Arc::new(MemoryIndex::new());
        index.rebuild(entries);

        let embedder = recall_embed::create_provider(&config.embedding, config.timeout())?;
        let router = QueryRouter::new(index, embedder, config);

        let sources = if self.sources.is_empty() {
            None
        } else {
            Some(
                self.sources
                    .iter()
                    .map(|s| s.parse::<SourceType>())
                    .collect::<RecallResult<Vec<_>>>()?,
            )
        };

        let options = QueryOptions {
            top_k: self.top_k,
            sources,
        };

        let hits = router.query(&self.query, &options).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
        } else if hits.is_empty() {
            println!("No hits.");
        } else {
            for hit in &hits {
                println!("{}. [{:.3}] {}", hit.rank, hit.score, hit.provenance);
                println!("   {}", snippet(&hit.text, 200));
            }
        }

        Ok(())
    }
}

/// First `max` characters of the text, on a char boundary, one line.
fn snippet(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }

    let cut: String = flat.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}
