//! Rebuild command handler.

use clap::Args;
use recall_core::{config::RecallConfig, RecallResult};
use recall_corpus::snapshot::{self, SnapshotMeta};
use recall_corpus::{MemoryIndex, Pipeline, SourceStatus};
use std::sync::Arc;

/// Rebuild the index from all configured sources
#[derive(Args, Debug)]
pub struct RebuildCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RebuildCommand {
    pub async fn execute(&self, config: &RecallConfig) -> RecallResult<()> {
        tracing::info!("Executing rebuild command");

        let embedder = recall_embed::create_provider(&config.embedding, config.timeout())?;
        let index = Arc::new(MemoryIndex::new());
        let pipeline = Pipeline::new(Arc::clone(&index), embedder, config);

        let (readers, skipped) = Pipeline::readers_from_config(config)?;

        let mut report = pipeline.rebuild(&readers).await?;
        report.sources.extend(skipped);

        if report.succeeded() {
            let entries = index.snapshot();
            let meta = SnapshotMeta::new(&config.embedding);
            snapshot::save(&config.index_path(), &entries, &meta)?;
        } else {
            tracing::warn!("No source succeeded; existing snapshot left untouched");
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for outcome in &report.sources {
                let line = match &outcome.status {
                    SourceStatus::Indexed { records, complete } => {
                        if *complete {
                            format!("{} records", records)
                        } else {
                            format!("{} records (truncated)", records)
                        }
                    }
                    SourceStatus::Failed { error } => format!("FAILED: {}", error),
                    SourceStatus::Skipped { reason } => format!("skipped: {}", reason),
                };
                println!("{:<10} {:<40} {}", outcome.source_type, outcome.detail, line);
            }
            println!(
                "Indexed {} records in {:.2}s",
                report.total_records, report.duration_secs
            );
        }

        Ok(())
    }
}
