//! Stats command handler.

use clap::Args;
use recall_core::{config::RecallConfig, RecallResult};
use recall_corpus::snapshot;
use recall_corpus::SourceType;
use std::collections::HashMap;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &RecallConfig) -> RecallResult<()> {
        tracing::info!("Executing stats command");

        let index_path = config.index_path();
        let (entries, meta) = snapshot::load(&index_path)?;

        let mut per_source: HashMap<SourceType, usize> = HashMap::new();
        for entry in &entries {
            *per_source.entry(entry.record.source_type()).or_insert(0) += 1;
        }

        let count_for = |source_type: SourceType| per_source.get(&source_type).copied().unwrap_or(0);

        let snapshot_size = std::fs::metadata(&index_path).map(|m| m.len()).unwrap_or(0);

        if self.json {
            let output = serde_json::json!({
                "entries": entries.len(),
                "documents": count_for(SourceType::Document),
                "auditRows": count_for(SourceType::AuditLog),
                "incidents": count_for(SourceType::Incident),
                "embedding": {
                    "provider": meta.provider,
                    "model": meta.model,
                    "dimensions": meta.dimensions,
                },
                "builtAt": meta.built_at.to_rfc3339(),
                "snapshotBytes": snapshot_size,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Index: {}", index_path.display());
            println!("  Entries: {}", entries.len());
            println!("    document:  {}", count_for(SourceType::Document));
            println!("    audit_log: {}", count_for(SourceType::AuditLog));
            println!("    incident:  {}", count_for(SourceType::Incident));
            println!(
                "  Embedding: {}/{} ({}d)",
                meta.provider, meta.model, meta.dimensions
            );
            println!("  Built: {}", meta.built_at.to_rfc3339());
            println!("  Snapshot size: {} bytes", snapshot_size);
        }

        Ok(())
    }
}
