//! Source readers: extract raw text units with provenance.

mod audit;
mod document;
mod incident;

pub use audit::AuditLogReader;
pub use document::DocumentReader;
pub use incident::IncidentReader;

use crate::types::{SourceBatch, SourceType};
use chrono::{DateTime, NaiveDateTime, Utc};
use recall_core::RecallResult;

/// A reader produces one batch of raw units per ingestion pass.
///
/// Readers share no mutable state; the pipeline runs them as independent
/// concurrent tasks and only touches the index after all of them finish.
#[async_trait::async_trait]
pub trait SourceReader: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Short human-readable description of the configured source.
    fn describe(&self) -> String;

    async fn read(&self) -> RecallResult<SourceBatch>;
}

/// Parse a source-side timestamp, RFC 3339 or the trackers'
/// `YYYY-MM-DD HH:MM:SS` form. Unparsable values become `None` and the
/// record falls back to the rebuild time.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
