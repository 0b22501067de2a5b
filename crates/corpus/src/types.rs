//! Pipeline data model: records, provenance, index entries, reports.

use chrono::{DateTime, Utc};
use recall_core::RecallError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// The kind of source a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Document,
    AuditLog,
    Incident,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Document => "document",
            SourceType::AuditLog => "audit_log",
            SourceType::Incident => "incident",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = RecallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" | "doc" => Ok(SourceType::Document),
            "audit_log" | "audit-log" | "audit" => Ok(SourceType::AuditLog),
            "incident" | "incidents" => Ok(SourceType::Incident),
            other => Err(RecallError::Config(format!(
                "Unknown source type: '{}'. Supported: document, audit_log, incident",
                other
            ))),
        }
    }
}

/// Origin of a single record, one variant per source type.
///
/// The source type is derived from the variant, so an entry's type and its
/// provenance can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    Document { file: String, page: u32, chunk: u32 },
    AuditRow { row_id: i64 },
    Incident { number: String },
}

impl Provenance {
    pub fn source_type(&self) -> SourceType {
        match self {
            Provenance::Document { .. } => SourceType::Document,
            Provenance::AuditRow { .. } => SourceType::AuditLog,
            Provenance::Incident { .. } => SourceType::Incident,
        }
    }

    /// Human-readable provenance string, e.g. "Document page 12",
    /// "Audit row 4821", "Incident INC0045231".
    pub fn label(&self) -> String {
        match self {
            Provenance::Document { page, .. } => format!("Document page {}", page),
            Provenance::AuditRow { row_id } => format!("Audit row {}", row_id),
            Provenance::Incident { number } => format!("Incident {}", number),
        }
    }

    /// Copy with the chunk ordinal set. Row and incident provenance is
    /// shared by every chunk of one unit, so only documents change.
    pub(crate) fn with_chunk(&self, chunk: u32) -> Provenance {
        match self {
            Provenance::Document { file, page, .. } => Provenance::Document {
                file: file.clone(),
                page: *page,
                chunk,
            },
            other => other.clone(),
        }
    }
}

/// A normalized unit of indexable text. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Chunked text content
    pub text: String,

    /// Origin of the text
    pub provenance: Provenance,

    /// Additional origins, populated only under the merge dedupe policy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_from: Vec<Provenance>,

    /// Source-side timestamp, or the rebuild time when the source has none
    pub created_at: DateTime<Utc>,
}

impl SourceRecord {
    pub fn source_type(&self) -> SourceType {
        self.provenance.source_type()
    }

    /// SHA-256 of the text content, used as the dedupe grouping key.
    pub fn content_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Provenance label including merged origins, e.g.
    /// "Document page 3 (also: Audit row 12)".
    pub fn provenance_label(&self) -> String {
        let label = self.provenance.label();
        if self.merged_from.is_empty() {
            return label;
        }

        let also: Vec<String> = self.merged_from.iter().map(|p| p.label()).collect();
        format!("{} (also: {})", label, also.join(", "))
    }
}

/// An embedded record. Owned exclusively by the index store: created during
/// indexing, never mutated, discarded wholesale on re-index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub record: SourceRecord,
    pub embedding: Vec<f32>,
}

/// A scored entry returned by the index store. Transient, never persisted.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub entry: IndexedEntry,
    pub score: f32,
    /// 1-based position in the result list
    pub rank: usize,
}

/// A display-ready hit from the query router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub source_type: SourceType,
    /// Human-readable provenance string
    pub provenance: String,
    pub score: f32,
    pub rank: usize,
}

/// Raw text unit produced by a source reader, before normalization.
#[derive(Debug, Clone)]
pub struct RawUnit {
    pub text: String,
    pub provenance: Provenance,
    /// Source-side timestamp if the source carries one
    pub created_at: Option<DateTime<Utc>>,
}

/// Everything one reader produced in a single ingestion pass.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source_type: SourceType,

    pub units: Vec<RawUnit>,

    /// False when a fetch limit or pagination cap truncated the result set
    pub complete: bool,
}

/// Outcome of one source during a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Indexed { records: usize, complete: bool },
    Failed { error: String },
    Skipped { reason: String },
}

/// Per-source entry in a rebuild report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source_type: SourceType,

    /// Short description of the configured source (path, URL, ...)
    pub detail: String,

    pub status: SourceStatus,
}

/// Partial-success summary returned by a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildReport {
    pub sources: Vec<SourceOutcome>,

    /// Entries in the new index generation
    pub total_records: usize,

    pub duration_secs: f64,
}

impl RebuildReport {
    /// True when at least one source was indexed and the index was replaced.
    pub fn succeeded(&self) -> bool {
        self.sources
            .iter()
            .any(|o| matches!(o.status, SourceStatus::Indexed { .. }))
    }
}
