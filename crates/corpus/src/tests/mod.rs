//! Integration tests exercising the full ingest-and-retrieve path.


use crate::sources::SourceReader;
use crate::types::{Provenance, RawUnit, SourceBatch, SourceType};
use recall_core::{RecallError, RecallResult};

/// Reader returning a fixed batch, for wiring pipelines without I/O.
pub(crate) struct StaticReader {
    pub source_type: SourceType,
    pub units: Vec<RawUnit>,
}

#[async_trait::async_trait]
impl SourceReader for StaticReader {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn read(&self) -> RecallResult<SourceBatch> {
        Ok(SourceBatch {
            source_type: self.source_type,
            units: self.units.clone(),
            complete: true,
        })
    }
}

/// Reader that always fails the way a dead incident tracker would.
pub(crate) struct FailingReader {
    pub source_type: SourceType,
}

#[async_trait::async_trait]
impl SourceReader for FailingReader {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }

    async fn read(&self) -> RecallResult<SourceBatch> {
        Err(RecallError::Api(
            "Incident API returned 503 Service Unavailable".to_string(),
        ))
    }
}

/// Reader that stalls before answering, for overlap tests.
pub(crate) struct SlowReader {
    pub delay_ms: u64,
}

#[async_trait::async_trait]
impl SourceReader for SlowReader {
    fn source_type(&self) -> SourceType {
        SourceType::Document
    }

    fn describe(&self) -> String {
        "slow".to_string()
    }

    async fn read(&self) -> RecallResult<SourceBatch> {
        tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        Ok(SourceBatch {
            source_type: SourceType::Document,
            units: vec![RawUnit {
                text: "slow page".to_string(),
                provenance: Provenance::Document {
                    file: "slow.md".to_string(),
                    page: 1,
                    chunk: 0,
                },
                created_at: None,
            }],
            complete: true,
        })
    }
}

pub(crate) fn incident_unit(number: &str, text: &str) -> RawUnit {
    RawUnit {
        text: text.to_string(),
        provenance: Provenance::Incident {
            number: number.to_string(),
        },
        created_at: None,
    }
}

pub(crate) fn audit_unit(row_id: i64, text: &str) -> RawUnit {
    RawUnit {
        text: text.to_string(),
        provenance: Provenance::AuditRow { row_id },
        created_at: None,
    }
}

pub(crate) fn document_unit(text: &str) -> RawUnit {
    RawUnit {
        text: text.to_string(),
        provenance: Provenance::Document {
            file: "doc.md".to_string(),
            page: 1,
            chunk: 0,
        },
        created_at: None,
    }
}
