//! Audit-log database reader.
//!
//! Reads the newest rows of the `audit_log` table from a SQLite database and
//! composes one text unit per row. Hitting the fetch limit marks the batch
//! incomplete instead of failing: partial audit data is still worth indexing.
//!
//! Expected schema:
//! `audit_log(id, logged_at, user_name, action, item_key, result)`

use crate::sources::{parse_timestamp, SourceReader};
use crate::types::{Provenance, RawUnit, SourceBatch, SourceType};
use recall_core::{RecallError, RecallResult};
use rusqlite::{params, Connection, OpenFlags};
use std::path::PathBuf;

/// Reader for the audit-log database.
pub struct AuditLogReader {
    db_path: PathBuf,
    fetch_limit: usize,
}

struct AuditRow {
    id: i64,
    logged_at: Option<String>,
    user_name: Option<String>,
    action: Option<String>,
    item_key: Option<String>,
    result: Option<String>,
}

impl AuditRow {
    /// One searchable line per row, in the `key:value | ...` shape the
    /// audit trail is usually grepped by.
    fn to_text(&self) -> String {
        format!(
            "{} | user:{} | action:{} | item:{} | result:{}",
            self.logged_at.as_deref().unwrap_or("-"),
            self.user_name.as_deref().unwrap_or("-"),
            self.action.as_deref().unwrap_or("-"),
            self.item_key.as_deref().unwrap_or("-"),
            self.result.as_deref().unwrap_or("-"),
        )
    }
}

impl AuditLogReader {
    pub fn new(db_path: impl Into<PathBuf>, fetch_limit: usize) -> Self {
        Self {
            db_path: db_path.into(),
            fetch_limit,
        }
    }
}

#[async_trait::async_trait]
impl SourceReader for AuditLogReader {
    fn source_type(&self) -> SourceType {
        SourceType::AuditLog
    }

    fn describe(&self) -> String {
        self.db_path.display().to_string()
    }

    async fn read(&self) -> RecallResult<SourceBatch> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            RecallError::Query(format!(
                "Failed to open audit database {:?}: {}",
                self.db_path, e
            ))
        })?;

        let mut stmt = conn
            .prepare(
                "SELECT id, logged_at, user_name, action, item_key, result \
                 FROM audit_log ORDER BY id DESC LIMIT ?1",
            )
            .map_err(|e| RecallError::Query(format!("Failed to prepare audit query: {}", e)))?;

        let rows = stmt
            .query_map(params![self.fetch_limit as i64], |row| {
                Ok(AuditRow {
                    id: row.get(0)?,
                    logged_at: row.get(1)?,
                    user_name: row.get(2)?,
                    action: row.get(3)?,
                    item_key: row.get(4)?,
                    result: row.get(5)?,
                })
            })
            .map_err(|e| RecallError::Query(format!("Failed to query audit log: {}", e)))?;

        let mut units = Vec::new();
        for row in rows {
            let row =
                row.map_err(|e| RecallError::Query(format!("Failed to read audit row: {}", e)))?;

            units.push(RawUnit {
                text: row.to_text(),
                provenance: Provenance::AuditRow { row_id: row.id },
                created_at: row.logged_at.as_deref().and_then(parse_timestamp),
            });
        }

        // a full page means the limit may have cut the result set short
        let complete = units.len() < self.fetch_limit;
        if !complete {
            tracing::warn!(
                "Audit fetch returned {} rows, the configured limit; result set may be truncated",
                units.len()
            );
        }

        tracing::debug!(
            "Read {} audit rows from {:?} (complete: {})",
            units.len(),
            self.db_path,
            complete
        );

        Ok(SourceBatch {
            source_type: SourceType::AuditLog,
            units,
            complete,
        })
    }
}
