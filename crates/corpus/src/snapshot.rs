//! SQLite snapshot of an index generation.
//!
//! Lets the CLI rebuild in one process and query in another. The snapshot
//! records the embedding fingerprint (provider, model, dimensions) so a
//! query with a different embedding configuration fails loudly instead of
//! searching with mismatched vectors. `save` writes to a temp file and
//! renames it over the target, so a crash never leaves a half-written
//! snapshot behind.

use crate::types::{IndexedEntry, Provenance, SourceRecord};
use chrono::{DateTime, Utc};
use recall_core::config::EmbeddingSettings;
use recall_core::{RecallError, RecallResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// Embedding fingerprint and build time stored alongside the entries.
#[derive(Debug, Clone)]
pub struct SnapshotMeta {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub built_at: DateTime<Utc>,
}

impl SnapshotMeta {
    pub fn new(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            built_at: Utc::now(),
        }
    }

    /// Fail when the snapshot was built with a different embedding setup.
    pub fn ensure_compatible(&self, settings: &EmbeddingSettings) -> RecallResult<()> {
        if self.provider != settings.provider
            || self.model != settings.model
            || self.dimensions != settings.dimensions
        {
            return Err(RecallError::Index(format!(
                "Index snapshot was built with embedding {}/{}/{}d but the configuration says \
                 {}/{}/{}d; run `recall rebuild`",
                self.provider,
                self.model,
                self.dimensions,
                settings.provider,
                settings.model,
                settings.dimensions
            )));
        }
        Ok(())
    }
}

/// Persist a generation to `path`, replacing any previous snapshot.
pub fn save(path: &Path, entries: &[IndexedEntry], meta: &SnapshotMeta) -> RecallResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RecallError::Index(format!("Failed to create snapshot directory: {}", e))
        })?;
    }

    let tmp_path = path.with_extension("db.tmp");
    if tmp_path.exists() {
        std::fs::remove_file(&tmp_path)
            .map_err(|e| RecallError::Index(format!("Failed to clear stale temp file: {}", e)))?;
    }

    let mut conn = Connection::open(&tmp_path)
        .map_err(|e| RecallError::Index(format!("Failed to create snapshot: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_type TEXT NOT NULL,
            provenance TEXT NOT NULL,
            merged_from TEXT,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            embedding BLOB NOT NULL
        );
        "#,
    )
    .map_err(|e| RecallError::Index(format!("Failed to create snapshot tables: {}", e)))?;

    let tx = conn
        .transaction()
        .map_err(|e| RecallError::Index(format!("Failed to start snapshot write: {}", e)))?;

    for (key, value) in [
        ("provider", meta.provider.clone()),
        ("model", meta.model.clone()),
        ("dimensions", meta.dimensions.to_string()),
        ("built_at", meta.built_at.to_rfc3339()),
    ] {
        tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| RecallError::Index(format!("Failed to write snapshot meta: {}", e)))?;
    }

    for entry in entries {
        let provenance = serde_json::to_string(&entry.record.provenance)?;
        let merged_from = if entry.record.merged_from.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&entry.record.merged_from)?)
        };

        tx.execute(
            "INSERT INTO entries (source_type, provenance, merged_from, text, created_at, embedding) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.record.source_type().as_str(),
                provenance,
                merged_from,
                entry.record.text,
                entry.record.created_at.to_rfc3339(),
                embedding_to_bytes(&entry.embedding),
            ],
        )
        .map_err(|e| RecallError::Index(format!("Failed to write snapshot entry: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| RecallError::Index(format!("Failed to commit snapshot: {}", e)))?;
    drop(conn);

    std::fs::rename(&tmp_path, path)
        .map_err(|e| RecallError::Index(format!("Failed to move snapshot into place: {}", e)))?;

    tracing::info!("Saved index snapshot with {} entries to {:?}", entries.len(), path);
    Ok(())
}

/// Load a snapshot, returning the entries in insertion order and the meta.
pub fn load(path: &Path) -> RecallResult<(Vec<IndexedEntry>, SnapshotMeta)> {
    if !path.exists() {
        return Err(RecallError::Index(format!(
            "No index snapshot at {:?}; run `recall rebuild` first",
            path
        )));
    }

    let conn = Connection::open(path)
        .map_err(|e| RecallError::Index(format!("Failed to open snapshot: {}", e)))?;

    let meta = load_meta(&conn)?;

    let mut stmt = conn
        .prepare(
            "SELECT provenance, merged_from, text, created_at, embedding \
             FROM entries ORDER BY id ASC",
        )
        .map_err(|e| RecallError::Index(format!("Failed to read snapshot: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })
        .map_err(|e| RecallError::Index(format!("Failed to read snapshot entries: {}", e)))?;

    let mut entries = Vec::new();
    for row in rows {
        let (provenance, merged_from, text, created_at, embedding) =
            row.map_err(|e| RecallError::Index(format!("Failed to read snapshot row: {}", e)))?;

        let provenance: Provenance = serde_json::from_str(&provenance)
            .map_err(|e| RecallError::Index(format!("Corrupt snapshot provenance: {}", e)))?;

        let merged_from: Vec<Provenance> = match merged_from {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| RecallError::Index(format!("Corrupt snapshot provenance: {}", e)))?,
            None => Vec::new(),
        };

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| RecallError::Index(format!("Corrupt snapshot timestamp: {}", e)))?
            .with_timezone(&Utc);

        entries.push(IndexedEntry {
            record: SourceRecord {
                text,
                provenance,
                merged_from,
                created_at,
            },
            embedding: bytes_to_embedding(&embedding)?,
        });
    }

    tracing::debug!("Loaded index snapshot with {} entries from {:?}", entries.len(), path);
    Ok((entries, meta))
}

fn load_meta(conn: &Connection) -> RecallResult<SnapshotMeta> {
    let get = |key: &str| -> RecallResult<String> {
        conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .map_err(|e| RecallError::Index(format!("Corrupt snapshot meta ({}): {}", key, e)))
    };

    let dimensions = get("dimensions")?
        .parse::<usize>()
        .map_err(|e| RecallError::Index(format!("Corrupt snapshot meta (dimensions): {}", e)))?;

    let built_at = DateTime::parse_from_rfc3339(&get("built_at")?)
        .map_err(|e| RecallError::Index(format!("Corrupt snapshot meta (built_at): {}", e)))?
        .with_timezone(&Utc);

    Ok(SnapshotMeta {
        provider: get("provider")?,
        model: get("model")?,
        dimensions,
        built_at,
    })
}

/// Convert an embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> RecallResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(RecallError::Index(
            "Corrupt snapshot embedding: invalid byte length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_entries() -> Vec<IndexedEntry> {
        vec![
            IndexedEntry {
                record: SourceRecord {
                    text: "PO12345 approved by manager".to_string(),
                    provenance: Provenance::Document {
                        file: "doc.md".to_string(),
                        page: 1,
                        chunk: 0,
                    },
                    merged_from: Vec::new(),
                    created_at: Utc::now(),
                },
                embedding: vec![0.5, -0.25, 0.0],
            },
            IndexedEntry {
                record: SourceRecord {
                    text: "approved PO12345".to_string(),
                    provenance: Provenance::AuditRow { row_id: 4821 },
                    merged_from: vec![Provenance::Incident {
                        number: "INC0045231".to_string(),
                    }],
                    created_at: Utc::now(),
                },
                embedding: vec![1.0, 0.0, 0.125],
            },
        ]
    }

    #[test]
    fn test_save_and_load_preserves_order_and_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.db");

        let entries = sample_entries();
        let meta = SnapshotMeta::new(&EmbeddingSettings::default());
        save(&path, &entries, &meta).unwrap();

        let (loaded, loaded_meta) = load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].record.text, "PO12345 approved by manager");
        assert_eq!(loaded[1].record.provenance, Provenance::AuditRow { row_id: 4821 });
        assert_eq!(loaded[1].record.merged_from.len(), 1);
        assert_eq!(loaded[1].embedding, vec![1.0, 0.0, 0.125]);
        assert_eq!(loaded_meta.provider, "hash");
        assert_eq!(loaded_meta.dimensions, 384);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.db");
        let meta = SnapshotMeta::new(&EmbeddingSettings::default());

        save(&path, &sample_entries(), &meta).unwrap();
        save(&path, &sample_entries()[..1], &meta).unwrap();

        let (loaded, _) = load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_missing_snapshot_is_an_index_error() {
        let temp = TempDir::new().unwrap();
        let result = load(&temp.path().join("index.db"));
        assert!(matches!(result, Err(RecallError::Index(_))));
    }

    #[test]
    fn test_fingerprint_mismatch() {
        let meta = SnapshotMeta::new(&EmbeddingSettings::default());

        let mut other = EmbeddingSettings::default();
        other.model = "nomic-embed-text".to_string();

        assert!(meta.ensure_compatible(&EmbeddingSettings::default()).is_ok());
        assert!(matches!(
            meta.ensure_compatible(&other),
            Err(RecallError::Index(_))
        ));
    }
}
