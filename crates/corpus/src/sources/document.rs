//! Static documentation reader.
//!
//! Reads a single file or a directory of files, splitting each file into
//! pages on form-feed characters. A file without page breaks is one page.

use crate::sources::SourceReader;
use crate::types::{Provenance, RawUnit, SourceBatch, SourceType};
use recall_core::{RecallError, RecallResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Reader for local documentation files.
pub struct DocumentReader {
    path: PathBuf,
}

impl DocumentReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_file(&self, path: &Path, units: &mut Vec<RawUnit>) -> RecallResult<()> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RecallError::Read(format!("Failed to read document {:?}: {}", path, e))
        })?;

        let file = path.display().to_string();

        // pages split on form feed; page numbers are 1-based
        for (i, page) in text.split('\u{0C}').enumerate() {
            let page_text = page.trim();
            if page_text.is_empty() {
                continue;
            }

            units.push(RawUnit {
                text: page_text.to_string(),
                provenance: Provenance::Document {
                    file: file.clone(),
                    page: (i + 1) as u32,
                    chunk: 0,
                },
                created_at: None,
            });
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl SourceReader for DocumentReader {
    fn source_type(&self) -> SourceType {
        SourceType::Document
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> RecallResult<SourceBatch> {
        if !self.path.exists() {
            return Err(RecallError::Read(format!(
                "Document source not found: {:?}",
                self.path
            )));
        }

        let mut units = Vec::new();

        if self.path.is_file() {
            self.read_file(&self.path, &mut units)?;
        } else {
            // fixed traversal order keeps ingestion deterministic
            let mut files: Vec<PathBuf> = WalkDir::new(&self.path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.path().to_path_buf())
                .collect();
            files.sort();

            for file in files {
                self.read_file(&file, &mut units)?;
            }
        }

        tracing::debug!("Read {} document pages from {:?}", units.len(), self.path);

        Ok(SourceBatch {
            source_type: SourceType::Document,
            units,
            complete: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let reader = DocumentReader::new("/nonexistent/runbook.md");
        let result = reader.read().await;
        assert!(matches!(result, Err(RecallError::Read(_))));
    }

    #[tokio::test]
    async fn test_single_file_single_page() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.md");
        std::fs::write(&path, "PO12345 approved by manager").unwrap();

        let batch = DocumentReader::new(&path).read().await.unwrap();
        assert!(batch.complete);
        assert_eq!(batch.units.len(), 1);
        assert_eq!(batch.units[0].text, "PO12345 approved by manager");
        assert_eq!(
            batch.units[0].provenance,
            Provenance::Document {
                file: path.display().to_string(),
                page: 1,
                chunk: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_form_feed_pages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        std::fs::write(&path, "page one\u{0C}page two\u{0C}\u{0C}page four").unwrap();

        let batch = DocumentReader::new(&path).read().await.unwrap();

        // the empty third page is dropped, numbering is preserved
        assert_eq!(batch.units.len(), 3);
        let pages: Vec<u32> = batch
            .units
            .iter()
            .map(|u| match &u.provenance {
                Provenance::Document { page, .. } => *page,
                other => panic!("unexpected provenance {:?}", other),
            })
            .collect();
        assert_eq!(pages, vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_directory_is_walked_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.md"), "second").unwrap();
        std::fs::write(temp.path().join("a.md"), "first").unwrap();

        let batch = DocumentReader::new(temp.path()).read().await.unwrap();
        assert_eq!(batch.units.len(), 2);
        assert_eq!(batch.units[0].text, "first");
        assert_eq!(batch.units[1].text, "second");
    }
}
