//! Spreadsheet Export
//!
//! Writes the cleaned text of each successful OCR job to its own `.xlsx`
//! workbook and resolves download names back to files.
//!
//! Exports are named `<uuid>.xlsx`; anything else is never served. An
//! optional sweeper deletes exports older than a TTL.

mod sweeper;

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use uuid::Uuid;

pub use sweeper::spawn_sweeper;

/// Header of the single data column
pub const CONTENT_HEADER: &str = "content";

/// Excel refuses longer cell strings
const MAX_CELL_CHARS: usize = 32_767;

const EXTENSION: &str = "xlsx";

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export task failed: {0}")]
    Task(String),
}

/// A generated workbook
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub name: String,
    pub path: PathBuf,
}

impl ExportArtifact {
    /// Relative URL the client downloads the workbook from
    pub fn download_url(&self) -> String {
        format!("/download/{}", self.name)
    }
}

/// Spreadsheet writer rooted at the export directory
#[derive(Debug, Clone)]
pub struct SpreadsheetExporter {
    dir: PathBuf,
}

impl SpreadsheetExporter {
    /// Create an exporter, creating `dir` if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `text` to a new uniquely named workbook
    pub async fn export(&self, text: &str) -> Result<ExportArtifact, ExportError> {
        let name = format!("{}.{}", Uuid::new_v4(), EXTENSION);
        let path = self.dir.join(&name);

        let target = path.clone();
        let content = text.to_string();
        tokio::task::spawn_blocking(move || write_workbook(&target, &content))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))??;

        tracing::debug!(name = %name, chars = text.chars().count(), "Spreadsheet written");

        Ok(ExportArtifact { name, path })
    }

    /// Map a download name to an existing export.
    ///
    /// Only plain `<uuid>.xlsx` names are accepted, which also rules out
    /// path traversal.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_export_name(name) {
            return None;
        }
        let path = self.dir.join(name);
        path.is_file().then_some(path)
    }
}

fn is_export_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => ext == EXTENSION && Uuid::parse_str(stem).is_ok(),
        None => false,
    }
}

fn write_workbook(path: &Path, text: &str) -> Result<(), ExportError> {
    let cell: String = text.chars().take(MAX_CELL_CHARS).collect();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_column_width(0, 80)?;
    worksheet.write_string(0, 0, CONTENT_HEADER)?;
    worksheet.write_string(1, 0, &cell)?;
    workbook.save(path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_writes_workbook() {
        let dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path()).unwrap();

        let artifact = exporter.export("Họ và tên: NGUYỄN VĂN A").await.unwrap();

        assert!(artifact.name.ends_with(".xlsx"));
        assert_eq!(artifact.download_url(), format!("/download/{}", artifact.name));
        let bytes = std::fs::read(&artifact.path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_each_export_gets_a_new_name() {
        let dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path()).unwrap();

        let a = exporter.export("a").await.unwrap();
        let b = exporter.export("a").await.unwrap();

        assert_ne!(a.name, b.name);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_text_is_truncated() {
        let dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path()).unwrap();

        let long = "x".repeat(MAX_CELL_CHARS + 100);
        assert!(exporter.export(&long).await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_existing_export() {
        let dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path()).unwrap();
        let artifact = exporter.export("text").await.unwrap();

        assert_eq!(exporter.resolve(&artifact.name), Some(artifact.path));
    }

    #[test]
    fn test_resolve_rejects_unknown_and_unsafe_names() {
        let dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.xlsx"), b"PK").unwrap();

        assert!(exporter.resolve(&format!("{}.xlsx", Uuid::new_v4())).is_none());
        assert!(exporter.resolve("notes.xlsx").is_none());
        assert!(exporter.resolve("../Cargo.toml").is_none());
        assert!(exporter.resolve("..").is_none());
        assert!(exporter.resolve("").is_none());
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let exporter = SpreadsheetExporter::new(&nested).unwrap();
        assert!(exporter.dir().is_dir());
    }
}
