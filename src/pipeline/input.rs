//! Input resolution: load a document from disk and name the book after it.
//!
//! The bytes are read whole; the external converter needs the complete
//! document anyway. File-system failures are mapped to specific
//! [`BookError`] variants so the caller can tell "wrong path" from "not
//! allowed" before any conversion is attempted.

use crate::error::BookError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document loaded into memory.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// File name as uploaded, e.g. `My Novel.docx`.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Book title derived from the file name.
    pub fn title(&self) -> String {
        title_from_file_name(&self.file_name)
    }
}

static RE_DOCX_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.docx$").unwrap());

/// Strip a trailing `.docx` (any case) from a file name.
pub fn title_from_file_name(file_name: &str) -> String {
    RE_DOCX_SUFFIX.replace(file_name, "").into_owned()
}

/// Read the document at `path`.
pub async fn read_document(path: impl AsRef<Path>) -> Result<DocumentInput, BookError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| map_io_error(path, e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(DocumentInput { file_name, bytes })
}

fn map_io_error(path: &Path, e: std::io::Error) -> BookError {
    let path = PathBuf::from(path);
    match e.kind() {
        std::io::ErrorKind::NotFound => BookError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => BookError::PermissionDenied { path },
        _ => BookError::ReadFailed { path, source: e },
    }
}
