//! Error types for the bookforge library.
//!
//! Three error types mirror three distinct failure surfaces:
//!
//! * [`BookError`] — **Fatal**: the document cannot be turned into a book at
//!   all (file unreadable, the external converter rejected the bytes, bad
//!   configuration). Returned as `Err(BookError)` from the `parse*` entry
//!   points. No partial result is ever returned alongside it.
//!
//! * [`MarkupError`] — the markup reader could not tokenize its input.
//!   Converter-produced markup never triggers this; it exists so that
//!   hand-fed markup fails on the parsing call instead of panicking.
//!
//! * [`ExportError`] — an export to a final file format failed. Kept apart
//!   from [`BookError`] because export runs later, against an already parsed
//!   book, and the caller usually wants to keep the book and let the user pick
//!   another format.
//!
//! Producing "no chapters" is not an error: the segmenter falls back to a
//! single `Content` chapter.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the parse pipeline.
#[derive(Debug, Error)]
pub enum BookError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading the document bytes failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is larger than [`crate::config::ParseConfig::max_document_bytes`].
    #[error("Document is {size} bytes, which exceeds the {limit}-byte limit")]
    DocumentTooLarge { size: usize, limit: usize },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The external document-to-markup converter rejected the input.
    ///
    /// The display text is deliberately generic; `reason` carries the
    /// converter's own message for logs.
    #[error("Failed to parse the document. Please ensure it's a valid DOCX file.")]
    ConversionFailed { reason: String },

    /// The markup handed to the segmenter or normalizer could not be read.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The normalized model could not be serialised.
    #[error("Failed to serialise book model: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookError {
    /// Shorthand for [`BookError::ConversionFailed`].
    pub fn conversion(reason: impl Into<String>) -> Self {
        BookError::ConversionFailed {
            reason: reason.into(),
        }
    }
}

/// The markup reader gave up on its input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Malformed markup at byte {offset}: {reason}")]
pub struct MarkupError {
    /// Byte offset into the markup string where reading stopped.
    pub offset: usize,
    /// Reader's description of the problem.
    pub reason: String,
}

/// Errors from the export step.
#[derive(Debug, Error)]
pub enum ExportError {
    /// DOCX export re-delivers the uploaded file, which the caller did not supply.
    #[error("No DOCX file available")]
    NoOriginalDocument,

    /// PDF export needs the book's markup, which is empty.
    #[error("No content available for PDF generation")]
    NoContent,

    /// The format is listed but has no exporter yet.
    #[error("{format} export is currently under development. Please try PDF or DOCX.")]
    NotYetSupported { format: &'static str },

    /// The external PDF renderer failed.
    #[error("PDF rendering failed: {0}")]
    RenderFailed(String),

    /// Could not create or write the exported file.
    #[error("Failed to write export file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
