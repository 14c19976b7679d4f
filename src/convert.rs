//! Parse entry points: document bytes in, [`ParsedBook`] out.
//!
//! ## Which markup gets segmented?
//!
//! In [`PipelineMode::Normalized`] (the default) the converter's markup is
//! first projected onto the page/element model and serialised back; the
//! segmenter then runs on that canonical markup, so chapters only ever see
//! `h1`/`h2`/`p`. [`PipelineMode::Direct`] segments the converter's markup
//! as-is and keeps its styling and structure in `html_content`.
//!
//! Parses are independent: nothing is shared between runs except what the
//! caller puts in [`ParseConfig`]. When parses overlap (a user picks a second
//! file before the first finishes), use a [`ParseTracker`] to keep only the
//! latest result.

use crate::config::{ParseConfig, PipelineMode};
use crate::converter::MarkupConverter;
use crate::error::BookError;
use crate::ids::default_generator;
use crate::output::ParsedBook;
use crate::pipeline::input::{self, DocumentInput};
use crate::pipeline::{normalize, segment};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Parse an in-memory document.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`     — the uploaded document and its file name
/// * `converter` — engine that turns the document into markup
/// * `config`    — parse configuration
///
/// # Errors
/// - [`BookError::DocumentTooLarge`] before conversion is attempted
/// - [`BookError::ConversionFailed`] when the converter rejects the document
/// - [`BookError::Markup`] when the converter's markup cannot be read
pub async fn parse_document(
    input: &DocumentInput,
    converter: &dyn MarkupConverter,
    config: &ParseConfig,
) -> Result<ParsedBook, BookError> {
    let result = run_document(input, converter, config).await;
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_parse_error(&e.to_string());
    }
    result
}

/// Read a document from disk and parse it.
pub async fn parse_file(
    path: impl AsRef<Path>,
    converter: &dyn MarkupConverter,
    config: &ParseConfig,
) -> Result<ParsedBook, BookError> {
    let input = match input::read_document(path).await {
        Ok(input) => input,
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_parse_error(&e.to_string());
            }
            return Err(e);
        }
    };
    parse_document(&input, converter, config).await
}

/// Synchronous wrapper around [`parse_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn parse_document_sync(
    input: &DocumentInput,
    converter: &dyn MarkupConverter,
    config: &ParseConfig,
) -> Result<ParsedBook, BookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BookError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(parse_document(input, converter, config))
}

/// Parse markup that is already converted.
///
/// Skips the converter. `config.title`, if set, wins over `title`.
pub fn parse_markup(
    markup: &str,
    title: &str,
    config: &ParseConfig,
) -> Result<ParsedBook, BookError> {
    let result = check_size(markup.len(), config).and_then(|()| {
        let title = config.title.as_deref().unwrap_or(title);
        assemble(markup, title, config)
    });
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_parse_error(&e.to_string());
    }
    result
}

// ── Supersession ─────────────────────────────────────────────────────────

/// Handle for one parse started through a [`ParseTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParseTicket(u64);

/// Last-write-wins bookkeeping for overlapping parses.
///
/// Call [`begin`](Self::begin) when a parse starts and check
/// [`is_current`](Self::is_current) before applying its result. Earlier
/// parses are not cancelled; their results are simply discarded.
#[derive(Debug, Default)]
pub struct ParseTracker {
    latest: AtomicU64,
}

impl ParseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a parse, superseding every earlier ticket.
    pub fn begin(&self) -> ParseTicket {
        ParseTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the most recently started parse.
    pub fn is_current(&self, ticket: ParseTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_document(
    input: &DocumentInput,
    converter: &dyn MarkupConverter,
    config: &ParseConfig,
) -> Result<ParsedBook, BookError> {
    info!("Starting parse: {}", input.file_name);

    // ── Step 1: Check size ───────────────────────────────────────────────
    check_size(input.bytes.len(), config)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_parse_start(&input.file_name, input.bytes.len());
    }

    // ── Step 2: Convert to markup ────────────────────────────────────────
    let convert_start = Instant::now();
    let converted = converter
        .convert(&input.bytes, &config.converter_options)
        .await
        .map_err(|e| {
            warn!("{} failed on {}: {}", converter.name(), input.file_name, e);
            BookError::conversion(e.to_string())
        })?;
    for warning in &converted.warnings {
        debug!("{}: {}", converter.name(), warning);
    }
    debug!(
        "{} produced {} bytes of markup in {}ms",
        converter.name(),
        converted.markup.len(),
        convert_start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_markup_ready(converted.markup.len());
    }

    // ── Step 3: Normalize and segment ────────────────────────────────────
    let title = config.title.clone().unwrap_or_else(|| input.title());
    assemble(&converted.markup, &title, config)
}

fn check_size(size: usize, config: &ParseConfig) -> Result<(), BookError> {
    if size > config.max_document_bytes {
        return Err(BookError::DocumentTooLarge {
            size,
            limit: config.max_document_bytes,
        });
    }
    Ok(())
}

fn assemble(markup: &str, title: &str, config: &ParseConfig) -> Result<ParsedBook, BookError> {
    let start = Instant::now();
    let ids = config.id_generator.clone().unwrap_or_else(default_generator);
    debug!("Assembling {:?} parse of {} bytes", config.mode, markup.len());

    let (raw_html, chapters, model) = match config.mode {
        PipelineMode::Normalized => {
            let model = normalize::to_model(markup, title, ids.as_ref())?;
            if let Some(ref cb) = config.progress_callback {
                cb.on_model_ready(model.elements().count());
            }
            let canonical = normalize::to_markup(&model);
            let chapters = segment::segment(&canonical)?;
            (canonical, chapters, config.include_model.then_some(model))
        }
        PipelineMode::Direct => {
            let chapters = segment::segment(markup)?;
            let model = if config.include_model {
                let model = normalize::to_model(markup, title, ids.as_ref())?;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_model_ready(model.elements().count());
                }
                Some(model)
            } else {
                None
            };
            (markup.to_string(), chapters, model)
        }
    };

    let book = ParsedBook {
        title: title.to_string(),
        chapters,
        raw_html,
        json_data: model,
    };

    info!(
        "Parse complete: \"{}\", {} chapters, {} sections, {}ms",
        book.display_title(),
        book.chapters.len(),
        book.section_count(),
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_parse_complete(book.chapters.len(), book.section_count());
    }
    Ok(book)
}
