//! # bookforge
//!
//! Turn a converted word-processor document into a book: a title, ordered
//! chapters with their sections, and a normalized page/element model that
//! can be edited or exported.
//!
//! ## Why this crate?
//!
//! Document converters produce one long flat run of markup. Books need
//! structure. This crate finds it from the headings alone: `h1` starts a
//! chapter, `h2` starts a section, and a document with no headings still
//! comes out as one readable chapter. The same markup can be projected onto
//! a flat list of styled, positioned elements for an editor canvas, and
//! serialised back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DOCX bytes
//!  │
//!  ├─ 1. Input      read the file, title = file name without .docx
//!  ├─ 2. Convert    external converter → markup (images inlined)
//!  ├─ 3. Normalize  markup → page/element model → canonical markup
//!  ├─ 4. Segment    headings → chapters + sections
//!  └─ 5. Export     PDF via injected renderer, DOCX passthrough
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bookforge::{parse_file, MarkupPassthrough, ParseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ParseConfig::default();
//!     let book = parse_file("manuscript.html", &MarkupPassthrough, &config).await?;
//!     print!("{}", book.outline());
//!     Ok(())
//! }
//! ```
//!
//! Markup that is already in memory can skip the converter:
//!
//! ```rust
//! use bookforge::{parse_markup, ParseConfig};
//!
//! let book = parse_markup(
//!     "<h1>Intro</h1><p>Hello</p><h2>Setup</h2>",
//!     "Field Notes",
//!     &ParseConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(book.chapters[0].title, "Intro");
//! assert_eq!(book.chapters[0].sections[0].id, "s1-1");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bookforge` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! bookforge = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod converter;
pub mod error;
pub mod export;
pub mod ids;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ParseConfig, ParseConfigBuilder, PipelineMode};
pub use convert::{
    parse_document, parse_document_sync, parse_file, parse_markup, ParseTicket, ParseTracker,
};
pub use converter::{
    data_uri, ConvertedMarkup, ConverterError, ConverterOptions, MarkupConverter,
    MarkupPassthrough, STYLE_MAP,
};
pub use error::{BookError, ExportError, MarkupError};
pub use export::{
    export, print_document, write_artifact, ExportArtifact, ExportFormat, PdfOptions, PdfRenderer,
    RenderError,
};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use model::{BookModel, ElementKind, ElementStyles, Page, PageElement, Position};
pub use output::{Chapter, ParsedBook, Section, UNTITLED_BOOK};
pub use pipeline::input::{read_document, DocumentInput};
pub use pipeline::normalize::{to_markup, to_model};
pub use pipeline::segment::segment;
pub use progress::{NoopProgressCallback, ParseProgressCallback, ProgressCallback};
