//! The external document-to-markup converter, seen from this side.
//!
//! Turning word-processor bytes into markup is not done here. A
//! [`MarkupConverter`] implementation wraps whatever engine the host has; the
//! pipeline only awaits it and hands the markup on. Converters are expected
//! to honour [`ConverterOptions`]: map the heading paragraph styles onto
//! `h1`/`h2`/`h3`, drop empty paragraphs, and inline images as base64
//! `data:` URIs (see [`data_uri`]) so the markup is self-contained.
//!
//! [`MarkupPassthrough`] is the trivial converter for input that is already
//! markup.

use async_trait::async_trait;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

/// Error type converters report. Its text is logged, never shown as-is.
pub type ConverterError = Box<dyn std::error::Error + Send + Sync>;

/// Paragraph and character style mapping every converter must apply.
pub const STYLE_MAP: &[&str] = &[
    "p[style-name='Heading 1'] => h1:fresh",
    "p[style-name='Heading 2'] => h2:fresh",
    "p[style-name='Heading 3'] => h3:fresh",
    "p[style-name='Title'] => h1.title:fresh",
    "b => strong",
    "i => em",
    "u => u",
];

/// Options handed to the converter on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Style mapping rules, applied before the converter's own defaults.
    pub style_map: Vec<String>,
    /// Also apply the converter's built-in style mapping.
    pub include_default_style_map: bool,
    /// Keep paragraphs with no content.
    pub preserve_empty_paragraphs: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            style_map: STYLE_MAP.iter().map(|s| s.to_string()).collect(),
            include_default_style_map: true,
            preserve_empty_paragraphs: false,
        }
    }
}

/// What a converter returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedMarkup {
    /// Markup fragment (no `<html>`/`<body>` wrapper), images inlined.
    pub markup: String,
    /// Non-fatal notes from the converter (unrecognised styles etc.).
    pub warnings: Vec<String>,
}

impl ConvertedMarkup {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            warnings: Vec::new(),
        }
    }
}

/// A document-bytes-to-markup converter.
///
/// Implementations must be `Send + Sync`; two parses may run at once and
/// share one converter. A returned error ends the parse: there is no retry.
#[async_trait]
pub trait MarkupConverter: Send + Sync {
    /// Convert a whole document.
    async fn convert(
        &self,
        document: &[u8],
        options: &ConverterOptions,
    ) -> Result<ConvertedMarkup, ConverterError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "converter"
    }
}

/// Build a `data:` URI for an embedded image.
pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{content_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

static RE_EMPTY_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<p(?:\s[^>]*)?>(?:\s|&nbsp;)*</p>").unwrap());

/// Treats the document bytes as UTF-8 markup.
///
/// Applies the one option that makes sense for markup input: empty
/// paragraphs are removed unless `preserve_empty_paragraphs` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupPassthrough;

#[async_trait]
impl MarkupConverter for MarkupPassthrough {
    async fn convert(
        &self,
        document: &[u8],
        options: &ConverterOptions,
    ) -> Result<ConvertedMarkup, ConverterError> {
        let markup = std::str::from_utf8(document)?;
        let markup = if options.preserve_empty_paragraphs {
            markup.to_string()
        } else {
            RE_EMPTY_PARAGRAPH.replace_all(markup, "").into_owned()
        };
        Ok(ConvertedMarkup::new(markup))
    }

    fn name(&self) -> &str {
        "markup-passthrough"
    }
}
