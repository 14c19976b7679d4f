//! Configuration types for a parse.
//!
//! Everything a caller can tune lives in [`ParseConfig`], built via its
//! [`ParseConfigBuilder`]. The layout and style constants of the normalized
//! model are deliberately absent: they are literals in [`crate::model`].

use crate::converter::ConverterOptions;
use crate::error::BookError;
use crate::ids::IdGenerator;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default cap on document size: 50 MiB.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;

/// Which markup the segmenter sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineMode {
    /// Converter markup → normalized model → re-serialised markup → segmenter.
    ///
    /// Chapters and `raw_html` come from the canonical markup, so source
    /// styling and non-text structure are flattened to `h1`/`h2`/`p`. (default)
    #[default]
    Normalized,
    /// The segmenter runs on the converter markup verbatim.
    Direct,
}

/// Configuration for a document parse.
///
/// Built via [`ParseConfig::builder()`] or using [`ParseConfig::default()`].
///
/// # Example
/// ```rust
/// use bookforge::{ParseConfig, PipelineMode};
///
/// let config = ParseConfig::builder()
///     .mode(PipelineMode::Direct)
///     .title("Field Notes")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ParseConfig {
    /// Which markup is segmented. Default: [`PipelineMode::Normalized`].
    pub mode: PipelineMode,

    /// Attach the normalized model to the result as `json_data`. Default: true.
    ///
    /// In [`PipelineMode::Normalized`] the model is built regardless; this
    /// only controls whether it is kept.
    pub include_model: bool,

    /// Book title. If None, derived from the file name.
    pub title: Option<String>,

    /// Options passed to the external converter.
    pub converter_options: ConverterOptions,

    /// Id generator for the normalized model. If None, random UUIDs.
    pub id_generator: Option<Arc<dyn IdGenerator>>,

    /// Stage-event callback.
    pub progress_callback: Option<ProgressCallback>,

    /// Largest document accepted, in bytes. Default: 50 MiB.
    pub max_document_bytes: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::default(),
            include_model: true,
            title: None,
            converter_options: ConverterOptions::default(),
            id_generator: None,
            progress_callback: None,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("mode", &self.mode)
            .field("include_model", &self.include_model)
            .field("title", &self.title)
            .field("converter_options", &self.converter_options)
            .field(
                "id_generator",
                &self.id_generator.as_ref().map(|_| "<dyn IdGenerator>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ParseProgressCallback>"),
            )
            .field("max_document_bytes", &self.max_document_bytes)
            .finish()
    }
}

impl ParseConfig {
    /// Create a new builder for `ParseConfig`.
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ParseConfig`].
#[derive(Debug)]
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn mode(mut self, mode: PipelineMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn include_model(mut self, v: bool) -> Self {
        self.config.include_model = v;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn converter_options(mut self, options: ConverterOptions) -> Self {
        self.config.converter_options = options;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.config.id_generator = Some(ids);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn max_document_bytes(mut self, n: usize) -> Self {
        self.config.max_document_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ParseConfig, BookError> {
        let c = &self.config;
        if c.max_document_bytes == 0 {
            return Err(BookError::InvalidConfig(
                "max_document_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
