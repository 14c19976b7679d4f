//! Export a parsed book to a downloadable file.
//!
//! Three formats are offered. None of them renders pages itself:
//!
//! - **DOCX** hands back the uploaded document unchanged.
//! - **PDF** assembles a print document around the book's markup and passes
//!   it to an injected [`PdfRenderer`] together with fixed [`PdfOptions`].
//! - **EPUB** is listed but not implemented.
//!
//! [`write_artifact`] saves the result atomically.

use crate::error::ExportError;
use crate::output::{ParsedBook, UNTITLED_BOOK};
use crate::pipeline::input::DocumentInput;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Error type PDF renderers report.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Image rule applied to every `<img>` in the print document.
const PRINT_IMAGE_STYLE: &str = "max-width: 100%; height: auto;";

// ── Formats ──────────────────────────────────────────────────────────────

/// A selectable export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Epub,
    Docx,
}

impl ExportFormat {
    /// All formats in presentation order.
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Epub, ExportFormat::Docx];

    /// Lowercase identifier, e.g. `pdf`.
    pub fn id(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Epub => "epub",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.id().eq_ignore_ascii_case(id.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Epub => "EPUB",
            ExportFormat::Docx => "DOCX",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "Best for printing and sharing",
            ExportFormat::Epub => "Perfect for e-readers",
            ExportFormat::Docx => "Editable Word document",
        }
    }

    /// File extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => ".pdf",
            ExportFormat::Epub => ".epub",
            ExportFormat::Docx => ".docx",
        }
    }

    /// Highlighted as the usual choice.
    pub fn is_popular(self) -> bool {
        matches!(self, ExportFormat::Pdf)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── PDF rendering interface ──────────────────────────────────────────────

/// Page orientation for the PDF renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Settings handed to the PDF renderer. Not configurable by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    /// Page margin, in `unit`.
    pub margin: f64,
    pub file_name: String,
    /// Raster format for the page snapshots.
    pub image_type: String,
    pub image_quality: f64,
    /// Snapshot scale factor.
    pub scale: f64,
    pub unit: String,
    /// Paper size name.
    pub format: String,
    pub orientation: Orientation,
}

impl PdfOptions {
    /// The fixed options for a book titled `title`.
    pub fn for_title(title: &str) -> Self {
        Self {
            margin: 10.0,
            file_name: format!("{title}.pdf"),
            image_type: "jpeg".into(),
            image_quality: 0.98,
            scale: 2.0,
            unit: "mm".into(),
            format: "a4".into(),
            orientation: Orientation::Portrait,
        }
    }
}

/// Turns a print document into PDF bytes.
///
/// Implementations must be `Send + Sync`. The document is a markup fragment
/// with inline styles only.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, document: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError>;
}

// ── Artifacts ────────────────────────────────────────────────────────────

/// An exported file, ready to save or send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Export `book` in `format`.
///
/// `original` is the uploaded document, needed only for DOCX. `renderer` is
/// used only for PDF.
pub async fn export(
    format: ExportFormat,
    book: &ParsedBook,
    original: Option<&DocumentInput>,
    renderer: &dyn PdfRenderer,
) -> Result<ExportArtifact, ExportError> {
    let title = book.display_title();
    let artifact = match format {
        ExportFormat::Docx => export_docx(title, original)?,
        ExportFormat::Pdf => export_pdf(title, &book.raw_html, renderer).await?,
        ExportFormat::Epub => {
            return Err(ExportError::NotYetSupported {
                format: ExportFormat::Epub.name(),
            })
        }
    };
    info!(
        "Exported {} as {} ({} bytes)",
        title,
        artifact.format,
        artifact.bytes.len()
    );
    Ok(artifact)
}

/// Re-deliver the uploaded document.
///
/// Keeps the original file name; falls back to `<title>.docx` when it is
/// blank.
pub fn export_docx(
    title: &str,
    original: Option<&DocumentInput>,
) -> Result<ExportArtifact, ExportError> {
    let original = original.ok_or(ExportError::NoOriginalDocument)?;
    let file_name = if original.file_name.is_empty() {
        format!("{title}.docx")
    } else {
        original.file_name.clone()
    };
    Ok(ExportArtifact {
        format: ExportFormat::Docx,
        file_name,
        bytes: original.bytes.clone(),
    })
}

/// Render the book's markup to PDF.
pub async fn export_pdf(
    title: &str,
    raw_html: &str,
    renderer: &dyn PdfRenderer,
) -> Result<ExportArtifact, ExportError> {
    if raw_html.is_empty() {
        return Err(ExportError::NoContent);
    }
    let document = print_document(title, raw_html);
    let options = PdfOptions::for_title(title);
    debug!("Rendering {} byte print document", document.len());
    let bytes = renderer
        .render(&document, &options)
        .await
        .map_err(|e| ExportError::RenderFailed(e.to_string()))?;
    Ok(ExportArtifact {
        format: ExportFormat::Pdf,
        file_name: options.file_name,
        bytes,
    })
}

static RE_IMG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img\b([^>]*?)(\s*/)?>").unwrap());

static RE_STYLE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\sstyle\s*=\s*"([^"]*)""#).unwrap());

/// The print document: a padded serif container with a centred title above
/// the book's markup.
pub fn print_document(title: &str, raw_html: &str) -> String {
    format!(
        "<div style=\"padding: 40px; font-family: serif; line-height: 1.6;\">\
         <h1 style=\"text-align: center; margin-bottom: 40px;\">{}</h1>{}</div>",
        html_escape::encode_text(title),
        fit_images(raw_html)
    )
}

/// Constrain every image to the page width.
fn fit_images(markup: &str) -> String {
    RE_IMG
        .replace_all(markup, |caps: &Captures| {
            let attrs = &caps[1];
            let close = caps.get(2).map_or("", |m| m.as_str());
            let attrs = match RE_STYLE_ATTR.captures(attrs) {
                Some(style) => {
                    let existing = style[1].trim().trim_end_matches(';');
                    let merged = if existing.is_empty() {
                        format!(" style=\"{PRINT_IMAGE_STYLE}\"")
                    } else {
                        format!(" style=\"{existing}; {PRINT_IMAGE_STYLE}\"")
                    };
                    RE_STYLE_ATTR
                        .replace(attrs, NoExpand(&merged))
                        .into_owned()
                }
                None => format!("{attrs} style=\"{PRINT_IMAGE_STYLE}\""),
            };
            format!("<img{attrs}{close}>")
        })
        .into_owned()
}

/// Save `artifact` under `dir`, returning the written path.
///
/// Only the final component of the artifact's file name is used, so a title
/// such as `../x` or `/abs/x` still lands inside `dir`. Uses atomic write
/// (temp file + rename) to prevent partial files.
pub async fn write_artifact(
    artifact: &ExportArtifact,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    let file_name = safe_file_name(&artifact.file_name, artifact.format);
    let path = dir.join(&file_name);
    let write_failed = |source: std::io::Error| ExportError::WriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;

    let tmp_path = dir.join(format!("{file_name}.tmp"));
    tokio::fs::write(&tmp_path, &artifact.bytes)
        .await
        .map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }

    debug!("Wrote {}", path.display());
    Ok(path)
}

/// The last normal path component of `name`, or `<untitled><ext>` when
/// there is none.
fn safe_file_name(name: &str, format: ExportFormat) -> String {
    match Path::new(name).components().next_back() {
        Some(Component::Normal(last)) => last.to_string_lossy().into_owned(),
        _ => format!("{UNTITLED_BOOK}{}", format.extension()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Chapter;
    use std::sync::Mutex;

    /// Records what it was asked to render and returns the document bytes.
    #[derive(Default)]
    struct EchoRenderer {
        seen: Mutex<Option<(String, PdfOptions)>>,
    }

    #[async_trait]
    impl PdfRenderer for EchoRenderer {
        async fn render(
            &self,
            document: &str,
            options: &PdfOptions,
        ) -> Result<Vec<u8>, RenderError> {
            *self.seen.lock().unwrap() = Some((document.to_string(), options.clone()));
            Ok(document.as_bytes().to_vec())
        }
    }

    struct BrokenRenderer;

    #[async_trait]
    impl PdfRenderer for BrokenRenderer {
        async fn render(
            &self,
            _document: &str,
            _options: &PdfOptions,
        ) -> Result<Vec<u8>, RenderError> {
            Err("canvas too large".into())
        }
    }

    fn book(title: &str, raw_html: &str) -> ParsedBook {
        ParsedBook {
            title: title.into(),
            chapters: vec![Chapter::new("ch1", "Content")],
            raw_html: raw_html.into(),
            json_data: None,
        }
    }

    #[test]
    fn format_table() {
        assert_eq!(ExportFormat::ALL.len(), 3);
        assert!(ExportFormat::Pdf.is_popular());
        assert!(!ExportFormat::Docx.is_popular());
        assert_eq!(ExportFormat::Epub.extension(), ".epub");
        assert_eq!(ExportFormat::Docx.description(), "Editable Word document");
        assert_eq!(ExportFormat::from_id(" PDF "), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::from_id("odt"), None);
    }

    #[test]
    fn print_document_wraps_title_and_markup() {
        assert_eq!(
            print_document("Tom & Jerry", "<p>x</p>"),
            "<div style=\"padding: 40px; font-family: serif; line-height: 1.6;\">\
             <h1 style=\"text-align: center; margin-bottom: 40px;\">Tom &amp; Jerry</h1>\
             <p>x</p></div>"
        );
    }

    #[test]
    fn images_are_fitted_to_the_page() {
        assert_eq!(
            fit_images(r#"<p><img src="a.png"></p>"#),
            r#"<p><img src="a.png" style="max-width: 100%; height: auto;"></p>"#
        );
        assert_eq!(
            fit_images(r#"<img src="b.png" />"#),
            r#"<img src="b.png" style="max-width: 100%; height: auto;" />"#
        );
        assert_eq!(
            fit_images(r#"<IMG style="border: 0;" src="c.png">"#),
            r#"<img style="border: 0; max-width: 100%; height: auto;" src="c.png">"#
        );
        assert_eq!(fit_images("<p>no images</p>"), "<p>no images</p>");
    }

    #[test]
    fn pdf_options_are_fixed() {
        let o = PdfOptions::for_title("Book");
        assert_eq!(o.margin, 10.0);
        assert_eq!(o.file_name, "Book.pdf");
        assert_eq!(o.image_type, "jpeg");
        assert_eq!(o.image_quality, 0.98);
        assert_eq!(o.scale, 2.0);
        assert_eq!(o.unit, "mm");
        assert_eq!(o.format, "a4");
        assert_eq!(o.orientation, Orientation::Portrait);
    }

    #[tokio::test]
    async fn pdf_export_uses_the_renderer() {
        let renderer = EchoRenderer::default();
        let artifact = export(ExportFormat::Pdf, &book("Novel", "<p>Hi</p>"), None, &renderer)
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "Novel.pdf");
        let (document, options) = renderer.seen.lock().unwrap().clone().unwrap();
        assert!(document.ends_with("<p>Hi</p></div>"));
        assert_eq!(options.scale, 2.0);
        assert_eq!(artifact.bytes, document.into_bytes());
    }

    #[tokio::test]
    async fn pdf_export_needs_content() {
        let err = export(ExportFormat::Pdf, &book("Novel", ""), None, &EchoRenderer::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NoContent));
    }

    #[tokio::test]
    async fn pdf_renderer_failure_is_reported() {
        let err = export(ExportFormat::Pdf, &book("N", "<p>x</p>"), None, &BrokenRenderer)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "PDF rendering failed: canvas too large");
    }

    #[tokio::test]
    async fn untitled_book_uses_display_title() {
        let artifact = export(ExportFormat::Pdf, &book("", "<p>x</p>"), None, &EchoRenderer::default())
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "My Untitled Book.pdf");
    }

    #[tokio::test]
    async fn docx_export_returns_the_original() {
        let original = DocumentInput::new("Draft.docx", b"PK\x03\x04".to_vec());
        let artifact = export(
            ExportFormat::Docx,
            &book("Draft", "<p>x</p>"),
            Some(&original),
            &EchoRenderer::default(),
        )
        .await
        .unwrap();
        assert_eq!(artifact.file_name, "Draft.docx");
        assert_eq!(artifact.bytes, b"PK\x03\x04");

        let unnamed = DocumentInput::new("", b"PK".to_vec());
        assert_eq!(
            export_docx("Draft", Some(&unnamed)).unwrap().file_name,
            "Draft.docx"
        );
    }

    #[test]
    fn docx_export_needs_the_original() {
        let err = export_docx("Draft", None).unwrap_err();
        assert_eq!(err.to_string(), "No DOCX file available");
    }

    #[tokio::test]
    async fn epub_is_not_yet_supported() {
        let err = export(ExportFormat::Epub, &book("x", "<p>x</p>"), None, &EchoRenderer::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "EPUB export is currently under development. Please try PDF or DOCX."
        );
    }

    #[tokio::test]
    async fn write_artifact_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let artifact = ExportArtifact {
            format: ExportFormat::Docx,
            file_name: "Draft.docx".into(),
            bytes: b"PK".to_vec(),
        };
        let path = write_artifact(&artifact, &out).await.unwrap();
        assert_eq!(path, out.join("Draft.docx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK");
        assert!(!out.join("Draft.docx.tmp").exists());
    }

    #[tokio::test]
    async fn write_artifact_stays_inside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let artifact = ExportArtifact {
            format: ExportFormat::Pdf,
            file_name: PdfOptions::for_title("../escaped").file_name,
            bytes: b"%PDF".to_vec(),
        };
        let path = write_artifact(&artifact, &out).await.unwrap();
        assert_eq!(path, out.join("escaped.pdf"));
        assert!(!dir.path().join("escaped.pdf").exists());

        let absolute = ExportArtifact {
            file_name: "/tmp/abs/Book.pdf".into(),
            ..artifact.clone()
        };
        assert_eq!(write_artifact(&absolute, &out).await.unwrap(), out.join("Book.pdf"));
    }

    #[test]
    fn unusable_file_names_fall_back_to_untitled() {
        assert_eq!(safe_file_name("..", ExportFormat::Pdf), "My Untitled Book.pdf");
        assert_eq!(safe_file_name("", ExportFormat::Docx), "My Untitled Book.docx");
        assert_eq!(safe_file_name("/", ExportFormat::Pdf), "My Untitled Book.pdf");
        assert_eq!(safe_file_name("a/./b.docx", ExportFormat::Docx), "b.docx");
    }

    #[tokio::test]
    async fn failed_rename_removes_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the file should go makes rename fail.
        std::fs::create_dir_all(dir.path().join("Draft.docx").join("inner")).unwrap();
        let artifact = ExportArtifact {
            format: ExportFormat::Docx,
            file_name: "Draft.docx".into(),
            bytes: b"PK".to_vec(),
        };
        let err = write_artifact(&artifact, dir.path()).await.unwrap_err();
        assert!(matches!(err, ExportError::WriteFailed { .. }));
        assert!(!dir.path().join("Draft.docx.tmp").exists());
    }
}
