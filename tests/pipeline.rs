//! Integration tests for the parse pipeline.
//!
//! The external converter and PDF renderer are replaced by in-process fakes,
//! so these tests need no document engine and run offline.

use bookforge::{
    export, parse_document, parse_markup, segment, to_markup, to_model, write_artifact,
    BookError, BookModel, ConvertedMarkup, ConverterError, ConverterOptions, DocumentInput,
    ElementKind, ExportError, ExportFormat, MarkupConverter, ParseConfig, ParseTracker,
    PdfOptions, PdfRenderer, PipelineMode, RenderError, SequentialIds,
};
use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Returns the same markup for any document, counting calls.
struct FixedConverter {
    markup: String,
    calls: AtomicUsize,
}

impl FixedConverter {
    fn new(markup: &str) -> Self {
        Self {
            markup: markup.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MarkupConverter for FixedConverter {
    async fn convert(
        &self,
        _document: &[u8],
        _options: &ConverterOptions,
    ) -> Result<ConvertedMarkup, ConverterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut converted = ConvertedMarkup::new(self.markup.clone());
        converted.warnings.push("Unrecognised paragraph style: 'Quote'".into());
        Ok(converted)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Rejects every document the way a converter does on a non-DOCX upload.
struct RejectingConverter;

#[async_trait]
impl MarkupConverter for RejectingConverter {
    async fn convert(
        &self,
        _document: &[u8],
        _options: &ConverterOptions,
    ) -> Result<ConvertedMarkup, ConverterError> {
        Err("Can't find end of central directory".into())
    }
}

struct FakePdf;

#[async_trait]
impl PdfRenderer for FakePdf {
    async fn render(&self, document: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        Ok(format!("%PDF-1.7 {} {}", options.format, document.len()).into_bytes())
    }
}

fn sequential_config(mode: PipelineMode) -> ParseConfig {
    ParseConfig::builder()
        .mode(mode)
        .id_generator(Arc::new(SequentialIds::new()))
        .build()
        .unwrap()
}

const MANUSCRIPT: &str = "<p>Preface text</p>\
    <h1>Arrival</h1><p>It rained.</p><h2>The Station</h2><p>Empty.</p>\
    <h1>Departure</h1><h2>Tickets</h2><h2>Platform</h2><p>Gone.</p>";

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn manuscript_parses_into_chapters_and_sections() {
    let converter = FixedConverter::new(MANUSCRIPT);
    let input = DocumentInput::new("The Journey.docx", b"PK\x03\x04".to_vec());
    let book = parse_document(&input, &converter, &sequential_config(PipelineMode::Normalized))
        .await
        .unwrap();

    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(book.title, "The Journey");
    assert_eq!(
        book.outline(),
        "ch1  Introduction\n\
         ch2  Arrival\n  s2-1  The Station\n\
         ch3  Departure\n  s3-1  Tickets\n  s3-2  Platform\n"
    );
    assert_eq!(book.chapters[0].content, "Preface text");
    assert_eq!(book.chapters[1].content, "It rained.\n\nEmpty.");

    let model = book.json_data.as_ref().unwrap();
    assert_eq!(model.title, "The Journey");
    assert_eq!(model.elements().count(), 9);
    assert_eq!(to_markup(model), book.raw_html);
}

#[tokio::test]
async fn direct_mode_preserves_converter_markup() {
    let source = "<h1 class=\"title\">Arrival</h1><p><strong>Bold</strong> start</p>\
                  <table><tr><td>cell</td></tr></table>";
    let converter = FixedConverter::new(source);
    let input = DocumentInput::new("t.docx", vec![1]);
    let book = parse_document(&input, &converter, &sequential_config(PipelineMode::Direct))
        .await
        .unwrap();

    assert_eq!(book.raw_html, source);
    assert_eq!(
        book.chapters[0].html_content,
        "<p><strong>Bold</strong> start</p><table><tr><td>cell</td></tr></table>"
    );
    assert_eq!(book.chapters[0].content, "Bold start\n\ncell");
}

#[tokio::test]
async fn rejected_document_yields_no_partial_result() {
    let input = DocumentInput::new("notes.txt", b"plain text".to_vec());
    let err = parse_document(&input, &RejectingConverter, &ParseConfig::default())
        .await
        .unwrap_err();
    match err {
        BookError::ConversionFailed { ref reason } => {
            assert!(reason.contains("central directory"));
            assert_eq!(
                err.to_string(),
                "Failed to parse the document. Please ensure it's a valid DOCX file."
            );
        }
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_document_skips_the_converter() {
    let converter = FixedConverter::new("<h1>x</h1>");
    let config = ParseConfig::builder().max_document_bytes(3).build().unwrap();
    let input = DocumentInput::new("big.docx", vec![0; 4]);
    let err = parse_document(&input, &converter, &config).await.unwrap_err();
    assert!(matches!(err, BookError::DocumentTooLarge { size: 4, limit: 3 }));
    assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn overlapping_parses_keep_the_latest() {
    let tracker = ParseTracker::new();
    let first_converter = FixedConverter::new("<h1>First</h1>");
    let second_converter = FixedConverter::new("<h1>Second</h1>");
    let config = ParseConfig::default();
    let first_input = DocumentInput::new("a.docx", vec![1]);
    let second_input = DocumentInput::new("b.docx", vec![2]);

    let first_ticket = tracker.begin();
    let second_ticket = tracker.begin();
    let (first, second) = tokio::join!(
        parse_document(&first_input, &first_converter, &config),
        parse_document(&second_input, &second_converter, &config),
    );

    let applied: Vec<_> = [(first_ticket, first), (second_ticket, second)]
        .into_iter()
        .filter(|(ticket, _)| tracker.is_current(*ticket))
        .map(|(_, result)| result.unwrap())
        .collect();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].chapters[0].title, "Second");
}

// ── Export ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn parsed_book_exports_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let original = DocumentInput::new("The Journey.docx", b"PK\x03\x04docx".to_vec());
    let book = parse_document(
        &original,
        &FixedConverter::new(MANUSCRIPT),
        &ParseConfig::default(),
    )
    .await
    .unwrap();

    let pdf = export(ExportFormat::Pdf, &book, Some(&original), &FakePdf)
        .await
        .unwrap();
    let pdf_path = write_artifact(&pdf, dir.path()).await.unwrap();
    assert_eq!(pdf_path.file_name().unwrap(), "The Journey.pdf");
    assert!(std::fs::read(&pdf_path).unwrap().starts_with(b"%PDF-1.7 a4"));

    let docx = export(ExportFormat::Docx, &book, Some(&original), &FakePdf)
        .await
        .unwrap();
    let docx_path = write_artifact(&docx, dir.path()).await.unwrap();
    assert_eq!(std::fs::read(docx_path).unwrap(), b"PK\x03\x04docx");

    let epub = export(ExportFormat::Epub, &book, Some(&original), &FakePdf).await;
    assert!(matches!(epub, Err(ExportError::NotYetSupported { format: "EPUB" })));
}

// ── Properties ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Block {
    Chapter(String),
    Section(String),
    Subsection(String),
    Paragraph(String),
}

impl Block {
    fn markup(&self) -> String {
        let (tag, text) = match self {
            Block::Chapter(t) => ("h1", t),
            Block::Section(t) => ("h2", t),
            Block::Subsection(t) => ("h3", t),
            Block::Paragraph(t) => ("p", t),
        };
        format!("<{tag}>{}</{tag}>", html_escape::encode_text(text))
    }
}

fn words() -> impl Strategy<Value = String> {
    "[a-z&<]{1,8}( [a-z]{1,8}){0,3}"
}

fn block() -> impl Strategy<Value = Block> {
    prop_oneof![
        1 => words().prop_map(Block::Chapter),
        1 => words().prop_map(Block::Section),
        1 => words().prop_map(Block::Subsection),
        2 => words().prop_map(Block::Paragraph),
    ]
}

fn document() -> impl Strategy<Value = (Vec<Block>, String)> {
    prop::collection::vec(block(), 0..24).prop_map(|blocks| {
        let markup = blocks.iter().map(Block::markup).collect();
        (blocks, markup)
    })
}

proptest! {
    #[test]
    fn prop_one_chapter_per_primary_heading((blocks, markup) in document()) {
        let chapters = segment(&markup).unwrap();
        let headings: Vec<&String> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Chapter(t) => Some(t),
                _ => None,
            })
            .collect();

        if headings.is_empty() {
            prop_assert_eq!(chapters.len(), 1);
            prop_assert_eq!(chapters[0].title.as_str(), "Content");
            prop_assert_eq!(&chapters[0].html_content, &markup);
        } else {
            let preface = blocks
                .iter()
                .take_while(|b| !matches!(b, Block::Chapter(_)))
                .any(|b| matches!(b, Block::Paragraph(_)));
            let offset = usize::from(preface);
            prop_assert_eq!(chapters.len(), headings.len() + offset);
            if preface {
                prop_assert_eq!(chapters[0].title.as_str(), "Introduction");
            }
            for (chapter, heading) in chapters[offset..].iter().zip(&headings) {
                prop_assert_eq!(&chapter.title, *heading);
            }
        }
    }

    #[test]
    fn prop_section_ids_restart_per_chapter((_blocks, markup) in document()) {
        for chapter in segment(&markup).unwrap() {
            let number = chapter.id.trim_start_matches("ch");
            for (n, section) in chapter.sections.iter().enumerate() {
                prop_assert_eq!(section.id.clone(), format!("s{}-{}", number, n + 1));
            }
        }
    }

    #[test]
    fn prop_model_round_trips_content((_blocks, markup) in document()) {
        let ids = SequentialIds::new();
        let first = to_model(&markup, "t", &ids).unwrap();
        let second = to_model(&to_markup(&first), "t", &ids).unwrap();
        let pairs = |m: &BookModel| -> Vec<(ElementKind, String)> {
            m.elements().map(|e| (e.kind, e.content.clone())).collect()
        };
        prop_assert_eq!(pairs(&first), pairs(&second));
    }

    #[test]
    fn prop_positions_never_move_up((_blocks, markup) in document()) {
        let model = to_model(&markup, "t", &SequentialIds::new()).unwrap();
        let ys: Vec<u32> = model.elements().map(|e| e.position.y).collect();
        if let Some(first) = ys.first() {
            prop_assert_eq!(*first, 50);
        }
        prop_assert!(ys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_every_parse_has_a_chapter((_blocks, markup) in document()) {
        for mode in [PipelineMode::Normalized, PipelineMode::Direct] {
            let book = parse_markup(&markup, "t", &sequential_config(mode)).unwrap();
            prop_assert!(!book.chapters.is_empty());
            prop_assert_eq!(book.chapters[0].id.as_str(), "ch1");
        }
    }
}
