//! Segmentation: split markup into chapters and sections by its headings.
//!
//! `h1` opens a chapter, `h2` opens a section inside the open chapter, `h3`
//! is kept as body markup, and everything else is chapter body. The pass is
//! a single left-to-right fold over the top-level elements with no
//! look-ahead; the state it threads is [`SegmentState`].
//!
//! ## Headingless content
//!
//! - Ordinary content before the first `h1` opens an implicit
//!   `Introduction` chapter, as long as it has text.
//! - `h2`/`h3` before the first `h1` are dropped: there is no chapter to
//!   attach them to.
//! - If the document has no `h1` at all, the whole document becomes one
//!   `Content` chapter holding all of its text and the input markup
//!   verbatim, whatever the fold accumulated.

use crate::error::MarkupError;
use crate::output::{Chapter, Section};
use crate::pipeline::markup::{parse_fragment, Element, Fragment};
use tracing::debug;

/// Title of the chapter synthesised for content before the first heading.
pub const INTRODUCTION_TITLE: &str = "Introduction";

/// Title of the single chapter emitted for a document with no `h1`.
pub const FALLBACK_TITLE: &str = "Content";

/// Separator between paragraphs in a chapter's plain-text body.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Structural role of a top-level element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    ChapterHeading,
    SectionHeading,
    SubsectionHeading,
    Body,
}

impl Role {
    fn of(tag: &str) -> Self {
        match tag {
            "h1" => Role::ChapterHeading,
            "h2" => Role::SectionHeading,
            "h3" => Role::SubsectionHeading,
            _ => Role::Body,
        }
    }
}

/// Accumulator threaded through the fold.
#[derive(Debug, Default)]
struct SegmentState {
    chapters: Vec<Chapter>,
    current: Option<Chapter>,
    chapter_index: usize,
    section_index: usize,
    saw_chapter_heading: bool,
    content: Vec<String>,
    html: Vec<String>,
}

impl SegmentState {
    /// Consume one top-level element.
    fn step(mut self, element: &Element) -> Self {
        match (Role::of(&element.tag), self.current.is_some()) {
            (Role::ChapterHeading, _) => {
                self.flush();
                self.saw_chapter_heading = true;
                self.chapter_index += 1;
                self.section_index = 0;
                let title = non_empty(element.text.trim())
                    .unwrap_or_else(|| format!("Chapter {}", self.chapter_index));
                self.current = Some(Chapter::new(format!("ch{}", self.chapter_index), title));
            }
            (Role::SectionHeading, true) => {
                self.section_index += 1;
                let section = Section {
                    id: format!("s{}-{}", self.chapter_index, self.section_index),
                    title: non_empty(element.text.trim())
                        .unwrap_or_else(|| format!("Section {}", self.section_index)),
                };
                if let Some(chapter) = self.current.as_mut() {
                    chapter.sections.push(section);
                }
                self.html.push(rewrap(element));
            }
            (Role::SubsectionHeading, true) => {
                self.html.push(rewrap(element));
            }
            (Role::SectionHeading | Role::SubsectionHeading, false) => {}
            (Role::Body, true) => self.push_body(element),
            (Role::Body, false) => {
                if !element.text.trim().is_empty() {
                    self.chapter_index += 1;
                    self.current = Some(Chapter::new(
                        format!("ch{}", self.chapter_index),
                        INTRODUCTION_TITLE,
                    ));
                    self.push_body(element);
                }
            }
        }
        self
    }

    fn push_body(&mut self, element: &Element) {
        self.content.push(element.text.trim().to_string());
        self.html.push(element.outer_html.clone());
    }

    /// Close the open chapter, if any, and clear both buffers.
    fn flush(&mut self) {
        let content = std::mem::take(&mut self.content);
        let html = std::mem::take(&mut self.html);
        if let Some(mut chapter) = self.current.take() {
            chapter.content = content.join(PARAGRAPH_SEPARATOR);
            chapter.html_content = html.concat();
            self.chapters.push(chapter);
        }
    }

    /// Close the last chapter. `None` when no `h1` was ever seen.
    fn finish(mut self) -> Option<Vec<Chapter>> {
        self.flush();
        (self.saw_chapter_heading && !self.chapters.is_empty()).then_some(self.chapters)
    }
}

/// Heading markup re-wrapped in a bare tag: `<h2>inner</h2>`.
fn rewrap(element: &Element) -> String {
    format!("<{0}>{1}</{0}>", element.tag, element.inner_html)
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Split `markup` into chapters.
///
/// Always returns at least one chapter for readable markup.
///
/// # Errors
/// Returns [`MarkupError`] only when the markup cannot be tokenized.
pub fn segment(markup: &str) -> Result<Vec<Chapter>, MarkupError> {
    let fragment = parse_fragment(markup)?;
    Ok(segment_fragment(&fragment, markup))
}

/// Split an already-read fragment into chapters.
///
/// `markup` is the source the fragment was read from; it becomes the body of
/// the fallback chapter when the document has no `h1`.
pub fn segment_fragment(fragment: &Fragment, markup: &str) -> Vec<Chapter> {
    let chapters = fragment
        .elements()
        .fold(SegmentState::default(), SegmentState::step)
        .finish();

    if let Some(chapters) = chapters {
        debug!(
            "Segmented into {} chapters, {} sections",
            chapters.len(),
            chapters.iter().map(|c| c.sections.len()).sum::<usize>()
        );
        return chapters;
    }

    debug!("No chapter heading found; using a single fallback chapter");
    let mut fallback = Chapter::new("ch1", FALLBACK_TITLE);
    fallback.content = fragment.text_content().trim().to_string();
    fallback.html_content = markup.to_string();
    vec![fallback]
}
