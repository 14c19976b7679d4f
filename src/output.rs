//! Result types produced by the parse pipeline.
//!
//! All of these serialise with the camelCase field names the preview and
//! export collaborators expect (`htmlContent`, `rawHtml`, `jsonData`).

use crate::model::BookModel;
use serde::{Deserialize, Serialize};

/// Title shown when neither the document nor the caller supplied one.
pub const UNTITLED_BOOK: &str = "My Untitled Book";

/// A table-of-contents entry inside a chapter.
///
/// The section's markup is not owned here; it stays inline in the parent
/// chapter's `html_content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// `s<chapter>-<n>`, `n` restarting at 1 in every chapter.
    pub id: String,
    pub title: String,
}

/// One chapter of the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// `ch<N>`, stable only within one parse run.
    pub id: String,
    pub title: String,
    /// Plain text of the body, paragraphs separated by a blank line.
    pub content: String,
    /// Body markup rebuilt from the chapter's top-level nodes.
    pub html_content: String,
    pub sections: Vec<Section>,
}

impl Chapter {
    /// An empty chapter with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            html_content: String::new(),
            sections: Vec::new(),
        }
    }
}

/// Everything the pipeline produces for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBook {
    pub title: String,
    /// Never empty.
    pub chapters: Vec<Chapter>,
    /// The markup that was segmented.
    pub raw_html: String,
    /// The normalized page/element projection, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<BookModel>,
}

impl ParsedBook {
    /// The title to show: the book title, or [`UNTITLED_BOOK`] if blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_BOOK
        } else {
            &self.title
        }
    }

    /// Total number of sections across all chapters.
    pub fn section_count(&self) -> usize {
        self.chapters.iter().map(|c| c.sections.len()).sum()
    }

    /// Indented chapter/section listing, one entry per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for chapter in &self.chapters {
            out.push_str(&format!("{}  {}\n", chapter.id, chapter.title));
            for section in &chapter.sections {
                out.push_str(&format!("  {}  {}\n", section.id, section.title));
            }
        }
        out
    }
}
