//! The normalized book model: one page of flat, styled, positioned elements.
//!
//! The JSON shape (camelCase keys, `type` for the element kind) is what the
//! preview and export collaborators consume, so field names are part of the
//! contract. Every style, size, and margin here is a literal default. None of
//! it is read from the source document's own formatting.

use crate::error::BookError;
use serde::{Deserialize, Serialize};

// ── Layout constants ─────────────────────────────────────────────────────

/// Horizontal inset of every element, in px.
pub const LEFT_INSET: u32 = 48;

/// Width of every element, in px.
pub const CONTENT_WIDTH: u32 = 698;

/// Vertical offset of the first element, in px.
pub const INITIAL_TOP: u32 = 50;

/// Text colour applied to every element.
pub const TEXT_COLOR: &str = "#333333";

/// Font stack applied to every element.
pub const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

// ── Elements ─────────────────────────────────────────────────────────────

/// What an element is, decided only by the tag it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// From `h1`.
    Heading,
    /// From `h2`.
    Subheading,
    /// From anything else.
    Text,
}

impl ElementKind {
    /// Classify a lower-cased tag name.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "h1" => ElementKind::Heading,
            "h2" => ElementKind::Subheading,
            _ => ElementKind::Text,
        }
    }

    /// Tag emitted when the model is turned back into markup.
    pub fn markup_tag(self) -> &'static str {
        match self {
            ElementKind::Heading => "h1",
            ElementKind::Subheading => "h2",
            ElementKind::Text => "p",
        }
    }

    pub fn font_size(self) -> &'static str {
        match self {
            ElementKind::Heading => "24px",
            ElementKind::Subheading => "20px",
            ElementKind::Text => "14px",
        }
    }

    /// Box height given to an element of this kind.
    pub fn height(self) -> u32 {
        match self {
            ElementKind::Heading => 40,
            ElementKind::Subheading => 32,
            ElementKind::Text => 24,
        }
    }

    /// How far the running vertical offset moves after an element of this kind.
    pub fn advance(self) -> u32 {
        match self {
            ElementKind::Heading => 60,
            ElementKind::Subheading => 48,
            ElementKind::Text => 36,
        }
    }

    /// Top of the element stacked below one of this kind at `y`.
    ///
    /// Saturates at `u32::MAX` so positions never move back up.
    pub fn next_top(self, y: u32) -> u32 {
        y.saturating_add(self.advance())
    }
}

/// The four style attributes an element ever carries.
///
/// Declared in serialisation order; [`StyleKey::ALL`] is the explicit table
/// the markup writer walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKey {
    FontSize,
    FontWeight,
    Color,
    FontFamily,
}

impl StyleKey {
    pub const ALL: [StyleKey; 4] = [
        StyleKey::FontSize,
        StyleKey::FontWeight,
        StyleKey::Color,
        StyleKey::FontFamily,
    ];

    /// Key as it appears in the JSON model.
    pub fn json_name(self) -> &'static str {
        match self {
            StyleKey::FontSize => "fontSize",
            StyleKey::FontWeight => "fontWeight",
            StyleKey::Color => "color",
            StyleKey::FontFamily => "fontFamily",
        }
    }

    /// Hyphenated CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            StyleKey::FontSize => "font-size",
            StyleKey::FontWeight => "font-weight",
            StyleKey::Color => "color",
            StyleKey::FontFamily => "font-family",
        }
    }

    /// Look a JSON key up in the table.
    pub fn from_json_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.json_name() == name)
    }
}

/// Style attributes of one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyles {
    pub font_size: String,
    pub font_weight: String,
    pub color: String,
    pub font_family: String,
}

impl ElementStyles {
    /// Fixed styles for an element that came from `tag`.
    ///
    /// Weight is bold for every tag starting with `h` (so `h3` and `hr` are
    /// bold text elements); size follows the element kind.
    pub fn for_tag(tag: &str) -> Self {
        let kind = ElementKind::from_tag(tag);
        Self {
            font_size: kind.font_size().to_string(),
            font_weight: if tag.starts_with('h') { "bold" } else { "normal" }.to_string(),
            color: TEXT_COLOR.to_string(),
            font_family: FONT_FAMILY.to_string(),
        }
    }

    pub fn get(&self, key: StyleKey) -> &str {
        match key {
            StyleKey::FontSize => &self.font_size,
            StyleKey::FontWeight => &self.font_weight,
            StyleKey::Color => &self.color,
            StyleKey::FontFamily => &self.font_family,
        }
    }

    /// `font-size: 24px; font-weight: bold; color: ...; font-family: ...`
    pub fn to_css(&self) -> String {
        StyleKey::ALL
            .iter()
            .map(|&k| format!("{}: {}", k.css_name(), self.get(k)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Synthetic layout box, in px.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One content block on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Plain text of the originating node, untrimmed.
    pub content: String,
    pub styles: ElementStyles,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub title: String,
    pub order: u32,
    pub created_at: String,
    pub updated_at: String,
    pub elements: Vec<PageElement>,
}

// ── Book wrapper ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub width_mm: u32,
    pub height_mm: u32,
}

impl PageSize {
    /// A4 at 96 dpi.
    pub fn a4() -> Self {
        Self {
            name: "A4".into(),
            width: 794,
            height: 1123,
            width_mm: 210,
            height_mm: 297,
        }
    }
}

/// Top/bottom/left/right spacing in px.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insets {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNumbering {
    pub enabled: bool,
    pub format: String,
    pub position: String,
    pub prefix: String,
    pub suffix: String,
    pub start_from: u32,
    pub font_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub background_color: String,
    pub background_image: String,
    pub background_image_opacity: f64,
    pub background_image_size: String,
    pub background_image_position: String,
    pub default_font_family: String,
    pub default_font_size: String,
    pub default_line_height: String,
    pub default_text_color: String,
    pub margins: Insets,
    pub padding: Insets,
    pub border_radius: u32,
    pub shadow: bool,
    pub shadow_color: String,
    pub shadow_opacity: f64,
    pub page_numbering: PageNumbering,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".into(),
            background_image: String::new(),
            background_image_opacity: 1.0,
            background_image_size: "cover".into(),
            background_image_position: "center".into(),
            default_font_family: FONT_FAMILY.into(),
            default_font_size: "14px".into(),
            default_line_height: "1.5".into(),
            default_text_color: TEXT_COLOR.into(),
            margins: Insets {
                top: 32,
                bottom: 32,
                left: 48,
                right: 48,
            },
            padding: Insets {
                top: 16,
                bottom: 16,
                left: 0,
                right: 0,
            },
            border_radius: 0,
            shadow: true,
            shadow_color: "#000000".into(),
            shadow_opacity: 0.1,
            page_numbering: PageNumbering {
                enabled: true,
                format: "english".into(),
                position: "bottom-center".into(),
                prefix: "— ".into(),
                suffix: " —".into(),
                start_from: 1,
                font_size: "14px".into(),
            },
        }
    }
}

/// The whole normalized book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookModel {
    pub book_id: String,
    pub title: String,
    pub page_size: PageSize,
    pub global_settings: GlobalSettings,
    pub zoom: f64,
    pub total_pages: u32,
    pub created_at: String,
    pub updated_at: String,
    pub pages: Vec<Page>,
}

impl BookModel {
    /// All elements, in page order then element order.
    pub fn elements(&self) -> impl Iterator<Item = &PageElement> {
        self.pages.iter().flat_map(|p| p.elements.iter())
    }

    /// Two-space indented JSON, as shown to users for copying.
    pub fn to_json_pretty(&self) -> Result<String, BookError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
