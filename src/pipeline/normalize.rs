//! Normalization: project markup onto the page/element model and back.
//!
//! Forward ([`to_model`]): every top-level element becomes one
//! [`PageElement`] with a kind taken from its tag, its raw text content, fixed
//! per-kind styles, and a synthetic box stacked below the previous one. All
//! elements land on a single page.
//!
//! Backward ([`to_markup`]): every element becomes `<h1|h2|p style="...">`.
//! Geometry is dropped in this direction, so the pair is not a true inverse:
//! element text and kind survive, positions are regenerated on the next
//! forward pass.

use crate::error::MarkupError;
use crate::ids::IdGenerator;
use crate::model::{
    BookModel, ElementKind, ElementStyles, GlobalSettings, Page, PageElement, PageSize, Position,
    CONTENT_WIDTH, INITIAL_TOP, LEFT_INSET,
};
use crate::pipeline::markup::{parse_fragment, Fragment};
use tracing::debug;

/// Build the normalized model for `markup`.
///
/// # Errors
/// Returns [`MarkupError`] only when the markup cannot be tokenized.
pub fn to_model(
    markup: &str,
    title: &str,
    ids: &dyn IdGenerator,
) -> Result<BookModel, MarkupError> {
    let fragment = parse_fragment(markup)?;
    let now = chrono::Utc::now().to_rfc3339();
    Ok(model_from_fragment(&fragment, title, ids, &now))
}

/// Build the normalized model from an already-read fragment.
///
/// `timestamp` is stamped on the book and its page as both creation and
/// update time.
pub fn model_from_fragment(
    fragment: &Fragment,
    title: &str,
    ids: &dyn IdGenerator,
    timestamp: &str,
) -> BookModel {
    let book_id = ids.generate("book");

    let mut y = INITIAL_TOP;
    let elements: Vec<PageElement> = fragment
        .elements()
        .map(|element| {
            let kind = ElementKind::from_tag(&element.tag);
            let placed = PageElement {
                id: ids.generate("element"),
                kind,
                content: element.text.clone(),
                styles: ElementStyles::for_tag(&element.tag),
                position: Position {
                    x: LEFT_INSET,
                    y,
                    width: CONTENT_WIDTH,
                    height: kind.height(),
                },
            };
            y = kind.next_top(y);
            placed
        })
        .collect();

    debug!("Normalized {} elements onto one page", elements.len());

    let page = Page {
        id: ids.generate("page"),
        title: "Page 1".into(),
        order: 0,
        created_at: timestamp.to_string(),
        updated_at: timestamp.to_string(),
        elements,
    };

    BookModel {
        book_id,
        title: title.to_string(),
        page_size: PageSize::a4(),
        global_settings: GlobalSettings::default(),
        zoom: 1.0,
        total_pages: 1,
        created_at: timestamp.to_string(),
        updated_at: timestamp.to_string(),
        pages: vec![page],
    }
}

/// Serialise the model back into markup.
///
/// Elements are concatenated with no separator. Content and style values are
/// escaped so that reading the output back yields the same text.
pub fn to_markup(model: &BookModel) -> String {
    model.elements().map(element_markup).collect()
}

fn element_markup(element: &PageElement) -> String {
    let tag = element.kind.markup_tag();
    format!(
        "<{tag} style=\"{}\">{}</{tag}>",
        html_escape::encode_double_quoted_attribute(&element.styles.to_css()),
        html_escape::encode_text(&element.content),
    )
}
