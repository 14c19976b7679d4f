//! Markup reader: flatten a converter-produced markup string into its
//! top-level nodes.
//!
//! Both the segmenter and the normalizer only ever look one level deep: the
//! direct children of the fragment root. A full DOM is therefore unnecessary.
//! We drive `quick-xml` as a tokenizer in lenient mode and keep a tag stack
//! only to know when a top-level element closes. For every top-level element
//! we record its tag, attributes, decoded text content, and the verbatim
//! source slices for its inner and outer markup.
//!
//! ## HTML leniency
//!
//! The converter emits XHTML-style markup (`<br />`, `<img ... />`), but the
//! reader also accepts the common HTML shapes a strict XML parser rejects:
//!
//! - void elements written without a slash (`<br>`, `<img src=x>`)
//! - end tags with no matching start tag (ignored)
//! - unquoted and boolean attributes
//! - HTML named entities such as `&nbsp;` (decoded; unknown names kept as-is)
//! - a bare `&` that starts no entity
//! - elements left open at end of input (closed at end of input)

use crate::error::MarkupError;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// HTML elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// One direct child of the fragment root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    /// An element and everything inside it.
    Element(Element),
    /// Bare text between top-level elements (entities decoded).
    Text(String),
}

/// A top-level element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name, e.g. `h1`, `p`, `table`.
    pub tag: String,
    /// Attributes in source order, names lower-cased, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Concatenated text of all descendants, entities decoded, untrimmed.
    pub text: String,
    /// Source slice between the start tag and the end tag.
    pub inner_html: String,
    /// Source slice from `<` of the start tag to `>` of the end tag.
    pub outer_html: String,
}

impl Element {
    /// Value of the named attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The ordered top-level nodes of a markup string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<MarkupNode>,
}

impl Fragment {
    /// Top-level elements only, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(|n| match n {
            MarkupNode::Element(e) => Some(e),
            MarkupNode::Text(_) => None,
        })
    }

    /// Text content of the whole fragment, bare text included.
    pub fn text_content(&self) -> String {
        self.nodes
            .iter()
            .map(|n| match n {
                MarkupNode::Element(e) => e.text.as_str(),
                MarkupNode::Text(t) => t.as_str(),
            })
            .collect()
    }
}

/// An element still being read.
struct OpenElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    outer_start: usize,
    inner_start: usize,
    /// Tags opened inside this element and not yet closed.
    stack: Vec<String>,
}

impl OpenElement {
    fn finish(self, markup: &str, inner_end: usize, outer_end: usize) -> Element {
        Element {
            tag: self.tag,
            attributes: self.attributes,
            text: self.text,
            inner_html: markup[self.inner_start..inner_end].to_string(),
            outer_html: markup[self.outer_start..outer_end].to_string(),
        }
    }
}

/// Read `markup` as a fragment and return its top-level nodes.
///
/// # Errors
/// Returns [`MarkupError`] when the tokenizer cannot continue (for example a
/// `<` that does not start a tag). Converter output never does this.
pub fn parse_fragment(markup: &str) -> Result<Fragment, MarkupError> {
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.expand_empty_elements = false;
        config.allow_dangling_amp = true;
    }

    let mut nodes: Vec<MarkupNode> = Vec::new();
    let mut current: Option<OpenElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| MarkupError {
            offset: reader.error_position() as usize,
            reason: e.to_string(),
        })?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let tag = tag_name(&e);
                let is_void = VOID_ELEMENTS.contains(&tag.as_str());
                match current.as_mut() {
                    Some(open) => {
                        if !is_void {
                            open.stack.push(tag);
                        }
                    }
                    None => {
                        let outer_start = after - (e.len() + 2);
                        let open = OpenElement {
                            attributes: attributes(&e),
                            tag,
                            text: String::new(),
                            outer_start,
                            inner_start: after,
                            stack: Vec::new(),
                        };
                        if is_void {
                            nodes.push(MarkupNode::Element(open.finish(markup, after, after)));
                        } else {
                            current = Some(open);
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if current.is_none() {
                    let outer_start = after - (e.len() + 3);
                    let open = OpenElement {
                        tag: tag_name(&e),
                        attributes: attributes(&e),
                        text: String::new(),
                        outer_start,
                        inner_start: after,
                        stack: Vec::new(),
                    };
                    nodes.push(MarkupNode::Element(open.finish(markup, after, after)));
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                let Some(open) = current.as_mut() else {
                    continue;
                };
                if let Some(pos) = open.stack.iter().rposition(|t| *t == name) {
                    open.stack.truncate(pos);
                } else if open.tag == name {
                    let end_tag_start = markup[..after].rfind('<').unwrap_or(after);
                    if let Some(open) = current.take() {
                        nodes.push(MarkupNode::Element(open.finish(
                            markup,
                            end_tag_start,
                            after,
                        )));
                    }
                }
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                push_text(&mut current, &mut nodes, &text);
            }
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(e.as_ref());
                let text = resolve_entity(&name);
                push_text(&mut current, &mut nodes, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = current.take() {
        let end = markup.len();
        nodes.push(MarkupNode::Element(open.finish(markup, end, end)));
    }

    Ok(Fragment { nodes })
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase()
}

fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.html_attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = match unescape(&raw) {
                Ok(v) => v.into_owned(),
                Err(_) => raw,
            };
            (key, value)
        })
        .collect()
}

/// Append text to the open element, or record it as a bare top-level node.
fn push_text(current: &mut Option<OpenElement>, nodes: &mut Vec<MarkupNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    match current {
        Some(open) => open.text.push_str(text),
        None => match nodes.last_mut() {
            Some(MarkupNode::Text(prev)) => prev.push_str(text),
            _ => nodes.push(MarkupNode::Text(text.to_string())),
        },
    }
}

/// Decode an entity reference body (`amp`, `#39`, `#x27`, ...).
///
/// Unknown names come back verbatim as `&name;`.
fn resolve_entity(name: &str) -> String {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        if let Some(c) = code.and_then(char::from_u32) {
            return c.to_string();
        }
        return format!("&{name};");
    }
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00A0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "copy" => "\u{00A9}",
        _ => return format!("&{name};"),
    };
    resolved.to_string()
}
