//! Pipeline stages for document-to-book parsing.
//!
//! Each submodule implements one transformation step and is testable on its
//! own. None of them knows about the converter or the progress callback;
//! [`crate::convert`] wires them together.
//!
//! ## Data Flow
//!
//! ```text
//!                      ┌──▶ normalize::to_model ──▶ normalize::to_markup ──┐
//! input ──▶ converter ─┤                                                   ├──▶ segment
//! (bytes)    (markup)  └──────────────────── (direct mode) ────────────────┘
//! ```
//!
//! 1. [`input`]     — read the document and derive the book title
//! 2. [`markup`]    — lenient reader turning markup into top-level nodes
//! 3. [`normalize`] — markup ↔ page/element model
//! 4. [`segment`]   — headings → chapters and sections

pub mod input;
pub mod markup;
pub mod normalize;
pub mod segment;
