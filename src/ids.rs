//! Identifier generation for the normalized book model.
//!
//! Book, page, and element ids are random in production and must be
//! predictable in tests, so the normalizer takes the generator as a
//! dependency instead of calling a global. Any `Fn(&str) -> String` closure
//! works as a generator too.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Produces ids of the form `<prefix>-<unique part>`.
pub trait IdGenerator: Send + Sync {
    /// Return a fresh id for the given prefix (`book`, `page`, `element`).
    fn generate(&self, prefix: &str) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn generate(&self, prefix: &str) -> String {
        self(prefix)
    }
}

/// Random v4 UUIDs: `element-6f1c...`. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn generate(&self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4())
    }
}

/// A shared counter: `book-1`, `page-2`, `element-3`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n}")
    }
}

/// The generator used when the configuration does not supply one.
pub fn default_generator() -> Arc<dyn IdGenerator> {
    Arc::new(UuidIds)
}
