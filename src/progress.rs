//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ParseProgressCallback>`] via
//! [`crate::config::ParseConfigBuilder::progress_callback`] to be told when
//! each stage of a parse finishes. The preview UI uses this to drive its
//! "processing" state and to show the failure message.
//!
//! # Example
//!
//! ```rust
//! use bookforge::{ParseConfig, ParseProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ChapterCounter {
//!     chapters: AtomicUsize,
//! }
//!
//! impl ParseProgressCallback for ChapterCounter {
//!     fn on_parse_complete(&self, chapter_count: usize, _section_count: usize) {
//!         self.chapters.store(chapter_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(ChapterCounter { chapters: AtomicUsize::new(0) });
//!
//! let config = ParseConfig::builder()
//!     .progress_callback(counter as Arc<dyn ParseProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the parse pipeline as it moves through its stages.
///
/// Implementations must be `Send + Sync`: parses may run concurrently and
/// share one callback. All methods default to no-ops.
pub trait ParseProgressCallback: Send + Sync {
    /// Called once the document bytes are in memory, before conversion.
    ///
    /// # Arguments
    /// * `file_name` — name the document was uploaded under
    /// * `byte_len`  — size of the document
    fn on_parse_start(&self, file_name: &str, byte_len: usize) {
        let _ = (file_name, byte_len);
    }

    /// Called when the external converter has produced markup.
    ///
    /// # Arguments
    /// * `markup_len` — byte length of the converter's markup
    fn on_markup_ready(&self, markup_len: usize) {
        let _ = markup_len;
    }

    /// Called after the normalized model is built.
    ///
    /// # Arguments
    /// * `element_count` — number of elements on the page
    fn on_model_ready(&self, element_count: usize) {
        let _ = element_count;
    }

    /// Called once with the final chapter layout.
    fn on_parse_complete(&self, chapter_count: usize, section_count: usize) {
        let _ = (chapter_count, section_count);
    }

    /// Called when the parse fails; no other completion event follows.
    ///
    /// # Arguments
    /// * `error` — human-readable error description
    fn on_parse_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ParseProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ParseConfig`].
pub type ProgressCallback = Arc<dyn ParseProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        events: Mutex<Vec<String>>,
        errors: AtomicUsize,
    }

    impl ParseProgressCallback for TrackingCallback {
        fn on_parse_start(&self, file_name: &str, byte_len: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {file_name} {byte_len}"));
        }

        fn on_markup_ready(&self, markup_len: usize) {
            self.events.lock().unwrap().push(format!("markup {markup_len}"));
        }

        fn on_parse_complete(&self, chapter_count: usize, section_count: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {chapter_count}/{section_count}"));
        }

        fn on_parse_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_parse_start("a.docx", 10);
        cb.on_markup_ready(5);
        cb.on_model_ready(2);
        cb.on_parse_complete(1, 0);
        cb.on_parse_error("boom");
    }

    #[test]
    fn tracking_callback_receives_events_in_order() {
        let tracker = TrackingCallback::default();
        tracker.on_parse_start("Book.docx", 1024);
        tracker.on_markup_ready(300);
        tracker.on_model_ready(12);
        tracker.on_parse_complete(3, 5);
        tracker.on_parse_error("late failure");

        let events = tracker.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["start Book.docx 1024", "markup 300", "done 3/5"]
        );
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_parse_start("x", 0);
        cb.on_parse_complete(1, 1);
    }
}
