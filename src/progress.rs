//! Progress-callback trait for per-section normalisation events.
//!
//! Inject an [`Arc<dyn NormalizeProgressCallback>`] via
//! [`crate::config::ChunkifyConfigBuilder::progress_callback`] to observe the
//! normaliser as it works through a document. Splitting is a single pure
//! pass and reports nothing; normalisation makes one remote call per section
//! and can take minutes, so that is where events are emitted.
//!
//! # Example
//!
//! ```rust
//! use edgequake_chunkify::{ChunkifyConfig, NormalizeProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Failures(AtomicUsize);
//!
//! impl NormalizeProgressCallback for Failures {
//!     fn on_section_error(&self, index: usize, total: usize, error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("section {}/{} failed: {}", index + 1, total, error);
//!     }
//! }
//!
//! let config = ChunkifyConfig::builder()
//!     .progress_callback(Arc::new(Failures(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the normaliser as it processes each section.
///
/// Methods may be called from several tasks at once when concurrency is
/// above 1; protect shared state accordingly. All methods default to no-ops.
pub trait NormalizeProgressCallback: Send + Sync {
    /// Once, before the first section is sent.
    fn on_normalize_start(&self, total_sections: usize) {
        let _ = total_sections;
    }

    /// Before the first attempt for section `index` (0-based).
    fn on_section_start(&self, index: usize, total_sections: usize) {
        let _ = (index, total_sections);
    }

    /// Section `index` was rewritten; `attempts` counts the calls it took.
    fn on_section_complete(&self, index: usize, total_sections: usize, attempts: u32) {
        let _ = (index, total_sections, attempts);
    }

    /// Section `index` kept its original content after all attempts.
    fn on_section_error(&self, index: usize, total_sections: usize, error: &str) {
        let _ = (index, total_sections, error);
    }

    /// Once, after every section has been attempted.
    fn on_normalize_complete(&self, total_sections: usize, normalized: usize) {
        let _ = (total_sections, normalized);
    }
}

/// Default when no callback is configured.
pub struct NoopProgressCallback;

impl NormalizeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ChunkifyConfig`].
pub type ProgressCallback = Arc<dyn NormalizeProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        attempts: AtomicUsize,
        normalized: AtomicUsize,
    }

    impl NormalizeProgressCallback for Tracking {
        fn on_section_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_section_complete(&self, _index: usize, _total: usize, attempts: u32) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.attempts.fetch_add(attempts as usize, Ordering::SeqCst);
        }

        fn on_section_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_normalize_complete(&self, _total: usize, normalized: usize) {
            self.normalized.store(normalized, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_normalize_start(2);
        cb.on_section_start(0, 2);
        cb.on_section_complete(0, 2, 1);
        cb.on_section_error(1, 2, "boom");
        cb.on_normalize_complete(2, 1);
    }

    #[test]
    fn tracking_callback_through_arc() {
        let tracker = Arc::new(Tracking::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_section_start(0, 2);
        cb.on_section_complete(0, 2, 3);
        cb.on_section_start(1, 2);
        cb.on_section_error(1, 2, "malformed response");
        cb.on_normalize_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.normalized.load(Ordering::SeqCst), 1);
    }
}
