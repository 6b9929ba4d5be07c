//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the worker pool admits and finishes pages. The CLI uses it to
//! drive an `indicatif` progress bar; library callers can forward events to a
//! channel, a log, or a UI.
//!
//! # Example
//!
//! ```rust
//! use imagify::{ConversionConfig, ConversionProgressCallback, PageArtifact};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, _page_num: usize, _total: usize, artifact: &PageArtifact) {
//!         self.written.fetch_add(artifact.bytes, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageError;
use crate::output::PageArtifact;
use std::sync::Arc;

/// Called by the worker pool as it processes each page.
///
/// Implementations must be `Send + Sync`. Pages finish in arbitrary order,
/// so `on_page_complete` / `on_page_error` for different pages interleave.
/// All methods have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first page is admitted.
    ///
    /// # Arguments
    /// * `total_pages`: number of pages that will be attempted
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page is admitted into the pool.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been written to its final path.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, artifact: &PageArtifact) {
        let _ = (page_num, total_pages, artifact);
    }

    /// Called when any stage of a page fails.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &PageError) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the completion barrier.
    ///
    /// # Arguments
    /// * `total_pages`  : pages requested
    /// * `success_count`: pages written successfully
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        bytes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, artifact: &PageArtifact) {
            self.bytes.fetch_add(artifact.bytes, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &PageError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn artifact(page: usize, bytes: usize) -> PageArtifact {
        PageArtifact {
            page,
            path: PathBuf::from(format!("/out/{page}.png")),
            width: 10,
            height: 10,
            bytes,
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(2);
        cb.on_page_start(1, 2);
        cb.on_page_complete(1, 2, &artifact(1, 64));
        cb.on_page_error(
            2,
            2,
            &PageError::Decode {
                page: 2,
                detail: "bad".into(),
            },
        );
        cb.on_conversion_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, &artifact(1, 100));
        tracker.on_page_start(2, 2);
        tracker.on_page_error(
            2,
            2,
            &PageError::Extraction {
                page: 2,
                detail: "out of range".into(),
            },
        );

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.bytes.load(Ordering::SeqCst), 100);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}
