//! Per-page processing: extract → decode → resize → encode → persist.
//!
//! A failure in any stage ends only the current page and is returned as the
//! matching [`PageError`] variant; the worker pool records it and moves on.

use crate::config::{OutputFormat, DEFAULT_MAX_PIXELS};
use crate::document::{DocumentProvider, PageContent};
use crate::error::{DocumentError, PageError};
use crate::output::PageArtifact;
use crate::pipeline::{decode, encode, persist, resize::{self, ResizeSpec}};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::debug;

/// One unit of work: a single page and everything needed to produce its file.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTask {
    /// 1-indexed page number.
    pub page: usize,
    pub resize: ResizeSpec,
    pub format: OutputFormat,
    pub output_dir: PathBuf,
}

impl PageTask {
    /// `{output_dir}/{page}.{extension}`.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.page, self.format.extension()))
    }
}

/// Runs the page pipeline against a shared document.
pub struct PageProcessor {
    document: Arc<dyn DocumentProvider>,
    /// Held around extraction when the provider can't take concurrent calls.
    extract_lock: Option<Mutex<()>>,
    jpeg_quality: u8,
    max_pixels: u64,
}

impl PageProcessor {
    pub fn new(document: Arc<dyn DocumentProvider>, jpeg_quality: u8) -> Self {
        let extract_lock = (!document.concurrent_extraction()).then(|| Mutex::new(()));
        Self {
            document,
            extract_lock,
            jpeg_quality,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    /// Pages whose resized image would exceed `max_pixels` fail with a
    /// resize error.
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels.max(1);
        self
    }

    /// Process one page. Blocking; the pool runs it on the blocking thread pool.
    pub fn process(&self, task: &PageTask) -> Result<PageArtifact, PageError> {
        let start = Instant::now();
        let page = task.page;
        debug!("-- Processing page {} --", page);

        let content = self.extract(page).map_err(|e| PageError::Extraction {
            page,
            detail: e.to_string(),
        })?;

        let image = decode::decode_page(content).map_err(|e| PageError::Decode {
            page,
            detail: e.to_string(),
        })?;

        let image = resize::apply_resize(image, &task.resize, self.max_pixels).map_err(|e| {
            PageError::Resize {
                page,
                detail: e.to_string(),
            }
        })?;

        let bytes = encode::encode_image(&image, task.format, self.jpeg_quality).map_err(|e| {
            PageError::Encode {
                page,
                detail: e.to_string(),
            }
        })?;

        let path = task.output_path();
        persist::write_atomic(&path, &bytes).map_err(|e| PageError::Persist {
            page,
            path: path.clone(),
            detail: e.to_string(),
        })?;

        debug!(
            "Page {} → {} ({}x{}, {} bytes) in {}ms",
            page,
            path.display(),
            image.width(),
            image.height(),
            bytes.len(),
            start.elapsed().as_millis()
        );

        Ok(PageArtifact {
            page,
            path,
            width: image.width(),
            height: image.height(),
            bytes: bytes.len(),
        })
    }

    fn extract(&self, page: usize) -> Result<PageContent, DocumentError> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        let _guard = self
            .extract_lock
            .as_ref()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner));
        self.document.extract_page(page)
    }
}
