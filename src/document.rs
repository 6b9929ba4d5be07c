//! Read-only access to a parsed source document.
//!
//! The worker pool shares exactly one [`DocumentProvider`] between all page
//! tasks. Implementations declare through
//! [`DocumentProvider::concurrent_extraction`] whether `extract_page` may be
//! called from several threads at once; when it may not, the page processor
//! serialises the extraction call (and only that call).
//!
//! The production backend is [`crate::pipeline::render::PdfiumDocument`].

use crate::error::DocumentError;

/// Raw content of one extracted page, prior to decoding.
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Tightly packed RGBA8 pixels, row-major.
    Rgba {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    /// An encoded image stream (PNG, JPEG, WebP, …); the format is sniffed.
    Encoded(Vec<u8>),
}

impl PageContent {
    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            PageContent::Rgba { pixels, .. } => pixels.len(),
            PageContent::Encoded(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed document, shared read-only across concurrent page tasks.
pub trait DocumentProvider: Send + Sync {
    /// Total number of pages in the document.
    fn page_count(&self) -> Result<usize, DocumentError>;

    /// Extract the content of a 1-indexed page.
    fn extract_page(&self, page: usize) -> Result<PageContent, DocumentError>;

    /// Whether `extract_page` is safe to call from several threads at once.
    ///
    /// Defaults to `false`, in which case callers serialise extraction.
    fn concurrent_extraction(&self) -> bool {
        false
    }
}
