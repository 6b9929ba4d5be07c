//! pdfium-backed [`DocumentProvider`]: extract pages by rasterising them.
//!
//! ## Why a dedicated engine thread?
//!
//! `pdfium-render` documents borrow the `Pdfium` bindings and wrap raw C
//! handles, so they are neither `Send` nor `Sync`, and pdfium itself is not
//! safe for concurrent calls. [`PdfiumDocument`] therefore loads the document
//! on its own thread and serves requests over a channel. The handle it hands
//! out is `Send + Sync` and cheap to share; extraction requests are processed
//! one at a time in arrival order, while decoding, resizing, encoding and
//! persisting happen in the worker pool.
//!
//! ## Output size
//!
//! A 600-DPI render of a poster-sized page runs to hundreds of megapixels.
//! `max_pixels` caps both edges at `√max_pixels`, so pdfium scales such pages
//! down proportionally and never allocates more than `max_pixels` pixels.
//!
//! ## Binding the library
//!
//! `PDFIUM_LIB_PATH` (file or directory) wins; otherwise the working directory
//! and then the system library search path are tried.

use crate::config::DEFAULT_MAX_PIXELS;
use crate::document::{DocumentProvider, PageContent};
use crate::error::{DocumentError, ImagifyError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Options applied when opening and rasterising a document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Rasterisation density; 72 renders one pixel per PDF point.
    pub dpi: u32,
    pub password: Option<String>,
    /// Upper bound on `width × height` of a rendered page.
    pub max_pixels: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 150,
            password: None,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

enum Request {
    PageCount {
        reply: oneshot::Sender<Result<usize, DocumentError>>,
    },
    Extract {
        page: usize,
        reply: oneshot::Sender<Result<PageContent, DocumentError>>,
    },
}

/// A PDF opened in pdfium, owned by a dedicated engine thread.
///
/// Dropping the handle closes the request channel; the engine thread then
/// releases the document and exits.
#[derive(Debug)]
pub struct PdfiumDocument {
    requests: mpsc::Sender<Request>,
}

impl PdfiumDocument {
    /// Bind pdfium, load `path` and start the engine thread.
    ///
    /// Blocking: call from a blocking context (e.g. `spawn_blocking`), never
    /// directly from an async task.
    pub fn open(path: &Path, options: RenderOptions) -> Result<Self, ImagifyError> {
        let (requests, inbox) = mpsc::channel::<Request>(64);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<usize, ImagifyError>>();
        let owned_path = path.to_path_buf();

        std::thread::Builder::new()
            .name("imagify-pdfium".into())
            .spawn(move || engine_main(owned_path, options, inbox, ready_tx))
            .map_err(|e| ImagifyError::Internal(format!("Failed to start pdfium thread: {e}")))?;

        let total_pages = ready_rx
            .blocking_recv()
            .map_err(|_| ImagifyError::Internal("pdfium thread exited during startup".into()))??;
        info!("PDF loaded: {} pages", total_pages);

        Ok(Self { requests })
    }

    fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, DocumentError>>) -> Request,
    ) -> Result<T, DocumentError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .blocking_send(make(reply))
            .map_err(|_| DocumentError::Closed)?;
        response.blocking_recv().map_err(|_| DocumentError::Closed)?
    }
}

impl DocumentProvider for PdfiumDocument {
    fn page_count(&self) -> Result<usize, DocumentError> {
        self.call(|reply| Request::PageCount { reply })
    }

    fn extract_page(&self, page: usize) -> Result<PageContent, DocumentError> {
        self.call(|reply| Request::Extract { page, reply })
    }

    /// Requests are queued to the single engine thread, so callers may
    /// invoke extraction concurrently.
    fn concurrent_extraction(&self) -> bool {
        true
    }
}

/// Bind to a pdfium library, honouring `PDFIUM_LIB_PATH`.
pub fn bind_pdfium() -> Result<Pdfium, ImagifyError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(p) => {
            let p = PathBuf::from(p);
            let lib = if p.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&p)
            } else {
                p
            };
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ImagifyError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

fn engine_main(
    path: PathBuf,
    options: RenderOptions,
    mut inbox: mpsc::Receiver<Request>,
    ready: oneshot::Sender<Result<usize, ImagifyError>>,
) {
    let pdfium = match bind_pdfium() {
        Ok(p) => p,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let password = options.password.as_deref();
    let document = match pdfium.load_pdf_from_file(&path, password) {
        Ok(doc) => doc,
        Err(e) => {
            let _ = ready.send(Err(load_error(&path, password.is_some(), e)));
            return;
        }
    };

    let total_pages = document.pages().len() as usize;
    if ready.send(Ok(total_pages)).is_err() {
        return;
    }

    let max_edge = max_edge(options.max_pixels);
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(options.dpi as f32 / 72.0)
        .set_maximum_width(max_edge)
        .set_maximum_height(max_edge);

    while let Some(request) = inbox.blocking_recv() {
        match request {
            Request::PageCount { reply } => {
                let _ = reply.send(Ok(document.pages().len() as usize));
            }
            Request::Extract { page, reply } => {
                let result = extract(&document, &render_config, page, total_pages);
                let _ = reply.send(result);
            }
        }
    }

    debug!("pdfium engine for {} shut down", path.display());
}

/// Longest edge a render may have so that its area stays within `max_pixels`.
fn max_edge(max_pixels: u64) -> i32 {
    let edge = (max_pixels as f64).sqrt().floor();
    edge.clamp(1.0, f64::from(i32::MAX)) as i32
}

fn extract(
    document: &PdfDocument<'_>,
    render_config: &PdfRenderConfig,
    page: usize,
    total_pages: usize,
) -> Result<PageContent, DocumentError> {
    if page == 0 || page > total_pages || page > usize::from(u16::MAX) {
        return Err(DocumentError::PageOutOfRange {
            page,
            total: total_pages,
        });
    }

    let pdf_page = document
        .pages()
        .get((page - 1) as u16)
        .map_err(|e| DocumentError::Engine(format!("{e:?}")))?;

    let bitmap = pdf_page
        .render_with_config(render_config)
        .map_err(|e| DocumentError::Engine(format!("{e:?}")))?;

    let rgba = bitmap.as_image().into_rgba8();
    let (width, height) = rgba.dimensions();
    debug!("Rendered page {} → {}x{} px", page, width, height);

    Ok(PageContent::Rgba {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

fn load_error(path: &Path, had_password: bool, e: PdfiumError) -> ImagifyError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            ImagifyError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ImagifyError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ImagifyError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let o = RenderOptions::default();
        assert_eq!(o.dpi, 150);
        assert!(o.password.is_none());
        assert_eq!(o.max_pixels, DEFAULT_MAX_PIXELS);
    }

    #[test]
    fn max_edge_keeps_area_within_budget() {
        assert_eq!(max_edge(100_000_000), 10_000);
        assert_eq!(max_edge(99), 9);
        assert_eq!(max_edge(0), 1);
        assert_eq!(max_edge(u64::MAX), i32::MAX);
        for budget in [1u64, 2, 1_000, 4_000_000, 123_456_789] {
            let edge = max_edge(budget) as u64;
            assert!(edge * edge <= budget, "{budget}");
        }
    }

    #[test]
    fn pdfium_document_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdfiumDocument>();
    }

    #[test]
    fn load_error_classifies_passwords() {
        let path = Path::new("x.pdf");
        let e = load_error(path, false, PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::PasswordError,
        ));
        assert!(matches!(e, ImagifyError::PasswordRequired { .. }));

        let e = load_error(path, true, PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::PasswordError,
        ));
        assert!(matches!(e, ImagifyError::WrongPassword { .. }));

        let e = load_error(path, false, PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::FormatError,
        ));
        assert!(matches!(e, ImagifyError::CorruptPdf { .. }));
    }
}
