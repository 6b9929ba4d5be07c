//! Error types for the imagify library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ImagifyError`]: **Fatal**: the run cannot start at all (missing source
//!   file, unsupported output format, unreadable page count, output directory
//!   unavailable). Returned as `Err(ImagifyError)` from the top-level
//!   `convert*` functions before any page is scheduled.
//!
//! * [`PageError`]: **Non-fatal**: a single page failed in one of its
//!   pipeline stages. Recorded in [`crate::output::RunOutcome`] while every
//!   other page keeps going.
//!
//! [`DocumentError`] is the error surface of a [`crate::document::DocumentProvider`];
//! the pipeline maps it into one of the two types above depending on whether
//! it happened during run setup or inside a page task.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the imagify library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::RunOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ImagifyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("The specified PDF file does not exist ({path})")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The source path exists but is not a regular file.
    #[error("Invalid input '{path}': not a regular file")]
    InvalidInput { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("Failed to read the PDF '{path}': {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page count of the document could not be queried.
    #[error("Could not retrieve the page count from the PDF file: {detail}")]
    PageCountUnavailable { detail: String },

    /// The document has no pages, so there is nothing to convert.
    #[error("The PDF file has no pages ({path})")]
    EmptyDocument { path: PathBuf },

    /// A requested page number is not a positive integer.
    #[error("Invalid page number {page}: pages are 1-indexed")]
    InvalidPage { page: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Requested output format has no encoder.
    #[error("Unsupported file type specified ({format}). Supported: png, jpg, jpeg, pdf, webp")]
    UnsupportedFormat { format: String },

    /// Output directory could not be created or is not a directory.
    #[error("Unable to create the output directory ({path}): {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some pages succeeded but at least one failed or was skipped.
    ///
    /// Returned by [`crate::output::RunOutcome::into_result`] when the caller
    /// wants to treat any page failure as an error.
    #[error("{failed}/{requested} pages failed during conversion ({skipped} skipped)")]
    PartialFailure {
        succeeded: usize,
        failed: usize,
        skipped: usize,
        requested: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library next to the\n\
executable's working directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors reported by a [`crate::document::DocumentProvider`].
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// Page number lies outside `1..=total`.
    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The underlying document engine reported a failure.
    #[error("{0}")]
    Engine(String),

    /// The document engine has shut down and accepts no more requests.
    #[error("document engine is no longer running")]
    Closed,
}

/// A non-fatal error for a single page.
///
/// Each variant names the pipeline stage that failed. The run continues with
/// the remaining pages unless strict mode is enabled.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum PageError {
    /// The page could not be obtained from the document.
    #[error("Unable to extract page {page} from the provided PDF: {detail}")]
    Extraction { page: usize, detail: String },

    /// The extracted page content could not be decoded into pixels.
    #[error("Failed to decode page {page} from the provided PDF: {detail}")]
    Decode { page: usize, detail: String },

    /// The configured resize produced unusable dimensions.
    #[error("Failed to resize page {page}: {detail}")]
    Resize { page: usize, detail: String },

    /// The image could not be encoded in the requested format.
    #[error("Failed to encode page {page}: {detail}")]
    Encode { page: usize, detail: String },

    /// The encoded bytes could not be written to disk.
    #[error("Could not save page {page} to file ({path}): {detail}")]
    Persist {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// The task panicked or was torn down before reaching a terminal state.
    #[error("Page {page}: task aborted: {detail}")]
    Aborted { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::Extraction { page, .. }
            | PageError::Decode { page, .. }
            | PageError::Resize { page, .. }
            | PageError::Encode { page, .. }
            | PageError::Persist { page, .. }
            | PageError::Aborted { page, .. } => *page,
        }
    }

    /// Stage classification, used in summaries and JSON output.
    pub fn kind(&self) -> PageErrorKind {
        match self {
            PageError::Extraction { .. } => PageErrorKind::Extraction,
            PageError::Decode { .. } => PageErrorKind::Decode,
            PageError::Resize { .. } => PageErrorKind::Resize,
            PageError::Encode { .. } => PageErrorKind::Encode,
            PageError::Persist { .. } => PageErrorKind::Persist,
            PageError::Aborted { .. } => PageErrorKind::Aborted,
        }
    }
}

/// The pipeline stage a [`PageError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorKind {
    Extraction,
    Decode,
    Resize,
    Encode,
    Persist,
    Aborted,
}

impl fmt::Display for PageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageErrorKind::Extraction => "ExtractionError",
            PageErrorKind::Decode => "DecodeError",
            PageErrorKind::Resize => "ResizeError",
            PageErrorKind::Encode => "EncodeError",
            PageErrorKind::Persist => "PersistError",
            PageErrorKind::Aborted => "Aborted",
        };
        f.pad(name)
    }
}
