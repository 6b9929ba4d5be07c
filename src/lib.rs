//! # imagify
//!
//! Convert selected pages of a PDF into image files, one file per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate the source, open it in pdfium (engine thread)
//!  ├─ 2. Select   resolve the page list (default: every page)
//!  ├─ 3. Resize   pick one resize mode for the whole run
//!  ├─ 4. Pool     at most P pages in flight, each on the blocking pool:
//!  │                extract → decode → resize → encode → persist
//!  └─ 5. Outcome  barrier, then per-page artifacts and failures
//! ```
//!
//! Pages are written to `{output_dir}/{page}.{ext}`. A page that fails in any
//! stage is recorded in the [`RunOutcome`] and the remaining pages carry on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imagify::{convert, ConversionConfig, OutputFormat, PageSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .format(OutputFormat::Webp)
//!         .pages(PageSelection::List(vec![1, 3]))
//!         .width(1200)
//!         .build()?;
//!     let outcome = convert("report.pdf", &config).await?;
//!     eprintln!("{}/{} pages written to {}",
//!         outcome.succeeded, outcome.requested, outcome.output_dir.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imagify` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! imagify = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! Pages are rasterised by pdfium through `pdfium-render`. The library is
//! looked up at `PDFIUM_LIB_PATH`, then in the working directory, then on the
//! system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, OutputFormat, PageSelection, DEFAULT_MAX_PIXELS,
};
pub use convert::{convert, convert_document, convert_sync};
pub use document::{DocumentProvider, PageContent};
pub use error::{DocumentError, ImagifyError, PageError, PageErrorKind};
pub use output::{PageArtifact, PageFailure, RunOutcome, RunStatus};
pub use pipeline::resize::ResizeSpec;
pub use pool::CancellationFlag;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
