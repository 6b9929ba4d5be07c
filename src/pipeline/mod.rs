//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one step, so every stage is testable on
//! its own and reports its own failure kind.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ select ──▶ ┌──────────────── page (one per task) ────────────────┐
//! (paths)    (pages)   │ render ──▶ decode ──▶ resize ──▶ encode ──▶ persist │
//!                      │ (pdfium)   (pixels)   (policy)   (codec)    (rename) │
//!                      └──────────────────────────────────────────────────────┘
//! ```
//!
//! 1. [`input`]  : validate the source path; derive and create the output directory
//! 2. [`select`] : resolve the list of page numbers to process
//! 3. [`render`] : pdfium-backed [`crate::document::DocumentProvider`]; owns
//!    the engine on a dedicated thread because pdfium handles are not `Send`
//! 4. [`decode`] : turn extracted page content into a `DynamicImage`
//! 5. [`resize`] : pick the resize mode from configuration and apply it
//! 6. [`encode`] : PNG / JPEG / WebP / single-page PDF bytes
//! 7. [`persist`]: write to a temp file and rename over the final name
//! 8. [`page`]   : the per-page processor chaining stages 3–7

pub mod decode;
pub mod encode;
pub mod input;
pub mod page;
pub mod persist;
pub mod render;
pub mod resize;
pub mod select;
