//! Conversion entry points.
//!
//! [`convert`] runs the whole pipeline for one PDF on disk:
//!
//! ```text
//! validate source ─▶ open document ─▶ resolve pages ─▶ select resize
//!        ─▶ resolve + create output dir ─▶ PagePool::run_all ─▶ RunOutcome
//! ```
//!
//! Everything before `run_all` is fatal and returns `Err(ImagifyError)`;
//! nothing is scheduled and (apart from `DirectoryError` itself) the output
//! directory is not created. From `run_all` onwards page failures are
//! recorded in the returned [`RunOutcome`] instead.

use crate::config::ConversionConfig;
use crate::document::DocumentProvider;
use crate::error::ImagifyError;
use crate::output::RunOutcome;
use crate::pipeline::page::{PageProcessor, PageTask};
use crate::pipeline::render::{PdfiumDocument, RenderOptions};
use crate::pipeline::{input, resize, select};
use crate::pool::PagePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Convert the selected pages of a PDF file into image files.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(RunOutcome)` once every admitted page has finished, even if some pages
/// failed (check [`RunOutcome::status`] or call [`RunOutcome::into_result`]).
///
/// # Errors
/// Returns `Err(ImagifyError)` only for fatal errors:
/// - Source missing, unreadable, or not a PDF
/// - pdfium unavailable, or the document cannot be opened
/// - Invalid page list, unreadable page count, or an empty document
/// - Output directory cannot be created
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunOutcome, ImagifyError> {
    let pdf_path = pdf_path.as_ref().to_path_buf();
    info!("Starting conversion: {}", pdf_path.display());

    input::validate_source(&pdf_path)?;

    let options = RenderOptions {
        dpi: config.dpi,
        password: config.password.clone(),
        max_pixels: config.max_pixels,
    };
    let open_path = pdf_path.clone();
    let document = tokio::task::spawn_blocking(move || PdfiumDocument::open(&open_path, options))
        .await
        .map_err(|e| ImagifyError::Internal(format!("Document loader panicked: {e}")))??;

    convert_document(Arc::new(document), &pdf_path, config).await
}

/// Convert pages of an already opened document.
///
/// `source` names the document; it is used to derive the default output
/// directory and in error messages. Use this to drive the pipeline with a
/// custom [`DocumentProvider`].
pub async fn convert_document(
    document: Arc<dyn DocumentProvider>,
    source: &Path,
    config: &ConversionConfig,
) -> Result<RunOutcome, ImagifyError> {
    // Providers may block (the pdfium backend waits on its engine thread).
    let pages = {
        let document = Arc::clone(&document);
        let selection = config.pages.clone();
        let source = source.to_path_buf();
        tokio::task::spawn_blocking(move || {
            select::resolve_pages(document.as_ref(), &selection, &source)
        })
        .await
        .map_err(|e| ImagifyError::Internal(format!("Page selection panicked: {e}")))??
    };

    let selection = resize::select_resize(config.scale, config.width, config.height);
    if selection.dimensions_ignored {
        warn!("Both scale and width/height are specified. Only scale will be applied.");
    }
    debug!("Resize mode: {:?}", selection.spec);

    let output_dir = input::resolve_output_dir(config.output_dir.as_deref(), source)?;
    input::ensure_output_dir(&output_dir).await?;

    let tasks = build_tasks(&pages, selection.spec, config, &output_dir);

    let processor =
        PageProcessor::new(document, config.jpeg_quality).with_max_pixels(config.max_pixels);
    let pool = PagePool::new(processor)
        .with_limit(config.concurrency)
        .with_progress(config.progress_callback.clone())
        .with_cancellation(config.cancellation.clone())
        .fail_fast(config.fail_fast);

    let mut outcome = pool.run_all(tasks).await;
    outcome.output_dir = output_dir;

    info!(
        "Conversion complete: {}/{} pages written to {} in {}ms",
        outcome.succeeded,
        outcome.requested,
        outcome.output_dir.display(),
        outcome.duration_ms
    );
    if outcome.failed > 0 {
        warn!("{} pages failed", outcome.failed);
    }

    Ok(outcome)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunOutcome, ImagifyError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ImagifyError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(pdf_path, config))
}

fn build_tasks(
    pages: &[usize],
    spec: resize::ResizeSpec,
    config: &ConversionConfig,
    output_dir: &Path,
) -> Vec<PageTask> {
    pages
        .iter()
        .map(|&page| PageTask {
            page,
            resize: spec,
            format: config.format,
            output_dir: PathBuf::from(output_dir),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn tasks_share_resize_and_format() {
        let config = ConversionConfig::builder()
            .format(OutputFormat::Jpg)
            .build()
            .unwrap();
        let tasks = build_tasks(
            &[3, 1, 3],
            resize::ResizeSpec::ByWidth(300),
            &config,
            Path::new("/out"),
        );

        assert_eq!(
            tasks.iter().map(|t| t.page).collect::<Vec<_>>(),
            vec![3, 1, 3]
        );
        assert!(tasks
            .iter()
            .all(|t| t.resize == resize::ResizeSpec::ByWidth(300) && t.format == OutputFormat::Jpg));
        assert_eq!(tasks[1].output_path(), PathBuf::from("/out/1.jpg"));
    }

    #[tokio::test]
    async fn missing_source_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out");
        let config = ConversionConfig::builder()
            .output_dir(&out)
            .build()
            .unwrap();

        let err = convert(dir.path().join("nope.pdf"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ImagifyError::InputNotFound { .. }));
        assert!(!out.exists());
    }
}
