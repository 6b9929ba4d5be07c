//! Page selection: turn a [`PageSelection`] into concrete page numbers.

use crate::config::PageSelection;
use crate::document::DocumentProvider;
use crate::error::ImagifyError;
use std::path::Path;
use tracing::{debug, warn};

/// Resolve the 1-indexed pages to process.
///
/// An explicit list is validated (every entry ≥ 1) and returned as given,
/// duplicates and order included. Pages past the end of the document are not
/// rejected here; they fail individually during extraction. `All` (or an
/// empty list) expands to `1..=page_count`.
pub fn resolve_pages(
    document: &dyn DocumentProvider,
    selection: &PageSelection,
    source: &Path,
) -> Result<Vec<usize>, ImagifyError> {
    if let PageSelection::List(pages) = selection {
        if !pages.is_empty() {
            if let Some(&page) = pages.iter().find(|&&p| p == 0) {
                return Err(ImagifyError::InvalidPage { page });
            }
            debug!("Selected {} pages for conversion", pages.len());
            return Ok(pages.clone());
        }
    }

    let page_count = document
        .page_count()
        .map_err(|e| ImagifyError::PageCountUnavailable {
            detail: e.to_string(),
        })?;

    if page_count == 0 {
        return Err(ImagifyError::EmptyDocument {
            path: source.to_path_buf(),
        });
    }

    warn!(
        "No pages specified. Defaulting to all {} pages.",
        page_count
    );
    Ok((1..=page_count).collect())
}
