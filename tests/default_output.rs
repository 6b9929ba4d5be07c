//! Default output directory resolution.
//!
//! Lives in its own test binary because it changes the process working
//! directory.

use imagify::{convert_document, ConversionConfig, DocumentError, DocumentProvider, PageContent};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct OnePage;

impl DocumentProvider for OnePage {
    fn page_count(&self) -> Result<usize, DocumentError> {
        Ok(1)
    }

    fn extract_page(&self, _page: usize) -> Result<PageContent, DocumentError> {
        Ok(PageContent::Rgba {
            width: 2,
            height: 2,
            pixels: vec![255; 16],
        })
    }
}

#[tokio::test]
async fn output_defaults_to_source_stem_under_cwd() {
    let tmp = TempDir::new().unwrap();
    std::env::set_current_dir(tmp.path()).unwrap();

    let config = ConversionConfig::default();
    let outcome = convert_document(Arc::new(OnePage), Path::new("docs/report.pdf"), &config)
        .await
        .unwrap();

    let cwd = std::env::current_dir().unwrap();
    assert_eq!(outcome.output_dir, cwd.join("report"));
    assert!(cwd.join("report").join("1.png").is_file());
}
