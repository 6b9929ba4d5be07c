//! Configuration types for PDF-to-image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The value is constructed once per run
//! and passed by reference into page selection, resize selection and the
//! worker pool; nothing reads configuration from global state.

use crate::error::ImagifyError;
use crate::pool::CancellationFlag;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default pixel budget per page image: 100 megapixels (400 MB as RGBA).
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// Longest page range accepted by [`PageSelection::parse`]. pdfium indexes
/// pages with a `u16`, so no document has more pages than this.
pub const MAX_PAGE_RANGE: usize = u16::MAX as usize;

/// Configuration for a PDF-to-image conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use imagify::{ConversionConfig, OutputFormat, PageSelection};
///
/// let config = ConversionConfig::builder()
///     .format(OutputFormat::Webp)
///     .pages(PageSelection::List(vec![1, 3]))
///     .width(800)
///     .build()
///     .unwrap();
/// assert_eq!(config.width, 800);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Destination directory. If None, derived from the source file name
    /// under the current working directory (`report.pdf` → `./report/`).
    pub output_dir: Option<PathBuf>,

    /// Scaling factor as a percentage. Default: 100 (no scaling).
    ///
    /// Any value other than 100 wins over `width` and `height`.
    pub scale: f64,

    /// Target width in pixels; 0 means unset. Default: 0.
    pub width: u32,

    /// Target height in pixels; 0 means unset. Default: 0.
    pub height: u32,

    /// Output image format. Default: [`OutputFormat::Png`].
    pub format: OutputFormat,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Rasterisation density used when extracting a page. Range: 72–600. Default: 150.
    ///
    /// This defines the "native" size of an extracted page, i.e. what a
    /// `scale` of 100 produces.
    pub dpi: u32,

    /// Quality for lossy encoders (JPEG and the JPEG stream inside PDF output).
    /// Range: 1–100. Default: 85.
    pub jpeg_quality: u8,

    /// Upper bound on `width × height` of any page image, both when
    /// rasterising and when resizing. Default: [`DEFAULT_MAX_PIXELS`].
    ///
    /// A page whose rendered or resized image would exceed the budget fails
    /// on its own instead of exhausting memory for the whole run.
    pub max_pixels: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Upper bound on concurrently processed pages. If None, uses the
    /// machine's available parallelism.
    pub concurrency: Option<usize>,

    /// Strict mode: stop admitting new pages after the first page failure.
    /// Default: false (every page is attempted).
    pub fail_fast: bool,

    /// Optional callback receiving per-page progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Cooperative cancellation: once raised, no new pages are admitted.
    pub cancellation: CancellationFlag,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            scale: 100.0,
            width: 0,
            height: 0,
            format: OutputFormat::default(),
            pages: PageSelection::default(),
            dpi: 150,
            jpeg_quality: 85,
            max_pixels: DEFAULT_MAX_PIXELS,
            password: None,
            concurrency: None,
            fail_fast: false,
            progress_callback: None,
            cancellation: CancellationFlag::default(),
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("output_dir", &self.output_dir)
            .field("scale", &self.scale)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pages", &self.pages)
            .field("dpi", &self.dpi)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("max_pixels", &self.max_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("concurrency", &self.concurrency)
            .field("fail_fast", &self.fail_fast)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn scale(mut self, percent: f64) -> Self {
        self.config.scale = percent;
        self
    }

    pub fn width(mut self, px: u32) -> Self {
        self.config.width = px;
        self
    }

    pub fn height(mut self, px: u32) -> Self {
        self.config.height = px;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn max_pixels(mut self, px: u64) -> Self {
        self.config.max_pixels = px.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = Some(n.max(1));
        self
    }

    pub fn fail_fast(mut self, v: bool) -> Self {
        self.config.fail_fast = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancellation(mut self, flag: CancellationFlag) -> Self {
        self.config.cancellation = flag;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ImagifyError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale <= 0.0 {
            return Err(ImagifyError::InvalidConfig(format!(
                "scale must be a positive percentage, got {}",
                c.scale
            )));
        }
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ImagifyError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ImagifyError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.max_pixels == 0 {
            return Err(ImagifyError::InvalidConfig(
                "Pixel budget must be ≥ 1".into(),
            ));
        }
        if c.concurrency == Some(0) {
            return Err(ImagifyError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output image format.
///
/// `Jpg` and `Jpeg` share an encoder; they differ only in the file extension
/// so that `--file_type jpg` produces `1.jpg` and `--file_type jpeg` produces
/// `1.jpeg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
    Jpeg,
    /// Single-page PDF embedding the page as a JPEG image.
    Pdf,
    /// Lossless WebP.
    Webp,
}

impl OutputFormat {
    /// File extension (without the dot) used for artifacts of this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ImagifyError;

    /// Case-insensitive; anything outside png/jpg/jpeg/pdf/webp is rejected
    /// with [`ImagifyError::UnsupportedFormat`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" => Ok(OutputFormat::Jpg),
            "jpeg" => Ok(OutputFormat::Jpeg),
            "pdf" => Ok(OutputFormat::Pdf),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(ImagifyError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert the listed pages (1-indexed). Order and duplicates are kept;
    /// an empty list means all pages.
    List(Vec<usize>),
}

impl PageSelection {
    /// Parse a page list as accepted on the command line.
    ///
    /// Accepts `1,2,3`, `[1,2,3]`, inclusive ranges such as `2-4`, and
    /// `all`. An empty string (or `[]`) selects all pages.
    pub fn parse(s: &str) -> Result<Self, ImagifyError> {
        let s = s.trim().trim_matches(|c| c == '[' || c == ']').trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let mut pages = Vec::new();
        for item in s.split(',') {
            let item = item.trim();
            if let Some((start, end)) = item.split_once('-') {
                let start = parse_page_number(start)?;
                let end = parse_page_number(end)?;
                if start > end {
                    return Err(ImagifyError::InvalidConfig(format!(
                        "Invalid page range '{item}': start must be <= end"
                    )));
                }
                if end - start >= MAX_PAGE_RANGE {
                    return Err(ImagifyError::InvalidConfig(format!(
                        "Invalid page range '{item}': spans more than {MAX_PAGE_RANGE} pages"
                    )));
                }
                pages.extend(start..=end);
            } else {
                pages.push(parse_page_number(item)?);
            }
        }

        Ok(PageSelection::List(pages))
    }
}

fn parse_page_number(s: &str) -> Result<usize, ImagifyError> {
    let s = s.trim();
    s.parse::<usize>()
        .map_err(|_| ImagifyError::InvalidConfig(format!("Invalid page number: '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.scale, 100.0);
        assert_eq!(c.width, 0);
        assert_eq!(c.height, 0);
        assert_eq!(c.format, OutputFormat::Png);
        assert_eq!(c.pages, PageSelection::All);
        assert!(!c.fail_fast);
    }

    #[test]
    fn build_rejects_non_positive_scale() {
        let err = ConversionConfig::builder().scale(0.0).build().unwrap_err();
        assert!(matches!(err, ImagifyError::InvalidConfig(_)));
        let err = ConversionConfig::builder()
            .scale(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, ImagifyError::InvalidConfig(_)));
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let c = ConversionConfig::builder()
            .dpi(10)
            .jpeg_quality(0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 72);
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.concurrency, Some(1));
    }

    #[test]
    fn format_parse_is_case_insensitive() {
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("Jpg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpg);
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("WebP".parse::<OutputFormat>().unwrap(), OutputFormat::Webp);
        assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
    }

    #[test]
    fn format_parse_rejects_bmp() {
        let err = "bmp".parse::<OutputFormat>().unwrap_err();
        match err {
            ImagifyError::UnsupportedFormat { format } => assert_eq!(format, "bmp"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn page_selection_parse_forms() {
        assert_eq!(PageSelection::parse("").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("[]").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("1,3").unwrap(),
            PageSelection::List(vec![1, 3])
        );
        assert_eq!(
            PageSelection::parse("[3, 1, 3]").unwrap(),
            PageSelection::List(vec![3, 1, 3])
        );
        assert_eq!(
            PageSelection::parse("1,4-6").unwrap(),
            PageSelection::List(vec![1, 4, 5, 6])
        );
    }

    #[test]
    fn page_selection_parse_errors() {
        assert!(PageSelection::parse("1,x").is_err());
        assert!(PageSelection::parse("5-2").is_err());
        assert!(PageSelection::parse("-1").is_err());
    }

    #[test]
    fn page_selection_rejects_huge_ranges() {
        let err = PageSelection::parse("1-100000000000000").unwrap_err();
        assert!(matches!(err, ImagifyError::InvalidConfig(_)), "{err:?}");
        assert!(PageSelection::parse("2-65537").is_err());

        match PageSelection::parse("1-65535").unwrap() {
            PageSelection::List(pages) => assert_eq!(pages.len(), MAX_PAGE_RANGE),
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn pixel_budget_defaults_and_clamps() {
        assert_eq!(ConversionConfig::default().max_pixels, DEFAULT_MAX_PIXELS);
        let c = ConversionConfig::builder().max_pixels(0).build().unwrap();
        assert_eq!(c.max_pixels, 1);
    }
}
