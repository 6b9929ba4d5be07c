//! CLI binary for imagify.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, reports progress and prints the run summary.
//!
//! Exit codes: 0 every page written, 2 some pages failed or were skipped,
//! 1 fatal error (or no page written at all).

use anyhow::{Context, Result};
use clap::Parser;
use imagify::{
    convert, ConversionConfig, ConversionProgressCallback, OutputFormat, PageArtifact, PageError,
    PageSelection, ProgressCallback, RunOutcome, RunStatus, DEFAULT_MAX_PIXELS,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// page. Pages finish out of order, so start times are keyed by page number.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` supplies the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&page_num)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, artifact: &PageArtifact) {
        let elapsed = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {:>9}  {}",
            green("✓"),
            page_num,
            total,
            format!("{}x{}", artifact.width, artifact.height),
            dim(&format!("{} bytes", artifact.bytes)),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &PageError) {
        let elapsed = self.elapsed_secs(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let kind = error.kind();
        let error = error.to_string();
        let msg = match error.char_indices().nth(79) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error,
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<15}  {}  {}",
            red("✗"),
            page_num,
            total,
            kind,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if success_count == total_pages {
            eprintln!(
                "{} {} pages converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages converted  ({} failed, {} skipped)",
                if success_count == 0 {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
                total_pages.saturating_sub(success_count + failed),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page as PNG into ./report/
  imagify --pdf-path report.pdf

  # Pages 1 and 3 as WebP into a chosen directory
  imagify --pdf-path report.pdf --output-path out --pages 1,3 --file-type webp

  # Half size JPEGs
  imagify --pdf-path report.pdf --scale 50 --file-type jpg

  # Fit to 1200 px wide, keeping the aspect ratio
  imagify --pdf-path report.pdf --width 1200

  # Stop at the first failing page
  imagify --pdf-path report.pdf --strict

RESIZE PRECEDENCE:
  --scale (≠ 100) wins; otherwise --width and --height together stretch to
  exact dimensions, and either one alone preserves the aspect ratio.

ENVIRONMENT VARIABLES:
  IMAGIFY_*         Every flag, e.g. IMAGIFY_FILE_TYPE=webp
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  RUST_LOG          Overrides the log filter

EXIT CODES:
  0  every requested page was written
  2  some pages failed or were skipped
  1  fatal error, or no page was written
"#;

/// Convert PDF pages into image files.
#[derive(Parser, Debug)]
#[command(
    name = "imagify",
    version,
    about = "Convert PDF pages into PNG, JPEG, WebP or single-page PDF images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path of the source PDF.
    #[arg(long = "pdf-path", alias = "pdf_path", env = "IMAGIFY_PDF_PATH")]
    pdf_path: PathBuf,

    /// Destination directory. Default: ./{pdf name without extension}.
    #[arg(long = "output-path", alias = "output_path", env = "IMAGIFY_OUTPUT_PATH")]
    output_path: Option<PathBuf>,

    /// Scale as a percentage; any value other than 100 overrides width/height.
    #[arg(long, env = "IMAGIFY_SCALE", default_value_t = 100.0)]
    scale: f64,

    /// Target width in pixels (0 = unset).
    #[arg(long, env = "IMAGIFY_WIDTH", default_value_t = 0)]
    width: u32,

    /// Target height in pixels (0 = unset).
    #[arg(long, env = "IMAGIFY_HEIGHT", default_value_t = 0)]
    height: u32,

    /// Output format: png, jpg, jpeg, pdf, webp.
    #[arg(
        long = "file-type",
        alias = "file_type",
        env = "IMAGIFY_FILE_TYPE",
        default_value = "png"
    )]
    file_type: String,

    /// Pages to convert: 1,3  [1,2,3]  2-4  all.
    #[arg(long, env = "IMAGIFY_PAGES", default_value = "all")]
    pages: String,

    /// Rasterisation density (72–600).
    #[arg(long, env = "IMAGIFY_DPI", default_value_t = 150)]
    dpi: u32,

    /// Largest page image allowed, in pixels (width × height). Pages that
    /// would exceed it fail on their own.
    #[arg(long = "max-pixels", alias = "max_pixels", env = "IMAGIFY_MAX_PIXELS", default_value_t = DEFAULT_MAX_PIXELS)]
    max_pixels: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "IMAGIFY_PASSWORD")]
    password: Option<String>,

    /// Maximum pages processed at once. Default: available parallelism.
    #[arg(short, long, env = "IMAGIFY_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Quality for jpg/jpeg/pdf output (1–100).
    #[arg(long = "jpeg-quality", alias = "jpeg_quality", env = "IMAGIFY_JPEG_QUALITY", default_value_t = 85)]
    jpeg_quality: u8,

    /// Stop admitting pages after the first page failure.
    #[arg(long, env = "IMAGIFY_STRICT")]
    strict: bool,

    /// Print the run outcome as JSON on stdout.
    #[arg(long, env = "IMAGIFY_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "IMAGIFY_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMAGIFY_QUIET")]
    quiet: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMAGIFY_DEBUG")]
    debug: bool,
}

/// JSON document printed by `--json`.
#[derive(Serialize)]
struct Summary<'a> {
    status: RunStatus,
    #[serde(flatten)]
    outcome: &'a RunOutcome,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("error:"), e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports each page, so only warnings get
    // through while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.debug {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Ctrl-C: stop admitting pages, let in-flight pages finish ─────────
    let cancellation = config.cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted: finishing pages in flight, no new pages will start");
            cancellation.cancel();
        }
    });

    // ── Run conversion ───────────────────────────────────────────────────
    let outcome = convert(&cli.pdf_path, &config)
        .await
        .context("Conversion failed")?;
    let status = outcome.status();

    if cli.json {
        let json = serde_json::to_string_pretty(&Summary {
            status,
            outcome: &outcome,
        })
        .context("Failed to serialise outcome")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&outcome, show_progress);
    }

    Ok(match status {
        RunStatus::Success => ExitCode::SUCCESS,
        RunStatus::PartialSuccess => ExitCode::from(2),
        RunStatus::Failed => ExitCode::from(1),
    })
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let format = OutputFormat::from_str(&cli.file_type)?;
    let pages = PageSelection::parse(&cli.pages).context("Invalid --pages")?;

    let mut builder = ConversionConfig::builder()
        .scale(cli.scale)
        .width(cli.width)
        .height(cli.height)
        .format(format)
        .pages(pages)
        .dpi(cli.dpi)
        .jpeg_quality(cli.jpeg_quality)
        .max_pixels(cli.max_pixels)
        .fail_fast(cli.strict);

    if let Some(ref dir) = cli.output_path {
        builder = builder.output_dir(dir);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(outcome: &RunOutcome, show_progress: bool) {
    // Without the bar nothing has reported individual failures yet.
    if !show_progress {
        for f in &outcome.failures {
            eprintln!("  {} {}", red("✗"), f);
        }
        eprintln!(
            "Converted {}/{} pages in {}ms ({} failed, {} skipped)",
            outcome.succeeded,
            outcome.requested,
            outcome.duration_ms,
            outcome.failed,
            outcome.skipped
        );
    }

    eprintln!(
        "{}  {}  {}",
        match outcome.status() {
            RunStatus::Success => green("✔"),
            RunStatus::PartialSuccess => cyan("⚠"),
            RunStatus::Failed => red("✘"),
        },
        bold(&outcome.output_dir.display().to_string()),
        dim(&format!("{}ms", outcome.duration_ms)),
    );
}
