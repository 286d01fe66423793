//! CLI binary for pdf2pics.
//!
//! A thin shim over the library crate: maps flags and environment variables
//! to a `BatchConfig`, installs logging, then either serves the conversion
//! tools over stdio (`serve`, the default) or runs one batch (`convert`).

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2pics::config::{DEFAULT_UPLOAD_CONCURRENCY, DEFAULT_UPLOAD_ENDPOINT, DEFAULT_ZOOM};
use pdf2pics::{
    serve_stdio, BatchConfig, BatchProgressCallback, Converter, DocumentError, PageSelection,
    ProgressCallback, ToolServer,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

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

/// One bar over the documents of the batch, with a log line per document.
struct CliProgressCallback {
    bar: ProgressBar,
    current: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Scanning for PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.current
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_documents} PDFs…"))
        ));
    }

    fn on_document_start(&self, document: &str, _index: usize, _total: usize) {
        if let Ok(mut t) = self.current.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(document.to_string());
    }

    fn on_document_complete(&self, document: &str, images: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {}  {}  {}",
            green("✓"),
            document,
            dim(&format!("{images} images")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, document: &str, error: &DocumentError) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        let error = error.to_string();
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };
        self.bar.println(format!(
            "  {} {}  {}  {}",
            red("✗"),
            document,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, succeeded: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(succeeded);
        if failed == 0 {
            eprintln!(
                "{} {} PDFs converted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} PDFs converted  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&succeeded.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve convert_pdfs / convert_pdf to a tool client over stdio
  pdf2pics --pdf-root ./pdfs --output-root ./output serve

  # Render every PDF below ./pdfs/reports and upload the pages
  pdf2pics --pdf-root ./pdfs convert reports

  # Render one PDF locally, pages 1-3 only, at 2x
  pdf2pics --pdf-root ./pdfs --zoom 2 --pages 1-3 convert a/b/c.pdf --local

ENVIRONMENT VARIABLES:
  PDF2PICS_PDF_ROOT       Directory document paths are resolved against
  PDF2PICS_OUTPUT_ROOT    Directory images and conversion.log are written to
  PDF2PICS_UPLOAD_URL     Endpoint rendered pages are POSTed to
  PDF2PICS_CONCURRENCY    Uploads in flight per document
  PDF2PICS_ZOOM           Scale over the native 72 dpi
  PDF2PICS_PAGES          Page selection: all, 5, 3-15, 1,3,5
  PDF2PICS_LOG_MAX_BYTES  Size at which conversion.log is rotated
  PDFIUM_LIB_PATH         Path to libpdfium; the system library otherwise
  RUST_LOG                Overrides the stderr log filter
"#;

/// Render PDFs to per-page PNGs and publish them to a file host.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2pics",
    version,
    about = "Render PDFs to per-page PNGs and publish them to a file host",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory every document path is resolved against.
    #[arg(long, global = true, env = "PDF2PICS_PDF_ROOT", default_value = ".")]
    pdf_root: PathBuf,

    /// Directory rendered images and the log file are written to.
    #[arg(long, global = true, env = "PDF2PICS_OUTPUT_ROOT", default_value = "output")]
    output_root: PathBuf,

    /// Endpoint rendered pages are uploaded to.
    #[arg(long, global = true, env = "PDF2PICS_UPLOAD_URL", default_value = DEFAULT_UPLOAD_ENDPOINT)]
    upload_url: String,

    /// Uploads in flight per document.
    #[arg(short, long, global = true, env = "PDF2PICS_CONCURRENCY",
          default_value_t = DEFAULT_UPLOAD_CONCURRENCY)]
    concurrency: usize,

    /// Scale over the PDF's native 72 dpi (0.1–16).
    #[arg(long, global = true, env = "PDF2PICS_ZOOM", default_value_t = DEFAULT_ZOOM)]
    zoom: f32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, global = true, env = "PDF2PICS_PAGES", default_value = "all")]
    pages: String,

    /// Path to an existing libpdfium.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Rotate conversion.log once it reaches this many bytes.
    #[arg(long, global = true, env = "PDF2PICS_LOG_MAX_BYTES",
          default_value_t = logging::DEFAULT_LOG_MAX_BYTES)]
    log_max_bytes: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2PICS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2PICS_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve convert_pdfs and convert_pdf to an MCP client over stdio.
    Serve,

    /// Convert a directory (or one PDF) below the PDF root and print the mapping.
    Convert {
        /// Directory or PDF relative to the PDF root; the root itself when omitted.
        #[arg(default_value = "")]
        input: String,

        /// Keep images local and report paths instead of uploading.
        #[arg(long)]
        local: bool,

        /// Print the full report (including failures) instead of the mapping.
        #[arg(long)]
        report: bool,

        /// Disable progress bar.
        #[arg(long, env = "PDF2PICS_NO_PROGRESS")]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let serve = Command::Serve;
    let command = cli.command.as_ref().unwrap_or(&serve);

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level lines on stderr; the log file
    // always gets them.
    let show_progress = match command {
        Command::Convert { no_progress, .. } => !cli.quiet && !no_progress,
        Command::Serve => false,
    };
    let stderr_level = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    config
        .ensure_roots()
        .context("Cannot prepare PDF and output roots")?;
    logging::init(&config.log_file(), cli.log_max_bytes, stderr_level, cli.verbose)?;
    info!("pdf2pics {} starting: {:?}", env!("CARGO_PKG_VERSION"), config);

    let converter = Converter::new(config).context("Cannot load the PDF engine")?;

    match command {
        Command::Serve => {
            serve_stdio(ToolServer::new(converter))
                .await
                .context("Tool server I/O failed")?;
        }
        Command::Convert {
            input,
            local,
            report,
            ..
        } => {
            let outcome = converter
                .convert_directory_report(input, !local)
                .await
                .context("Conversion failed")?;

            let failures: Vec<String> = outcome
                .failures()
                .map(|(doc, e)| format!("{doc}: {e}"))
                .collect();
            let (total, succeeded, failed_uploads) =
                (outcome.total(), outcome.succeeded(), outcome.failed_uploads);

            let json = if *report {
                serde_json::to_string_pretty(&outcome)
            } else {
                serde_json::to_string_pretty(&outcome.into_mapping())
            }
            .context("Failed to serialise output")?;
            println!("{json}");

            if !cli.quiet {
                for failure in &failures {
                    eprintln!("  {} {}", red("✗"), failure);
                }
                if failed_uploads > 0 {
                    eprintln!("  {} {} images failed to upload", cyan("⚠"), failed_uploads);
                }
                if !show_progress {
                    eprintln!("Converted {succeeded}/{total} PDFs");
                }
            }
            if total > 0 && succeeded == 0 {
                anyhow::bail!("None of the {total} PDFs could be converted");
            }
        }
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let pages: PageSelection = cli.pages.parse().context("Invalid --pages")?;

    let mut builder = BatchConfig::builder()
        .pdf_root(&cli.pdf_root)
        .output_root(&cli.output_root)
        .upload_endpoint(&cli.upload_url)
        .upload_concurrency(cli.concurrency)
        .zoom(cli.zoom)
        .pages(pages);

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
