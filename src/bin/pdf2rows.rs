//! CLI binary for pdf2rows.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2rows::{
    extract, extract_to_file, inspect, render_json, DetectionPolicy, ExtractionConfig,
    ExtractionProgressCallback, ExtractionResult, OutputFormat, ProgressCallback, TableSettings,
    TableStrategy,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

/// Terminal progress callback: a live bar for the page stages, a second
/// phase for OCR, and one log line per warning.
struct CliProgressCallback {
    bar: ProgressBar,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner-only until `on_extraction_start` reports the page count.
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
            warnings: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize, prefix: &'static str) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages, "Extracting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, items: usize) {
        let mark = if items == 0 { dim("·") } else { green("✓") };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            mark,
            page_num,
            total_pages,
            dim(&format!("{items:>5} items")),
        ));
        self.bar.inc(1);
    }

    fn on_page_warning(&self, page_num: usize, total_pages: usize, warning: &str) {
        self.warnings.fetch_add(1, Ordering::SeqCst);

        // Truncate very long messages to keep output tidy.
        let msg = if warning.chars().count() > 80 {
            let head: String = warning.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            warning.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            yellow("!"),
            page_num,
            total_pages,
            yellow(&msg),
        ));
    }

    fn on_ocr_start(&self, total_pages: usize) {
        self.activate_bar(total_pages, "OCR");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running OCR on {total_pages} pages…"))
        ));
    }

    fn on_ocr_page_complete(&self, page_num: usize, total_pages: usize, lines: usize) {
        self.bar.println(format!(
            "  {} OCR  {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{lines:>5} lines")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, placeholder_pages: usize) {
        self.bar.finish_and_clear();
        let warnings = self.warnings.load(Ordering::SeqCst);

        if placeholder_pages == 0 && warnings == 0 {
            eprintln!(
                "{} {} pages extracted",
                green("✔"),
                bold(&total_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {} pages extracted  ({} empty, {} warnings)",
                if placeholder_pages == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&total_pages.to_string()),
                yellow(&placeholder_pages.to_string()),
                yellow(&warnings.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full extraction result as JSON (stdout)
  pdf2rows document.pdf

  # Sheet layout written to a file
  pdf2rows document.pdf --format sheets -o document.json

  # Syllabus outline (unit / topic / subtopic)
  pdf2rows --outline syllabus.pdf -o syllabus.json

  # Scanned document, higher DPI, German + English OCR
  pdf2rows --dpi 400 --lang deu+eng scan.pdf

  # Only try two segmentation modes
  pdf2rows --psm 6,4 scan.pdf

  # Text-based or image-based? (no extraction)
  pdf2rows --inspect-only document.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  PDF2ROWS_TESSERACT      Path to the tesseract executable
  RUST_LOG                Override the log filter (e.g. pdf2rows=debug)

SETUP:
  1. Install pdfium:      place libpdfium next to the binary or set PDFIUM_LIB_PATH
  2. Install tesseract:   apt install tesseract-ocr  /  brew install tesseract
  3. Extract:             pdf2rows document.pdf -o output.json

  Without tesseract, scanned pages are reported as empty placeholders and a
  warning is recorded; text-based documents are unaffected.
"#;

/// Extract tables, text, words and OCR output from PDFs as tabular records.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2rows",
    version,
    about = "Extract tables, text, words and OCR output from PDFs as tabular records",
    long_about = "Extract the content of a PDF document, born-digital or scanned, as tabular \
records. Every page is represented in the output: pages nothing could be extracted from get \
an explicit placeholder. Optionally reconstructs a unit / topic / subtopic outline.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "PDF2ROWS_OUTPUT")]
    output: Option<PathBuf>,

    /// Output layout: the full result, or one sheet per record group.
    #[arg(long, env = "PDF2ROWS_FORMAT", value_enum, default_value = "result")]
    format: FormatArg,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, env = "PDF2ROWS_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Text characters a page must exceed to count as text-based.
    #[arg(long, env = "PDF2ROWS_MIN_TEXT_LENGTH", default_value_t = 50)]
    min_text_length: usize,

    /// Shortest OCR line kept, in characters.
    #[arg(long, env = "PDF2ROWS_MIN_LINE_LENGTH", default_value_t = 2)]
    min_line_length: usize,

    /// How page text lengths are combined when detecting scans.
    #[arg(long, env = "PDF2ROWS_POLICY", value_enum, default_value = "per-page")]
    policy: PolicyArg,

    /// Table cell boundaries: inferred from word alignment or from ruling lines.
    #[arg(long, env = "PDF2ROWS_TABLES", value_enum, default_value = "text")]
    tables: TableStrategyArg,

    /// Tesseract page-segmentation modes, tried in order (e.g. 6,3,4).
    #[arg(long, env = "PDF2ROWS_PSM", value_delimiter = ',', default_value = "6,3,4")]
    psm: Vec<u8>,

    /// Tesseract language code(s), e.g. eng or deu+eng.
    #[arg(long, env = "PDF2ROWS_LANG", default_value = "eng")]
    lang: String,

    /// Path to the tesseract executable.
    #[arg(long, env = "PDF2ROWS_TESSERACT")]
    tesseract: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2ROWS_PASSWORD")]
    password: Option<String>,

    /// Skip per-word records.
    #[arg(long, env = "PDF2ROWS_NO_WORDS")]
    no_words: bool,

    /// Skip image and annotation records.
    #[arg(long, env = "PDF2ROWS_NO_RESIDUAL")]
    no_residual: bool,

    /// Classify lines into a unit / topic / subtopic outline.
    #[arg(long, env = "PDF2ROWS_OUTLINE")]
    outline: bool,

    /// Abort the run after this many seconds.
    #[arg(long, env = "PDF2ROWS_TIMEOUT")]
    timeout: Option<u64>,

    /// Disable progress bar.
    #[arg(long, env = "PDF2ROWS_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count and content kind only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// With --inspect-only: print the document facts as JSON.
    #[arg(long, requires = "inspect_only")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2ROWS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2ROWS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Result,
    Sheets,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Result => OutputFormat::Result,
            FormatArg::Sheets => OutputFormat::Sheets,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    PerPage,
    Cumulative,
}

impl From<PolicyArg> for DetectionPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::PerPage => DetectionPolicy::PerPageMaximum,
            PolicyArg::Cumulative => DetectionPolicy::Cumulative,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TableStrategyArg {
    Text,
    Lines,
}

impl From<TableStrategyArg> for TableStrategy {
    fn from(v: TableStrategyArg) -> Self {
        match v {
            TableStrategyArg::Text => TableStrategy::Text,
            TableStrategyArg::Lines => TableStrategy::Lines,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let info = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise document info")?
            );
        } else {
            println!("File:          {}", info.path.display());
            println!("Pages:         {}", info.total_pages);
            println!("Content kind:  {}", info.content_kind);
            let unreadable = info
                .text_chars_per_page
                .iter()
                .filter(|n| n.is_none())
                .count();
            if unreadable > 0 {
                println!("Unreadable:    {} page(s)", unreadable);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let format = OutputFormat::from(cli.format);

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let result = extract_to_file(&cli.input, output_path, &config, format)
            .await
            .context("Extraction failed")?;

        if !cli.quiet {
            print_summary(&result);
            eprintln!("   →  {}", bold(&output_path.display().to_string()));
        }
    } else {
        let result = extract(&cli.input, &config)
            .await
            .context("Extraction failed")?;
        let json = render_json(&result, format).context("Failed to serialise output")?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();

        if !cli.quiet {
            print_summary(&result);
        }
    }

    Ok(())
}

fn print_summary(result: &ExtractionResult) {
    eprintln!(
        "{}  {} pages  {:?}  {:.1}% → {:.1}% complete  {}ms",
        if result.placeholder_pages.is_empty() {
            green("✔")
        } else {
            cyan("⚠")
        },
        result.total_pages,
        result.method,
        result.completeness_before,
        result.completeness_score,
        result.stats.total_duration_ms,
    );
    eprintln!(
        "   {} tables  /  {} text lines  /  {} words  /  {} OCR lines",
        dim(&result.stats.tables.to_string()),
        dim(&result.stats.text_lines.to_string()),
        dim(&result.stats.words.to_string()),
        dim(&result.stats.ocr_lines.to_string()),
    );
    if !result.placeholder_pages.is_empty() {
        let pages: Vec<String> = result
            .placeholder_pages
            .iter()
            .map(usize::to_string)
            .collect();
        eprintln!("   empty pages: {}", yellow(&pages.join(", ")));
    }
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let strategy = TableStrategy::from(cli.tables);
    let table_settings = TableSettings {
        vertical_strategy: strategy,
        horizontal_strategy: strategy,
        ..TableSettings::default()
    };

    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .min_text_length(cli.min_text_length)
        .min_line_length(cli.min_line_length)
        .detection_policy(cli.policy.into())
        .table_settings(table_settings)
        .ocr_psm_modes(cli.psm.clone())
        .ocr_language(cli.lang.clone())
        .include_words(!cli.no_words)
        .include_residual(!cli.no_residual)
        .build_outline(cli.outline);

    if let Some(ref path) = cli.tesseract {
        builder = builder.tesseract_path(path.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
