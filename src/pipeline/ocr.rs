//! Stage D: OCR fallback.
//!
//! Runs once per document, after the structured stages, when the document
//! is image-based or nothing else produced content. Each page is rendered
//! at the configured DPI, converted to grayscale, written as PNG into a
//! temporary directory and recognised under every configured
//! page-segmentation mode; the longest non-blank output wins.
//!
//! Before the winning text is normalised, lines holding runs of two or
//! more spaces are read as column-separated rows and shaped into a table.
//!
//! The temporary directory is a [`TempDir`] guard, so it is removed on every
//! exit path including panics and early returns.

use super::normalize::normalize_page_text;
use super::tables::shape_table;
use super::text::numbered_lines;
use super::StageContext;
use crate::config::ExtractionConfig;
use crate::error::{OcrError, PageError};
use crate::outline::OutlineLine;
use crate::output::{ContentType, ExtractedRecord, ExtractionMethod, Table};
use crate::source::RawTable;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// An optical character recognition backend.
pub trait OcrEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str {
        "ocr"
    }

    /// Whether the engine can run at all. Checked once per document.
    fn is_available(&self) -> bool;

    /// Recognise the text in the image at `image` using page-segmentation
    /// mode `psm`.
    fn recognize(&self, image: &Path, psm: u8) -> Result<String, OcrError>;
}

/// Drives the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
}

impl TesseractEngine {
    /// `binary` defaults to `tesseract` on `PATH`.
    pub fn new(binary: Option<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| PathBuf::from("tesseract")),
            language: language.into(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        match Command::new(&self.binary).arg("--version").output() {
            Ok(out) => out.status.success(),
            Err(e) => {
                debug!("{} --version failed: {}", self.binary.display(), e);
                false
            }
        }
    }

    fn recognize(&self, image: &Path, psm: u8) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("--psm")
            .arg(psm.to_string())
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    OcrError::Unavailable(format!("{}: {e}", self.binary.display()))
                }
                _ => OcrError::Failed(e.to_string()),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "exit {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// The configured engine, or tesseract built from the config.
pub fn resolve_engine(config: &ExtractionConfig) -> Arc<dyn OcrEngine> {
    match config.ocr_engine {
        Some(ref engine) => Arc::clone(engine),
        None => Arc::new(TesseractEngine::new(
            config.tesseract_path.clone(),
            config.ocr_language.clone(),
        )),
    }
}

/// What the OCR stage produced for the document.
#[derive(Debug, Default)]
pub struct OcrOutcome {
    pub records: Vec<ExtractedRecord>,
    /// Tables split out of recognised text.
    pub tables: Vec<Table>,
    pub lines: Vec<OutlineLine>,
    pub warnings: Vec<PageError>,
    /// Pages for which recognition ran, whether or not it found text.
    pub pages_recognised: usize,
}

/// Longest non-blank output; on a tie the earlier mode is kept.
pub fn pick_longest(outputs: impl IntoIterator<Item = (u8, String)>) -> Option<(u8, String)> {
    outputs
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .fold(None, |best: Option<(u8, String, usize)>, (psm, text)| {
            let len = text.trim().chars().count();
            match best {
                Some((_, _, best_len)) if best_len >= len => best,
                _ => Some((psm, text, len)),
            }
        })
        .map(|(psm, text, _)| (psm, text))
}

/// Run Stage D over every page of the document. `existing` are the tables
/// the structured stages found; OCR tables are numbered after them.
pub fn run_ocr(ctx: &StageContext<'_>, engine: &dyn OcrEngine, existing: &[Table]) -> OcrOutcome {
    let mut outcome = OcrOutcome::default();
    let total = ctx.total_pages;

    if !engine.is_available() {
        let err = PageError::OcrUnavailable {
            detail: format!("{} is not installed or not runnable", engine.name()),
        };
        warn!("{}", err);
        outcome.warnings.push(err);
        return outcome;
    }

    let temp_dir = match TempDir::new() {
        Ok(dir) => dir,
        Err(e) => {
            let err = PageError::OcrUnavailable {
                detail: format!("cannot create temporary directory: {e}"),
            };
            warn!("{}", err);
            outcome.warnings.push(err);
            return outcome;
        }
    };
    debug!("OCR scratch directory: {}", temp_dir.path().display());

    if let Some(ref cb) = ctx.config.progress_callback {
        cb.on_ocr_start(total);
    }
    info!(
        "Running {} on {} page(s) at {} DPI, modes {:?}",
        engine.name(),
        total,
        ctx.config.dpi,
        ctx.config.ocr_psm_modes
    );

    for page in 1..=total {
        if ctx.cancel.load(Ordering::Relaxed) {
            info!("OCR cancelled before page {}", page);
            break;
        }
        let before = outcome.records.len();
        match recognize_page(ctx, engine, temp_dir.path(), page) {
            Ok(Some((psm, text))) => {
                let table_index = existing.iter().filter(|t| t.page == page).count() + 1;
                add_table(&mut outcome, page, table_index, psm, &text);
                add_lines(&mut outcome, ctx, page, psm, &text);
                outcome.pages_recognised += 1;
            }
            Ok(None) => {
                debug!("Page {}: OCR found no text", page);
                outcome.pages_recognised += 1;
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = ctx.config.progress_callback {
                    cb.on_page_warning(page, total, &e.to_string());
                }
                outcome.warnings.push(e);
            }
        }
        let lines = outcome.records.len() - before;
        if let Some(ref cb) = ctx.config.progress_callback {
            cb.on_ocr_page_complete(page, total, lines);
        }
    }

    outcome
}

fn recognize_page(
    ctx: &StageContext<'_>,
    engine: &dyn OcrEngine,
    dir: &Path,
    page: usize,
) -> Result<Option<(u8, String)>, PageError> {
    let raster_failed = |detail: String| PageError::RasterFailed { page, detail };

    let image = ctx
        .source
        .rasterize(page - 1, ctx.config.dpi)
        .map_err(|e| raster_failed(e.to_string()))?;
    let path = dir.join(format!("page_{page:04}.png"));
    image
        .grayscale()
        .save(&path)
        .map_err(|e| raster_failed(format!("cannot write {}: {e}", path.display())))?;

    let mut outputs = Vec::with_capacity(ctx.config.ocr_psm_modes.len());
    let mut last_error = None;
    for &psm in &ctx.config.ocr_psm_modes {
        match engine.recognize(&path, psm) {
            Ok(text) => {
                debug!("Page {}: psm {} → {} chars", page, psm, text.trim().len());
                outputs.push((psm, text));
            }
            Err(e) => {
                debug!("Page {}: psm {} failed: {}", page, psm, e);
                last_error = Some(e);
            }
        }
    }
    if let Err(e) = std::fs::remove_file(&path) {
        debug!("Could not remove {}: {}", path.display(), e);
    }

    if outputs.is_empty() {
        return Err(PageError::OcrFailed {
            page,
            detail: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no segmentation modes configured".to_string()),
        });
    }
    Ok(pick_longest(outputs))
}

static COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}|\t").unwrap());

/// Rows of an OCR page read as a column-separated table.
///
/// Each raw line is split on runs of two or more spaces (or tabs); lines
/// that yield a single column are prose and are left out. `None` when no
/// line has more than one column.
pub fn ocr_table_rows(text: &str) -> Option<RawTable> {
    let rows: RawTable = text
        .lines()
        .map(|line| {
            COLUMN_GAP
                .split(line)
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(|cell| Some(cell.to_string()))
                .collect::<Vec<_>>()
        })
        .filter(|row| row.len() > 1)
        .collect();
    (!rows.is_empty()).then_some(rows)
}

fn add_table(outcome: &mut OcrOutcome, page: usize, table_index: usize, psm: u8, text: &str) {
    let Some(rows) = ocr_table_rows(text) else {
        return;
    };
    match shape_table(page, table_index, rows, ExtractionMethod::Ocr { psm }) {
        Ok(Some(table)) => {
            debug!(
                "Page {}: OCR table with {} column(s), {} row(s)",
                page,
                table.headers.len(),
                table.rows.len()
            );
            outcome.tables.push(table);
        }
        Ok(None) => {}
        Err(e) => {
            warn!("{}", e);
            outcome.warnings.push(e);
        }
    }
}

fn add_lines(outcome: &mut OcrOutcome, ctx: &StageContext<'_>, page: usize, psm: u8, text: &str) {
    let normalized = normalize_page_text(text);
    let kept = numbered_lines(&normalized)
        .map(|(_, line)| line)
        .filter(|line| line.trim().chars().count() >= ctx.config.min_line_length);
    for (i, line) in kept.enumerate() {
        let n = i + 1;
        outcome.records.push(
            ExtractedRecord::new(page, ContentType::OcrText, line.trim(), ExtractionMethod::Ocr { psm })
                .with_line(n),
        );
        outcome.lines.push(OutlineLine::new(page, n, line));
    }
}
