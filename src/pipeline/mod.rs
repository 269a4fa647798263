//! The extraction pipeline.
//!
//! Each submodule implements one step; [`run`] drives them over a
//! [`DocumentSource`].
//!
//! ## Data Flow
//!
//! ```text
//! detect ──▶ page stages ──▶ ocr? ──▶ reconcile ──▶ outline? ──▶ consolidate
//!            (per page)     (per doc)
//! ```
//!
//! 1. [`detect`] classifies the document as text- or image-based
//! 2. page stages, in order, on every page:
//!    [`tables`] (Stage A), [`text`] (Stage B, lines then words),
//!    [`residual`] (Stage C). Every stage runs whatever the earlier ones
//!    produced; coverage is maximised, not first success
//! 3. [`ocr`] (Stage D) runs once for the document when it is image-based
//!    or the page stages produced nothing at all
//! 4. [`reconcile`] adds a placeholder for every page still uncovered
//! 5. the outline classifier runs on the line stream when requested
//! 6. [`consolidate`] lays out summaries, tables and record groups
//!
//! Failures inside a page, stage or table become [`PageError`] warnings.
//! Only failing to count the pages is fatal.

pub mod consolidate;
pub mod detect;
pub mod headers;
pub mod input;
pub mod normalize;
pub mod ocr;
pub mod reconcile;
pub mod residual;
pub mod tables;
pub mod text;

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, PageError};
use crate::outline::{Outline, OutlineLine};
use crate::output::{
    ContentKind, ContentType, DocumentMethod, ExtractedRecord, ExtractionResult, ExtractionStats,
    Table,
};
use crate::source::DocumentSource;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a stage needs to read.
pub struct StageContext<'a> {
    pub source: &'a dyn DocumentSource,
    pub config: &'a ExtractionConfig,
    pub total_pages: usize,
    /// Set by a caller-level timeout; checked between pages.
    pub cancel: &'a AtomicBool,
}

/// Output of one stage on one page.
#[derive(Debug, Default)]
pub struct PageYield {
    pub records: Vec<ExtractedRecord>,
    pub tables: Vec<Table>,
    /// Lines for the outline classifier.
    pub lines: Vec<OutlineLine>,
    /// Failures that did not stop the stage, e.g. one malformed table.
    pub warnings: Vec<PageError>,
}

impl PageYield {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
            && self.tables.is_empty()
            && self.lines.is_empty()
            && self.warnings.is_empty()
    }
}

/// A per-page stage: `Ok(None)` when it found nothing, `Err` when the whole
/// stage failed for the page.
pub type PageStage = fn(&StageContext<'_>, usize) -> Result<Option<PageYield>, PageError>;

/// The page stages enabled by `config`, in execution order.
pub fn page_stages(config: &ExtractionConfig) -> Vec<(&'static str, PageStage)> {
    let mut stages: Vec<(&'static str, PageStage)> = Vec::with_capacity(4);
    stages.push(("tables", tables::extract_tables));
    stages.push(("text", text::extract_text));
    if config.include_words {
        stages.push(("words", text::extract_words));
    }
    if config.include_residual {
        stages.push(("residual", residual::extract_residual));
    }
    stages
}

/// Run the whole pipeline over `source`.
///
/// `path` is only recorded in the result and in error messages.
pub fn run(
    source: &dyn DocumentSource,
    path: &Path,
    config: &ExtractionConfig,
    cancel: &AtomicBool,
) -> Result<ExtractionResult, ExtractError> {
    let started_at = Utc::now();
    let total_start = Instant::now();

    // ── Step 1: Enumerate pages ──────────────────────────────────────────
    let total_pages = source.page_count().map_err(|e| ExtractError::Unreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    info!("Extracting {} ({} pages)", path.display(), total_pages);
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total_pages);
    }

    // ── Step 2: Detect content kind ──────────────────────────────────────
    let content_kind = detect::detect_content_kind(
        source,
        total_pages,
        config.min_text_length,
        config.detection_policy,
    );

    let ctx = StageContext {
        source,
        config,
        total_pages,
        cancel,
    };

    // ── Step 3: Page stages ──────────────────────────────────────────────
    let stages = page_stages(config);
    let mut records: Vec<ExtractedRecord> = Vec::new();
    let mut tables: Vec<Table> = Vec::new();
    let mut text_lines: Vec<OutlineLine> = Vec::new();
    let mut warnings: Vec<PageError> = Vec::new();

    for page in 1..=total_pages {
        if cancel.load(Ordering::Relaxed) {
            warn!("Extraction cancelled before page {}", page);
            break;
        }
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page, total_pages);
        }
        let mut items = 0usize;
        for (name, stage) in &stages {
            let outcome = stage(&ctx, page);
            let page_warnings = match outcome {
                Ok(Some(y)) => {
                    debug!(
                        "Page {}: stage '{}' → {} record(s), {} table(s)",
                        page,
                        name,
                        y.records.len(),
                        y.tables.len()
                    );
                    items += y.records.len() + y.tables.len();
                    records.extend(y.records);
                    tables.extend(y.tables);
                    text_lines.extend(y.lines);
                    y.warnings
                }
                Ok(None) => {
                    debug!("Page {}: stage '{}' found nothing", page, name);
                    Vec::new()
                }
                Err(e) => {
                    warn!("Stage '{}': {}", name, e);
                    vec![e]
                }
            };
            for w in page_warnings {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_warning(page, total_pages, &w.to_string());
                }
                warnings.push(w);
            }
        }
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page, total_pages, items);
        }
    }

    // ── Step 4: OCR fallback ─────────────────────────────────────────────
    let structured_items = records.len() + tables.len();
    let needs_ocr = total_pages > 0
        && (content_kind == ContentKind::ImageBased || structured_items == 0)
        && !cancel.load(Ordering::Relaxed);
    let mut ocr_lines = Vec::new();
    let mut ocr_items = 0usize;
    let mut ocr_duration_ms = 0u64;
    if needs_ocr {
        info!(
            "Running OCR fallback ({} document, {} structured item(s))",
            content_kind, structured_items
        );
        let ocr_start = Instant::now();
        let engine = ocr::resolve_engine(config);
        let outcome = ocr::run_ocr(&ctx, engine.as_ref(), &tables);
        ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
        ocr_items = outcome.records.len() + outcome.tables.len();
        info!(
            "OCR: {} line(s), {} table(s) from {} page(s) in {}ms",
            outcome.records.len(),
            outcome.tables.len(),
            outcome.pages_recognised,
            ocr_duration_ms
        );
        records.extend(outcome.records);
        tables.extend(outcome.tables);
        ocr_lines = outcome.lines;
        warnings.extend(outcome.warnings);
    }

    let method = match (needs_ocr, structured_items, ocr_items) {
        (false, _, _) => DocumentMethod::Structured,
        (true, 0, _) => DocumentMethod::Ocr,
        (true, _, 0) => DocumentMethod::Structured,
        (true, _, _) => DocumentMethod::Hybrid,
    };

    // ── Step 5: Reconcile ────────────────────────────────────────────────
    let completeness_before =
        reconcile::completeness(reconcile::covered_pages(&records, &tables).len(), total_pages);

    let outline = config.build_outline.then(|| {
        let input = outline_input(text_lines, ocr_lines, &records, config.min_line_length);
        Outline::build(input, config.reconstruct_threshold)
    });

    let placeholder_pages = reconcile::reconcile(&mut records, &tables, total_pages);
    let completeness_score =
        reconcile::completeness(reconcile::covered_pages(&records, &tables).len(), total_pages);
    info!(
        "Completeness: {:.1}% before reconciliation, {:.1}% after",
        completeness_before, completeness_score
    );

    // ── Step 6: Consolidate ──────────────────────────────────────────────
    let count = |ct: ContentType| records.iter().filter(|r| r.content_type == ct).count();
    let stats = ExtractionStats {
        tables: tables.len(),
        text_lines: count(ContentType::TextLine),
        words: count(ContentType::Word),
        residual_items: count(ContentType::Image) + count(ContentType::Annotation),
        ocr_lines: count(ContentType::OcrText),
        placeholders: placeholder_pages.len(),
        warnings: warnings.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ocr_duration_ms,
    };
    let segments = consolidate::consolidate(records, tables, total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(total_pages, placeholder_pages.len());
    }
    info!(
        "Extraction complete: {} tables, {} text lines, {} OCR lines, {} warning(s), {}ms",
        stats.tables, stats.text_lines, stats.ocr_lines, stats.warnings, stats.total_duration_ms
    );

    Ok(ExtractionResult {
        path: path.to_path_buf(),
        total_pages,
        content_kind,
        method,
        segments,
        completeness_before,
        completeness_score,
        placeholder_pages,
        warnings,
        outline,
        stats,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Lines fed to the outline classifier.
///
/// Per page, text-layer lines are preferred and OCR lines used where the
/// page had none. Lines shorter than `min_line_length` are dropped. When no
/// page has lines, word records are used instead and the classifier's
/// reconstruction pass regroups them.
pub fn outline_input(
    text_lines: Vec<OutlineLine>,
    ocr_lines: Vec<OutlineLine>,
    records: &[ExtractedRecord],
    min_line_length: usize,
) -> Vec<OutlineLine> {
    let long_enough = |l: &OutlineLine| l.text.trim().chars().count() >= min_line_length;

    let mut by_page: BTreeMap<usize, Vec<OutlineLine>> = BTreeMap::new();
    for line in text_lines.into_iter().filter(long_enough) {
        by_page.entry(line.page).or_default().push(line);
    }
    let text_pages: BTreeSet<usize> = by_page.keys().copied().collect();
    for line in ocr_lines.into_iter().filter(long_enough) {
        if !text_pages.contains(&line.page) {
            by_page.entry(line.page).or_default().push(line);
        }
    }

    let lines: Vec<OutlineLine> = by_page.into_values().flatten().collect();
    if !lines.is_empty() {
        return lines;
    }

    records
        .iter()
        .filter(|r| r.content_type == ContentType::Word)
        .map(|r| OutlineLine::new(r.page, r.line_number.unwrap_or_default(), r.text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ExtractionMethod;

    #[test]
    fn stage_list_follows_config() {
        let names = |config: &ExtractionConfig| -> Vec<&'static str> {
            page_stages(config).into_iter().map(|(n, _)| n).collect()
        };
        assert_eq!(
            names(&ExtractionConfig::default()),
            vec!["tables", "text", "words", "residual"]
        );
        let lean = ExtractionConfig::builder()
            .include_words(false)
            .include_residual(false)
            .build()
            .unwrap();
        assert_eq!(names(&lean), vec!["tables", "text"]);
    }

    #[test]
    fn outline_prefers_text_lines_per_page() {
        let text = vec![OutlineLine::new(1, 1, "1. Intro"), OutlineLine::new(1, 2, "x")];
        let ocr = vec![
            OutlineLine::new(1, 1, "ocr duplicate"),
            OutlineLine::new(2, 1, "a) scanned"),
            OutlineLine::new(2, 2, "more scanned"),
        ];
        let lines = outline_input(text, ocr, &[], 2);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["1. Intro", "a) scanned", "more scanned"]);
    }

    #[test]
    fn outline_falls_back_to_words() {
        let words = vec![
            ExtractedRecord::new(1, ContentType::Word, "Unit", ExtractionMethod::WordBoxes)
                .with_line(1),
            ExtractedRecord::new(1, ContentType::Word, "a", ExtractionMethod::WordBoxes)
                .with_line(2),
        ];
        let lines = outline_input(Vec::new(), Vec::new(), &words, 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "a");
    }
}
