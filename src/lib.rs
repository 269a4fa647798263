//! # pdf2rows
//!
//! Extract the content of PDF documents, whether born-digital or scanned,
//! as tabular records, with a guarantee that every page shows up in the
//! output.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate the path and the %PDF magic
//!  ├─ 2. Detect     text-based or image-based?
//!  ├─ 3. Tables     pdfplumber stream / lattice table regions per page
//!  ├─ 4. Text       normalised text lines and word boxes per page
//!  ├─ 5. Residual   images and annotations per page
//!  ├─ 6. OCR        tesseract fallback, column-aligned lines become tables
//!  ├─ 7. Reconcile  placeholder record for every page left empty
//!  ├─ 8. Outline    optional unit / topic / subtopic classification
//!  └─ 9. Output     page summaries, then per-page tables and record groups
//! ```
//!
//! Every strategy runs on every page; coverage is maximised rather than
//! stopping at the first strategy that yields something. A failure on one
//! page, stage or table is recorded as a warning and the run continues.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2rows::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder().build_outline(true).build()?;
//!     let result = extract("syllabus.pdf", &config).await?;
//!     println!(
//!         "{} pages, {:.0}% complete, {} tables",
//!         result.total_pages,
//!         result.completeness_score,
//!         result.stats.tables
//!     );
//!     for record in result.records() {
//!         println!("p{} [{}] {}", record.page, record.content_type, record.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2rows` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Runtime Requirements
//!
//! * a pdfium shared library (`PDFIUM_LIB_PATH`, the working directory, or
//!   the system library path)
//! * the `tesseract` executable for the OCR fallback; without it scanned
//!   pages come back as placeholders and a warning is recorded

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sheets;
pub mod source;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    DetectionPolicy, ExtractionConfig, ExtractionConfigBuilder, TableSettings, TableStrategy,
};
pub use error::{ExtractError, OcrError, PageError, SourceError};
pub use extract::{
    extract, extract_from_bytes, extract_from_source, extract_sync, extract_to_file, inspect,
    inspect_source, render_json, OutputFormat,
};
pub use outline::{Outline, OutlineLine, StructureLevel, StructureNode};
pub use output::{
    ContentKind, ContentType, DocumentInfo, DocumentMethod, ExtractedRecord, ExtractionMethod,
    ExtractionResult, ExtractionStats, Position, Segment, Table,
};
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use sheets::{Sheet, Workbook};
pub use source::{DocumentSource, PdfiumDocument};
