//! Error types for the pdf2rows library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: extraction cannot proceed at all (input
//!   missing, not a PDF, pages cannot be enumerated). Returned as
//!   `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page, table or stage failed but
//!   the rest of the document is fine. Collected in
//!   [`crate::output::ExtractionResult::warnings`]; the missing coverage is
//!   compensated by placeholder records.
//!
//! The capability traits have their own narrow error types ([`SourceError`],
//! [`OcrError`]) which the pipeline converts into one of the above.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2rows library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be opened or its pages enumerated
    /// (corrupt structure, missing or wrong password).
    #[error("PDF '{path}' could not be read: {detail}")]
    Unreadable { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium, or install pdfium\n\
system-wide so it can be found by the dynamic loader.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Run errors ────────────────────────────────────────────────────────
    /// The caller-level timeout elapsed before extraction finished.
    #[error("Extraction timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// True when the input path does not resolve to a readable document.
    ///
    /// This is the only class of failure the pipeline lets escape; every
    /// other problem becomes a [`PageError`] warning.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExtractError::FileNotFound { .. }
                | ExtractError::PermissionDenied { .. }
                | ExtractError::NotAPdf { .. }
                | ExtractError::Unreadable { .. }
        )
    }
}

/// A non-fatal error for a single page, table or stage.
///
/// Stored in [`crate::output::ExtractionResult::warnings`]. The run
/// continues with the next table or page.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Table regions could not be requested for the page.
    #[error("Page {page}: table detection failed: {detail}")]
    TablesFailed { page: usize, detail: String },

    /// A single table could not be shaped into header + rows.
    #[error("Page {page}, table {table}: {detail}")]
    TableMalformed {
        page: usize,
        table: usize,
        detail: String,
    },

    /// Full page text could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextFailed { page: usize, detail: String },

    /// Word boxes could not be read.
    #[error("Page {page}: word extraction failed: {detail}")]
    WordsFailed { page: usize, detail: String },

    /// Image or annotation descriptors could not be read.
    #[error("Page {page}: residual content extraction failed: {detail}")]
    ResidualFailed { page: usize, detail: String },

    /// The page could not be rasterised for OCR.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RasterFailed { page: usize, detail: String },

    /// The OCR engine failed on every segmentation mode for the page.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// No OCR engine is configured or reachable; OCR was skipped.
    #[error("OCR engine unavailable: {detail}")]
    OcrUnavailable { detail: String },
}

impl PageError {
    /// The 1-based page the error refers to, if it is page-scoped.
    pub fn page(&self) -> Option<usize> {
        match self {
            PageError::TablesFailed { page, .. }
            | PageError::TableMalformed { page, .. }
            | PageError::TextFailed { page, .. }
            | PageError::WordsFailed { page, .. }
            | PageError::ResidualFailed { page, .. }
            | PageError::RasterFailed { page, .. }
            | PageError::OcrFailed { page, .. } => Some(*page),
            PageError::OcrUnavailable { .. } => None,
        }
    }
}

/// Error reported by a [`crate::source::DocumentSource`] for one request.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("page {index} out of range (document has {total} pages)")]
    PageOutOfRange { index: usize, total: usize },

    #[error("{0}")]
    Backend(String),
}

/// Error reported by a [`crate::pipeline::ocr::OcrEngine`].
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// Engine binary missing or not runnable.
    #[error("OCR engine not available: {0}")]
    Unavailable(String),

    /// Engine ran but recognition failed.
    #[error("recognition failed: {0}")]
    Failed(String),
}
