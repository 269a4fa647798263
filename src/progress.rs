//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline walks the document. Callers can forward them to a
//! channel, a log, or a terminal progress bar without the library knowing how
//! the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use pdf2rows::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, items: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} items", page_num, total_pages, items);
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// pipeline runs on a blocking worker thread.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the page count is known.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before the structured stages run on a page.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when every structured stage has run on a page.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages
    /// * `items`       — records plus tables produced for the page
    fn on_page_complete(&self, page_num: usize, total_pages: usize, items: usize) {
        let _ = (page_num, total_pages, items);
    }

    /// Called for every non-fatal page, table or stage failure.
    fn on_page_warning(&self, page_num: usize, total_pages: usize, warning: &str) {
        let _ = (page_num, total_pages, warning);
    }

    /// Called when the OCR fallback starts, with the number of pages it
    /// will rasterise.
    fn on_ocr_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page has been recognised.
    fn on_ocr_page_complete(&self, page_num: usize, total_pages: usize, lines: usize) {
        let _ = (page_num, total_pages, lines);
    }

    /// Called once after reconciliation and consolidation.
    ///
    /// # Arguments
    /// * `total_pages`       — total pages in the document
    /// * `placeholder_pages` — pages that needed an `Empty_Page` placeholder
    fn on_extraction_complete(&self, total_pages: usize, placeholder_pages: usize) {
        let _ = (total_pages, placeholder_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
