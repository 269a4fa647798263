//! Read access to a PDF document.
//!
//! The pipeline never talks to pdfium directly; it consumes the
//! [`DocumentSource`] trait. [`PdfiumDocument`] is the production
//! implementation, and tests drive the pipeline with in-memory sources.
//!
//! Page indices at this boundary are **0-based** (pdfium's convention);
//! everything the pipeline emits uses 1-based page numbers.

pub mod geometry;
pub mod pdfium;

pub use pdfium::{bind_pdfium, PdfiumDocument};
pub use geometry::{plumber_settings, PageGeometry};

use crate::config::TableSettings;
use crate::error::SourceError;
use crate::output::Position;
use image::DynamicImage;

/// A table as returned by the PDF capability: rows of possibly-empty cells.
/// Rows may have different lengths.
pub type RawTable = Vec<Vec<Option<String>>>;

/// One whitespace-delimited token with its bounding box (points, origin
/// top-left).
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.x0,
            y: self.top,
            width: self.width(),
            height: self.height(),
        }
    }
}

/// An embedded raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub position: Position,
    /// Intrinsic pixel size, when the backend can report it.
    pub pixel_size: Option<(u32, u32)>,
}

impl ImageInfo {
    /// Pixel size if known, else the on-page size in whole points.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixel_size.unwrap_or((
            self.position.width.round().max(0.0) as u32,
            self.position.height.round().max(0.0) as u32,
        ))
    }
}

/// A page annotation (link, highlight, note, widget…).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationInfo {
    /// Annotation subtype, e.g. `"Link"` or `"Highlight"`.
    pub subtype: String,
    pub position: Option<Position>,
    pub contents: Option<String>,
}

/// Read-only access to the pages of one document.
///
/// Every method is a single request for a single page; an `Err` affects only
/// that request, which lets the pipeline isolate failures per page and per
/// stage.
pub trait DocumentSource {
    /// Number of pages. An error here is fatal for the run.
    fn page_count(&self) -> Result<usize, SourceError>;

    /// Plain text of the page in reading order, lines separated by `\n`.
    fn page_text(&self, index: usize) -> Result<String, SourceError>;

    /// Word tokens with bounding boxes.
    fn page_words(&self, index: usize) -> Result<Vec<Word>, SourceError>;

    /// Table regions detected with the given geometry settings.
    fn page_tables(
        &self,
        index: usize,
        settings: &TableSettings,
    ) -> Result<Vec<RawTable>, SourceError>;

    /// Embedded image descriptors.
    fn page_images(&self, index: usize) -> Result<Vec<ImageInfo>, SourceError>;

    /// Annotation descriptors.
    fn page_annotations(&self, index: usize) -> Result<Vec<AnnotationInfo>, SourceError>;

    /// Render the page at the given resolution for OCR.
    fn rasterize(&self, index: usize, dpi: u32) -> Result<DynamicImage, SourceError>;
}
