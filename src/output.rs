//! Output types produced by an extraction run.
//!
//! Everything here is plain data: created once by the pipeline, never
//! mutated afterwards, and `serde`-serialisable so the CLI can dump a whole
//! [`ExtractionResult`] as JSON.

use crate::error::PageError;
use crate::outline::Outline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Whether a document carries a machine-readable text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    TextBased,
    ImageBased,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::TextBased => f.write_str("text-based"),
            ContentKind::ImageBased => f.write_str("image-based"),
        }
    }
}

/// Tag attached to every record and used to group records per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "Text_Line")]
    TextLine,
    #[serde(rename = "Word")]
    Word,
    #[serde(rename = "Image")]
    Image,
    #[serde(rename = "Annotation")]
    Annotation,
    #[serde(rename = "OCR_Text")]
    OcrText,
    #[serde(rename = "Empty_Page")]
    EmptyPage,
    #[serde(rename = "Page_Summary")]
    PageSummary,
    /// Only appears in page summaries; tables are not records.
    #[serde(rename = "Table")]
    Table,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::TextLine => "Text_Line",
            ContentType::Word => "Word",
            ContentType::Image => "Image",
            ContentType::Annotation => "Annotation",
            ContentType::OcrText => "OCR_Text",
            ContentType::EmptyPage => "Empty_Page",
            ContentType::PageSummary => "Page_Summary",
            ContentType::Table => "Table",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced a record or table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    TableGrid,
    PageText,
    WordBoxes,
    ImageObject,
    Annotation,
    /// Tesseract run under the given page-segmentation mode.
    Ocr { psm: u8 },
    Placeholder,
    Summary,
}

impl ExtractionMethod {
    /// Short stable tag used in sheet cells and logs.
    pub fn tag(&self) -> String {
        match self {
            ExtractionMethod::TableGrid => "table_grid".into(),
            ExtractionMethod::PageText => "page_text".into(),
            ExtractionMethod::WordBoxes => "word_boxes".into(),
            ExtractionMethod::ImageObject => "image_object".into(),
            ExtractionMethod::Annotation => "annotation".into(),
            ExtractionMethod::Ocr { psm } => format!("tesseract_psm_{psm}"),
            ExtractionMethod::Placeholder => "placeholder".into(),
            ExtractionMethod::Summary => "page_summary".into(),
        }
    }
}

/// Which family of strategies the document as a whole relied on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentMethod {
    /// Tables, text, words and residual objects only.
    Structured,
    /// Only OCR produced content.
    Ocr,
    /// Both structured extraction and OCR contributed.
    Hybrid,
}

/// Bounding box in PDF points, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One extracted unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// 1-indexed page number.
    pub page: usize,
    pub content_type: ContentType,
    pub text: String,
    pub method: ExtractionMethod,
    /// Sequential line or item number within the page, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ExtractedRecord {
    pub fn new(
        page: usize,
        content_type: ContentType,
        text: impl Into<String>,
        method: ExtractionMethod,
    ) -> Self {
        Self {
            page,
            content_type,
            text: text.into(),
            method,
            line_number: None,
            position: None,
        }
    }

    pub fn with_line(mut self, n: usize) -> Self {
        self.line_number = Some(n);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// Column name added to table headers carrying the page number.
pub const PAGE_COLUMN: &str = "Page";
/// Column name added to table headers carrying the 1-based table index.
pub const TABLE_INDEX_COLUMN: &str = "Table_Index";

/// A table detected on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub page: usize,
    /// 1-based index of the table on its page.
    pub table_index: usize,
    /// Sanitized, unique header labels.
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` cells wide.
    pub rows: Vec<Vec<String>>,
    /// `TableGrid` for tables read from the PDF structure, `Ocr` for
    /// tables split out of recognised text.
    pub method: ExtractionMethod,
}

impl Table {
    /// Index of the column with the given header label.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// An ordered block of the consolidated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// One `Page_Summary` record per page, in page order.
    Summary(Vec<ExtractedRecord>),
    Table(Table),
    /// All records of one content type on one page.
    Records {
        page: usize,
        content_type: ContentType,
        records: Vec<ExtractedRecord>,
    },
}

impl Segment {
    /// Records carried by the segment; empty for tables.
    pub fn records(&self) -> &[ExtractedRecord] {
        match self {
            Segment::Summary(r) => r,
            Segment::Records { records, .. } => records,
            Segment::Table(_) => &[],
        }
    }

    pub fn page(&self) -> Option<usize> {
        match self {
            Segment::Summary(_) => None,
            Segment::Table(t) => Some(t.page),
            Segment::Records { page, .. } => Some(*page),
        }
    }
}

/// Counters collected while the pipeline runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub tables: usize,
    pub text_lines: usize,
    pub words: usize,
    pub residual_items: usize,
    pub ocr_lines: usize,
    pub placeholders: usize,
    pub warnings: usize,
    /// Wall-clock time for the whole run in milliseconds.
    pub total_duration_ms: u64,
    /// Time spent rasterising and recognising pages in milliseconds.
    pub ocr_duration_ms: u64,
}

/// Final result of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub path: PathBuf,
    pub total_pages: usize,
    pub content_kind: ContentKind,
    pub method: DocumentMethod,
    /// Summary segment first, then per-page segments in page order.
    pub segments: Vec<Segment>,
    /// Page coverage before placeholders were added, 0–100.
    pub completeness_before: f64,
    /// Page coverage of the final result, 0–100.
    pub completeness_score: f64,
    /// Pages that received an `Empty_Page` placeholder.
    pub placeholder_pages: Vec<usize>,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<PageError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Outline>,
    pub stats: ExtractionStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExtractionResult {
    /// All records in output order, summaries included.
    pub fn records(&self) -> impl Iterator<Item = &ExtractedRecord> {
        self.segments.iter().flat_map(Segment::records)
    }

    /// All tables in output order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Distinct pages carrying at least one content record or table.
    ///
    /// Summary records are excluded: they describe coverage, they do not
    /// provide it.
    pub fn covered_pages(&self) -> BTreeSet<usize> {
        let mut pages: BTreeSet<usize> = self
            .records()
            .filter(|r| r.content_type != ContentType::PageSummary)
            .map(|r| r.page)
            .collect();
        pages.extend(self.tables().map(|t| t.page));
        pages
    }

    /// Records of a single content type, in output order.
    pub fn records_of(&self, ct: ContentType) -> Vec<&ExtractedRecord> {
        self.records().filter(|r| r.content_type == ct).collect()
    }
}

/// Lightweight document facts returned by [`crate::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub total_pages: usize,
    pub content_kind: ContentKind,
    /// Trimmed character count of each page's text layer; `None` where the
    /// text could not be read.
    pub text_chars_per_page: Vec<Option<usize>>,
}
