//! Pipeline integration tests over in-memory documents.
//!
//! No pdfium and no tesseract: pages come from [`FakeDocument`] and OCR
//! output from [`ScriptedEngine`], so these run everywhere.

use image::DynamicImage;
use pdf2rows::source::{AnnotationInfo, ImageInfo, RawTable, Word};
use pdf2rows::{
    extract_from_source, inspect_source, ContentKind, ContentType, DocumentMethod,
    DocumentSource, ExtractError, ExtractionConfig, ExtractionMethod,
    ExtractionProgressCallback, OcrEngine, OcrError, PageError, Segment, SourceError,
    StructureLevel, TableSettings, Workbook,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ── Test doubles ─────────────────────────────────────────────────────────────

#[derive(Default, Clone)]
struct FakePage {
    text: String,
    words: Vec<Word>,
    tables: Vec<RawTable>,
    images: Vec<ImageInfo>,
    text_fails: bool,
    raster_fails: bool,
}

impl FakePage {
    fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    fn blank() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct FakeDocument {
    pages: Vec<FakePage>,
    count_fails: bool,
}

impl FakeDocument {
    fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            count_fails: false,
        }
    }

    fn page(&self, index: usize) -> Result<&FakePage, SourceError> {
        self.pages.get(index).ok_or(SourceError::PageOutOfRange {
            index,
            total: self.pages.len(),
        })
    }
}

impl DocumentSource for FakeDocument {
    fn page_count(&self) -> Result<usize, SourceError> {
        if self.count_fails {
            return Err(SourceError::Backend("trailer is corrupt".into()));
        }
        Ok(self.pages.len())
    }

    fn page_text(&self, index: usize) -> Result<String, SourceError> {
        let page = self.page(index)?;
        if page.text_fails {
            return Err(SourceError::Backend("broken content stream".into()));
        }
        Ok(page.text.clone())
    }

    fn page_words(&self, index: usize) -> Result<Vec<Word>, SourceError> {
        Ok(self.page(index)?.words.clone())
    }

    fn page_tables(
        &self,
        index: usize,
        _settings: &TableSettings,
    ) -> Result<Vec<RawTable>, SourceError> {
        Ok(self.page(index)?.tables.clone())
    }

    fn page_images(&self, index: usize) -> Result<Vec<ImageInfo>, SourceError> {
        Ok(self.page(index)?.images.clone())
    }

    fn page_annotations(&self, index: usize) -> Result<Vec<AnnotationInfo>, SourceError> {
        self.page(index)?;
        Ok(Vec::new())
    }

    fn rasterize(&self, index: usize, _dpi: u32) -> Result<DynamicImage, SourceError> {
        if self.page(index)?.raster_fails {
            return Err(SourceError::Backend("render failed".into()));
        }
        Ok(DynamicImage::new_rgb8(8, 8))
    }
}

/// Returns canned text per segmentation mode and remembers every image path
/// it was given.
struct ScriptedEngine {
    available: bool,
    outputs: HashMap<u8, String>,
    seen: Mutex<Vec<PathBuf>>,
}

impl ScriptedEngine {
    fn new(outputs: &[(u8, &str)]) -> Arc<Self> {
        Arc::new(Self {
            available: true,
            outputs: outputs.iter().map(|(p, t)| (*p, t.to_string())).collect(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            outputs: HashMap::new(),
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn recognize(&self, image: &Path, psm: u8) -> Result<String, OcrError> {
        assert!(image.exists(), "raster {} should exist", image.display());
        self.seen.lock().unwrap().push(image.to_path_buf());
        self.outputs
            .get(&psm)
            .cloned()
            .ok_or_else(|| OcrError::Failed(format!("psm {psm} not scripted")))
    }
}

fn config_with(engine: Arc<ScriptedEngine>) -> ExtractionConfig {
    ExtractionConfig::builder()
        .ocr_engine(engine as Arc<dyn OcrEngine>)
        .build()
        .unwrap()
}

fn cell(s: &str) -> Option<String> {
    Some(s.to_string())
}

const LONG_TEXT: &str = "Course outline for the autumn term\nAssessment is by coursework and a final written exam";

// ── Coverage ─────────────────────────────────────────────────────────────────

#[test]
fn every_page_is_represented() {
    let doc = FakeDocument::new(vec![
        FakePage::text(LONG_TEXT),
        FakePage::blank(),
        FakePage::text("Reading list and further material for the course"),
    ]);
    let result =
        extract_from_source(&doc, "outline.pdf", &config_with(ScriptedEngine::unavailable()))
            .unwrap();

    assert_eq!(result.total_pages, 3);
    assert_eq!(result.content_kind, ContentKind::TextBased);
    assert_eq!(result.method, DocumentMethod::Structured);
    assert_eq!(result.placeholder_pages, vec![2]);
    assert!((result.completeness_before - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(result.completeness_score, 100.0);
    assert_eq!(
        result.covered_pages().into_iter().collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let placeholders = result.records_of(ContentType::EmptyPage);
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].page, 2);
    assert_eq!(placeholders[0].text, "[Page 2 - No extractable content found]");
    assert_eq!(placeholders[0].method, ExtractionMethod::Placeholder);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
}

#[test]
fn summary_segment_comes_first() {
    let doc = FakeDocument::new(vec![FakePage::text(LONG_TEXT), FakePage::blank()]);
    let result =
        extract_from_source(&doc, "doc.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();

    let Segment::Summary(ref summaries) = result.segments[0] else {
        panic!("first segment should be the summary");
    };
    assert_eq!(summaries.len(), 2);
    assert_eq!(
        summaries[0].text,
        "Page 1: 2 total items, Content types: Text_Line"
    );
    assert_eq!(
        summaries[1].text,
        "Page 2: 1 total items, Content types: Empty_Page"
    );

    let pages: Vec<usize> = result.segments[1..].iter().filter_map(Segment::page).collect();
    let mut sorted = pages.clone();
    sorted.sort();
    assert_eq!(pages, sorted);
}

#[test]
fn text_lines_are_trimmed_and_numbered() {
    let doc = FakeDocument::new(vec![FakePage::text(
        "  Module handbook 2024 edition for all students\n\n   Weekly schedule and contact hours listed below  \n",
    )]);
    let result =
        extract_from_source(&doc, "doc.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();
    let lines = result.records_of(ContentType::TextLine);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "Module handbook 2024 edition for all students");
    assert_eq!(lines[1].text, "Weekly schedule and contact hours listed below");
    assert!(lines[0].line_number < lines[1].line_number);
}

// ── Tables ───────────────────────────────────────────────────────────────────

#[test]
fn single_row_table_gets_synthesized_headers() {
    let mut page = FakePage::text(LONG_TEXT);
    page.tables = vec![vec![vec![cell("Week 1"), cell("Introduction")]]];
    let doc = FakeDocument::new(vec![page]);
    let result =
        extract_from_source(&doc, "doc.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();

    let tables: Vec<_> = result.tables().collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(
        tables[0].headers,
        vec!["Page", "Table_Index", "Column_1", "Column_2"]
    );
    assert_eq!(tables[0].rows, vec![vec!["1", "1", "Week 1", "Introduction"]]);
    assert_eq!(tables[0].method, ExtractionMethod::TableGrid);
}

#[test]
fn malformed_table_does_not_stop_the_page() {
    let mut page = FakePage::text(LONG_TEXT);
    page.tables = vec![
        vec![
            vec![cell("Week"), cell("Topic")],
            vec![cell("1"), cell("Sets"), cell("overflow")],
        ],
        vec![
            vec![cell("Name"), None, cell("Name")],
            vec![cell("Exam"), cell("60%")],
        ],
    ];
    let doc = FakeDocument::new(vec![page]);
    let result =
        extract_from_source(&doc, "doc.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();

    let tables: Vec<_> = result.tables().collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].table_index, 2);
    assert_eq!(
        tables[0].headers,
        vec!["Page", "Table_Index", "Name", "Column_2", "Name_1"]
    );
    assert_eq!(tables[0].rows[0], vec!["1", "2", "Exam", "60%", ""]);

    assert_eq!(result.warnings.len(), 1);
    assert!(matches!(
        result.warnings[0],
        PageError::TableMalformed { page: 1, table: 1, .. }
    ));
    assert_eq!(result.records_of(ContentType::TextLine).len(), 2);
}

#[test]
fn failing_stage_is_isolated_to_its_page() {
    let mut broken = FakePage::text(LONG_TEXT);
    broken.text_fails = true;
    broken.words = vec![Word::new("Syllabus", 10.0, 10.0, 60.0, 22.0)];
    let doc = FakeDocument::new(vec![FakePage::text(LONG_TEXT), broken]);
    let result =
        extract_from_source(&doc, "doc.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();

    // an unreadable text layer routes the document to OCR
    assert_eq!(result.content_kind, ContentKind::ImageBased);
    assert!(matches!(
        result.warnings.as_slice(),
        [
            PageError::TextFailed { page: 2, .. },
            PageError::OcrUnavailable { .. }
        ]
    ));
    assert_eq!(result.method, DocumentMethod::Structured);
    let words = result.records_of(ContentType::Word);
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].page, 2);
    assert!(words[0].position.is_some());
    assert!(result.placeholder_pages.is_empty());
}

// ── OCR ──────────────────────────────────────────────────────────────────────

#[test]
fn ocr_keeps_the_longest_output() {
    let engine = ScriptedEngine::new(&[
        (6, "Unit"),
        (3, "UNIT I Number systems\nBinary and hexadecimal\nx"),
        (4, ""),
    ]);
    let doc = FakeDocument::new(vec![FakePage::blank(), FakePage::blank()]);
    let result = extract_from_source(&doc, "scan.pdf", &config_with(engine.clone())).unwrap();

    assert_eq!(result.content_kind, ContentKind::ImageBased);
    assert_eq!(result.method, DocumentMethod::Ocr);
    assert!(result.placeholder_pages.is_empty());
    assert_eq!(result.completeness_score, 100.0);

    let ocr = result.records_of(ContentType::OcrText);
    // "x" is shorter than the default minimum line length
    assert_eq!(ocr.len(), 4);
    assert!(ocr
        .iter()
        .all(|r| r.method == ExtractionMethod::Ocr { psm: 3 }));
    assert_eq!(ocr[0].text, "UNIT I Number systems");

    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.len(), 6, "three modes on each of two pages");
    for path in seen.iter() {
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists(), "scratch dir removed");
    }
}

#[test]
fn ocr_supplements_structured_content_on_scans() {
    let mut scanned = FakePage::blank();
    scanned.images = vec![ImageInfo {
        position: pdf2rows::output::Position {
            x: 0.0,
            y: 0.0,
            width: 595.0,
            height: 842.0,
        },
        pixel_size: Some((2480, 3508)),
    }];
    let engine = ScriptedEngine::new(&[(6, "Scanned lecture notes")]);
    let config = ExtractionConfig::builder()
        .ocr_engine(engine as Arc<dyn OcrEngine>)
        .ocr_psm_modes(vec![6])
        .build()
        .unwrap();
    let result = extract_from_source(&doc_of(scanned), "scan.pdf", &config).unwrap();

    assert_eq!(result.method, DocumentMethod::Hybrid);
    assert_eq!(result.records_of(ContentType::Image)[0].text, "[Image 1: 2480x3508]");
    assert_eq!(result.records_of(ContentType::OcrText).len(), 1);
}

fn doc_of(page: FakePage) -> FakeDocument {
    FakeDocument::new(vec![page])
}

#[test]
fn unavailable_ocr_degrades_to_placeholders() {
    let doc = FakeDocument::new(vec![FakePage::blank(), FakePage::blank()]);
    let result =
        extract_from_source(&doc, "scan.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();

    assert_eq!(result.completeness_before, 0.0);
    assert_eq!(result.completeness_score, 100.0);
    assert_eq!(result.placeholder_pages, vec![1, 2]);
    assert!(result
        .warnings
        .iter()
        .any(|w| matches!(w, PageError::OcrUnavailable { .. })));
}

#[test]
fn ocr_failure_on_every_mode_is_a_page_warning() {
    let engine = ScriptedEngine::new(&[]);
    let doc = FakeDocument::new(vec![FakePage::blank()]);
    let result = extract_from_source(&doc, "scan.pdf", &config_with(engine)).unwrap();

    assert!(matches!(
        result.warnings.as_slice(),
        [PageError::OcrFailed { page: 1, .. }]
    ));
    assert_eq!(result.placeholder_pages, vec![1]);
}

#[test]
fn scratch_dir_is_removed_when_recognition_fails() {
    let engine = ScriptedEngine::new(&[]);
    let doc = FakeDocument::new(vec![FakePage::blank()]);
    let result = extract_from_source(&doc, "scan.pdf", &config_with(engine.clone())).unwrap();
    assert!(matches!(
        result.warnings.as_slice(),
        [PageError::OcrFailed { page: 1, .. }]
    ));

    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.len(), 3, "every mode was tried");
    let scratch = seen[0].parent().unwrap();
    assert!(!seen[0].exists());
    assert!(!scratch.exists(), "{} still exists", scratch.display());
}

#[test]
fn scratch_dir_is_removed_when_rasterisation_fails() {
    let mut unrenderable = FakePage::blank();
    unrenderable.raster_fails = true;
    let engine = ScriptedEngine::new(&[]);
    let doc = FakeDocument::new(vec![FakePage::blank(), unrenderable]);
    let result = extract_from_source(&doc, "scan.pdf", &config_with(engine.clone())).unwrap();

    assert!(matches!(
        result.warnings.as_slice(),
        [
            PageError::OcrFailed { page: 1, .. },
            PageError::RasterFailed { page: 2, .. }
        ]
    ));
    assert_eq!(result.placeholder_pages, vec![1, 2]);

    // page 1 reveals where the scratch directory was; the run ended on
    // page 2's failure
    let seen = engine.seen.lock().unwrap();
    let scratch = seen[0].parent().unwrap();
    assert!(!scratch.exists(), "{} still exists", scratch.display());
}

#[test]
fn column_aligned_ocr_text_becomes_a_table() {
    let engine = ScriptedEngine::new(&[(6, "Week  Topic  Hours\n1  Sets  4\n2  Logic  6")]);
    let config = ExtractionConfig::builder()
        .ocr_engine(engine as Arc<dyn OcrEngine>)
        .ocr_psm_modes(vec![6])
        .build()
        .unwrap();
    let result = extract_from_source(&doc_of(FakePage::blank()), "scan.pdf", &config).unwrap();

    assert_eq!(result.method, DocumentMethod::Ocr);
    let tables: Vec<_> = result.tables().collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(
        tables[0].headers,
        vec!["Page", "Table_Index", "Week", "Topic", "Hours"]
    );
    assert_eq!(
        tables[0].rows,
        vec![vec!["1", "1", "1", "Sets", "4"], vec!["1", "1", "2", "Logic", "6"]]
    );
    assert_eq!(tables[0].method, ExtractionMethod::Ocr { psm: 6 });
    assert_eq!(result.stats.tables, 1);
    // the lines are still kept as text
    assert_eq!(result.records_of(ContentType::OcrText).len(), 3);
}

#[test]
fn ocr_table_is_numbered_after_structured_tables() {
    let mut scanned = FakePage::blank();
    scanned.tables = vec![vec![vec![cell("Room"), cell("Day")], vec![cell("B12"), cell("Mon")]]];
    let engine = ScriptedEngine::new(&[(6, "Week  Topic\n1  Sets")]);
    let config = ExtractionConfig::builder()
        .ocr_engine(engine as Arc<dyn OcrEngine>)
        .ocr_psm_modes(vec![6])
        .build()
        .unwrap();
    let result = extract_from_source(&doc_of(scanned), "scan.pdf", &config).unwrap();

    assert_eq!(result.method, DocumentMethod::Hybrid);
    let tables: Vec<_> = result.tables().collect();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].method, ExtractionMethod::TableGrid);
    assert_eq!(tables[1].table_index, 2);
    assert_eq!(tables[1].rows, vec![vec!["1", "2", "1", "Sets"]]);
}

// ── Outline ──────────────────────────────────────────────────────────────────

#[test]
fn outline_from_text_lines() {
    let doc = FakeDocument::new(vec![FakePage::text(
        "1. Foundations of logic\na) Propositions and truth\nTruth tables are covered here",
    )]);
    let config = ExtractionConfig::builder()
        .ocr_engine(ScriptedEngine::unavailable() as Arc<dyn OcrEngine>)
        .build_outline(true)
        .build()
        .unwrap();
    let result = extract_from_source(&doc, "syllabus.pdf", &config).unwrap();

    let outline = result.outline.expect("outline requested");
    assert!(!outline.reconstructed);
    let levels: Vec<StructureLevel> = outline.nodes.iter().map(|n| n.level).collect();
    assert_eq!(
        levels,
        vec![
            StructureLevel::UnitHeader,
            StructureLevel::TopicHeader,
            StructureLevel::Content
        ]
    );
    let content = &outline.nodes[2];
    assert_eq!(content.unit, "Unit 1: Foundations of logic");
    assert_eq!(content.topic, "Propositions and truth");
    assert_eq!(content.subtopic, "");
    assert_eq!(content.content, "Truth tables are covered here");
}

#[test]
fn outline_is_absent_unless_requested() {
    let doc = FakeDocument::new(vec![FakePage::text(LONG_TEXT)]);
    let result =
        extract_from_source(&doc, "doc.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();
    assert!(result.outline.is_none());
}

// ── Errors, progress, projections ────────────────────────────────────────────

#[test]
fn unreadable_document_is_fatal() {
    let doc = FakeDocument {
        pages: Vec::new(),
        count_fails: true,
    };
    let err = extract_from_source(&doc, "broken.pdf", &ExtractionConfig::default()).unwrap_err();
    assert!(matches!(err, ExtractError::Unreadable { .. }), "got {err:?}");
}

#[test]
fn empty_document_is_complete() {
    let doc = FakeDocument::new(Vec::new());
    let result =
        extract_from_source(&doc, "empty.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();
    assert_eq!(result.total_pages, 0);
    assert_eq!(result.completeness_score, 100.0);
    assert!(result.placeholder_pages.is_empty());
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl ExtractionProgressCallback for RecordingCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.events.lock().unwrap().push(format!("start {total_pages}"));
    }

    fn on_page_complete(&self, page_num: usize, _total_pages: usize, _items: usize) {
        self.events.lock().unwrap().push(format!("page {page_num}"));
    }

    fn on_page_warning(&self, page_num: usize, _total_pages: usize, _warning: &str) {
        self.events.lock().unwrap().push(format!("warn {page_num}"));
    }

    fn on_extraction_complete(&self, total_pages: usize, placeholder_pages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {total_pages} {placeholder_pages}"));
    }
}

#[test]
fn progress_events_in_order() {
    let mut broken = FakePage::blank();
    broken.text_fails = true;
    let doc = FakeDocument::new(vec![FakePage::text(LONG_TEXT), broken]);
    let cb = Arc::new(RecordingCallback::default());
    let config = ExtractionConfig::builder()
        .ocr_engine(ScriptedEngine::unavailable() as Arc<dyn OcrEngine>)
        .progress_callback(cb.clone())
        .build()
        .unwrap();
    extract_from_source(&doc, "doc.pdf", &config).unwrap();

    let events = cb.events.lock().unwrap();
    assert_eq!(
        *events,
        vec!["start 2", "page 1", "warn 2", "page 2", "done 2 1"]
    );
}

#[test]
fn inspect_reports_content_kind() {
    let doc = FakeDocument::new(vec![FakePage::blank(), FakePage::text(LONG_TEXT)]);
    let info = inspect_source(&doc, "doc.pdf", &ExtractionConfig::default()).unwrap();
    assert_eq!(info.total_pages, 2);
    assert_eq!(info.content_kind, ContentKind::TextBased);
    assert_eq!(info.text_chars_per_page[0], Some(0));
}

#[test]
fn workbook_from_result() {
    let mut page = FakePage::text(LONG_TEXT);
    page.tables = vec![vec![
        vec![cell("Week"), cell("Topic")],
        vec![cell("1"), cell("Sets")],
    ]];
    let doc = FakeDocument::new(vec![page, FakePage::blank()]);
    let result =
        extract_from_source(&doc, "doc.pdf", &config_with(ScriptedEngine::unavailable())).unwrap();
    let book = Workbook::from_result(&result);

    let names: Vec<&str> = book.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Summary", "Page_Summary", "Table_1_1", "Text_Line", "Empty_Page"]
    );
    assert_eq!(book.sheet("Page_Summary").unwrap().rows.len(), 2);
    assert_eq!(
        book.sheet("Table_1_1").unwrap().headers,
        vec!["Page", "Table_Index", "Week", "Topic"]
    );
    let empty = book.sheet("Empty_Page").unwrap();
    assert_eq!(empty.rows[0][0], "2");
    assert_eq!(empty.rows[0][4], "placeholder");
}
