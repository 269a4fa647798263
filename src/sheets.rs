//! Projection of an [`ExtractionResult`] onto named sheets.
//!
//! A [`Workbook`] is what a spreadsheet writer needs: an ordered list of
//! sheets, each a header row plus string rows. Binary spreadsheet output is
//! left to the caller; the workbook serialises to JSON as is.
//!
//! Sheet order:
//!
//! | Sheet | Contents |
//! |---|---|
//! | `Summary` | run properties (file, method, completeness, …) |
//! | `Page_Summary` | one row per page |
//! | `Table_{page}_{n}` | one sheet per table |
//! | `Text_Line`, `Word`, … | one sheet per record content type |
//! | `Syllabus_Organized`, `Unit_Summary`, `Topics_Only` | outline, when built |
//! | `Warnings` | non-fatal problems, when any |

use crate::outline::{Outline, StructureNode};
use crate::output::{ContentType, ExtractedRecord, ExtractionResult, Segment};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const INVALID_SHEET_CHARS: [char; 7] = ['\\', '/', '*', '?', ':', '[', ']'];

/// One named sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// An ordered list of sheets with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    #[serde(skip)]
    taken: HashSet<String>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet; the name is made valid and unique first.
    pub fn push(&mut self, name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) {
        let name = unique_sheet_name(name, &self.taken);
        self.taken.insert(name.clone());
        self.sheets.push(Sheet {
            name,
            headers,
            rows,
        });
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Lay out a whole extraction result.
    pub fn from_result(result: &ExtractionResult) -> Self {
        let mut book = Self::new();

        book.push("Summary", strings(&["Property", "Value"]), summary_rows(result));

        for segment in &result.segments {
            if let Segment::Summary(records) = segment {
                let rows = records
                    .iter()
                    .map(|r| vec![r.page.to_string(), r.text.clone()])
                    .collect();
                book.push("Page_Summary", strings(&["Page", "Summary"]), rows);
            }
        }

        for table in result.tables() {
            book.push(
                &format!("Table_{}_{}", table.page, table.table_index),
                table.headers.clone(),
                table.rows.clone(),
            );
        }

        let mut types: Vec<ContentType> = Vec::new();
        for r in result.records() {
            if r.content_type != ContentType::PageSummary && !types.contains(&r.content_type) {
                types.push(r.content_type);
            }
        }
        types.sort();
        for ct in types {
            let rows = result.records_of(ct).into_iter().map(record_row).collect();
            book.push(ct.as_str(), record_headers(), rows);
        }

        if let Some(ref outline) = result.outline {
            book.push_outline(outline);
        }

        if !result.warnings.is_empty() {
            let rows = result
                .warnings
                .iter()
                .map(|w| {
                    vec![
                        w.page().map(|p| p.to_string()).unwrap_or_default(),
                        w.to_string(),
                    ]
                })
                .collect();
            book.push("Warnings", strings(&["Page", "Warning"]), rows);
        }

        book
    }

    /// Append the three outline sheets.
    pub fn push_outline(&mut self, outline: &Outline) {
        self.push(
            "Syllabus_Organized",
            outline_headers(),
            outline.nodes.iter().map(node_row).collect(),
        );
        self.push(
            "Unit_Summary",
            strings(&["Unit", "Topic_Count", "Total_Items"]),
            outline
                .units
                .iter()
                .map(|u| {
                    vec![
                        u.unit.clone(),
                        u.topic_count.to_string(),
                        u.total_items.to_string(),
                    ]
                })
                .collect(),
        );
        self.push(
            "Topics_Only",
            outline_headers(),
            outline.topics_only().map(node_row).collect(),
        );
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn summary_rows(result: &ExtractionResult) -> Vec<Vec<String>> {
    let placeholders = result
        .placeholder_pages
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    [
        ("File", result.path.display().to_string()),
        ("Total_Pages", result.total_pages.to_string()),
        ("Content_Kind", result.content_kind.to_string()),
        ("Method", format!("{:?}", result.method)),
        ("Completeness_Before", format!("{:.1}", result.completeness_before)),
        ("Completeness", format!("{:.1}", result.completeness_score)),
        ("Placeholder_Pages", placeholders),
        ("Tables", result.stats.tables.to_string()),
        ("Warnings", result.warnings.len().to_string()),
        ("Started", result.started_at.to_rfc3339()),
        ("Finished", result.finished_at.to_rfc3339()),
    ]
    .into_iter()
    .map(|(k, v)| vec![k.to_string(), v])
    .collect()
}

fn record_headers() -> Vec<String> {
    strings(&[
        "Page",
        "Line_Number",
        "Content",
        "Type",
        "Method",
        "X",
        "Y",
        "Width",
        "Height",
    ])
}

fn record_row(r: &ExtractedRecord) -> Vec<String> {
    let coord = |f: fn(&crate::output::Position) -> f32| {
        r.position
            .as_ref()
            .map(|p| format!("{:.1}", f(p)))
            .unwrap_or_default()
    };
    vec![
        r.page.to_string(),
        r.line_number.map(|n| n.to_string()).unwrap_or_default(),
        r.text.clone(),
        r.content_type.to_string(),
        r.method.tag(),
        coord(|p| p.x),
        coord(|p| p.y),
        coord(|p| p.width),
        coord(|p| p.height),
    ]
}

fn outline_headers() -> Vec<String> {
    strings(&[
        "Page",
        "Line_Number",
        "Unit",
        "Topic",
        "Subtopic",
        "Content",
        "Type",
        "Level",
    ])
}

fn node_row(n: &StructureNode) -> Vec<String> {
    vec![
        n.page.to_string(),
        n.line_number.to_string(),
        n.unit.clone(),
        n.topic.clone(),
        n.subtopic.clone(),
        n.content.clone(),
        n.level.to_string(),
        n.depth.to_string(),
    ]
}

/// A valid sheet name not in `taken`: invalid characters become `_`, at
/// most [`MAX_SHEET_NAME_LEN`] characters, `_n` appended on collision.
pub fn unique_sheet_name(name: &str, taken: &HashSet<String>) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let base = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    };
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 1usize;
    loop {
        let suffix = format!("_{n}");
        let stem: String = base
            .chars()
            .take(MAX_SHEET_NAME_LEN - suffix.len())
            .collect();
        let candidate = format!("{stem}{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
