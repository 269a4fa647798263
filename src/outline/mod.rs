//! Heuristic outline reconstruction.
//!
//! Turns the flat, page-tagged line stream produced by extraction into a
//! unit / topic / subtopic hierarchy. The classifier is best-effort by
//! nature: it recognises the numbering and bullet conventions common in
//! syllabi and course outlines, and nothing more.
//!
//! ## Passes
//!
//! 1. [`reconstruct`]: when the input looks word-granular (short average
//!    entry length), regroup tokens into pseudo-lines per page.
//! 2. [`classify`]: fold over the lines with a `(unit, topic, subtopic)`
//!    accumulator, matching the ordered rule tables in [`rules`].
//! 3. Forward fill: blank ancestry fields take the nearest preceding
//!    non-blank value.

pub mod classify;
pub mod reconstruct;
pub mod rules;

pub use classify::{classify_line, classify_lines, forward_fill, ClassifierState};
pub use reconstruct::{mean_entry_length, reconstruct_lines};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Default mean entry length below which the input is treated as
/// word-granular.
pub const DEFAULT_RECONSTRUCT_THRESHOLD: f64 = 10.0;

/// Classification of one outline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureLevel {
    #[serde(rename = "Unit_Header")]
    UnitHeader,
    #[serde(rename = "Topic_Header")]
    TopicHeader,
    #[serde(rename = "Subtopic_Header")]
    SubtopicHeader,
    #[serde(rename = "Content")]
    Content,
    #[serde(rename = "General_Content")]
    GeneralContent,
}

impl StructureLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureLevel::UnitHeader => "Unit_Header",
            StructureLevel::TopicHeader => "Topic_Header",
            StructureLevel::SubtopicHeader => "Subtopic_Header",
            StructureLevel::Content => "Content",
            StructureLevel::GeneralContent => "General_Content",
        }
    }
}

impl fmt::Display for StructureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of classifier input.
///
/// `text` keeps its leading whitespace: indentation is a subtopic signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineLine {
    pub page: usize,
    pub line_number: usize,
    pub text: String,
}

impl OutlineLine {
    pub fn new(page: usize, line_number: usize, text: impl Into<String>) -> Self {
        Self {
            page,
            line_number,
            text: text.into(),
        }
    }
}

/// A classified line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureNode {
    pub level: StructureLevel,
    /// 1 for unit headers and general content, 2 for topic headers, 3 for
    /// subtopic headers; content sits one below its deepest ancestor.
    pub depth: u8,
    pub unit: String,
    pub topic: String,
    pub subtopic: String,
    pub page: usize,
    pub line_number: usize,
    pub content: String,
}

/// Per-unit rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub unit: String,
    /// Distinct non-blank topics seen under the unit.
    pub topic_count: usize,
    /// Nodes carrying the unit, its header included.
    pub total_items: usize,
}

/// Classified outline of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub nodes: Vec<StructureNode>,
    pub units: Vec<UnitSummary>,
    /// Whether the word-reconstruction pre-pass ran.
    pub reconstructed: bool,
}

impl Outline {
    /// Run every pass over `lines`.
    pub fn build(lines: Vec<OutlineLine>, reconstruct_threshold: f64) -> Self {
        let mean = mean_entry_length(&lines);
        let reconstructed = matches!(mean, Some(m) if m < reconstruct_threshold);
        let lines = if reconstructed {
            debug!(
                "Mean entry length {:.1} below {:.1}, regrouping tokens into lines",
                mean.unwrap_or_default(),
                reconstruct_threshold
            );
            reconstruct_lines(&lines)
        } else {
            lines
        };

        let mut nodes = classify_lines(&lines);
        forward_fill(&mut nodes);
        let units = summarize_units(&nodes);
        info!(
            "Outline: {} node(s), {} unit(s){}",
            nodes.len(),
            units.len(),
            if reconstructed { " (reconstructed)" } else { "" }
        );
        Self {
            nodes,
            units,
            reconstructed,
        }
    }

    /// Topic and subtopic header nodes in document order.
    pub fn topics_only(&self) -> impl Iterator<Item = &StructureNode> {
        self.nodes.iter().filter(|n| {
            matches!(
                n.level,
                StructureLevel::TopicHeader | StructureLevel::SubtopicHeader
            )
        })
    }
}

/// Units in first-seen order with their topic and item counts.
pub fn summarize_units(nodes: &[StructureNode]) -> Vec<UnitSummary> {
    let mut order: Vec<(String, HashSet<&str>, usize)> = Vec::new();
    for node in nodes.iter().filter(|n| !n.unit.is_empty()) {
        let idx = match order.iter().position(|(u, _, _)| *u == node.unit) {
            Some(i) => i,
            None => {
                order.push((node.unit.clone(), HashSet::new(), 0));
                order.len() - 1
            }
        };
        let entry = &mut order[idx];
        if !node.topic.is_empty() {
            entry.1.insert(node.topic.as_str());
        }
        entry.2 += 1;
    }
    order
        .into_iter()
        .map(|(unit, topics, total_items)| UnitSummary {
            unit,
            topic_count: topics.len(),
            total_items,
        })
        .collect()
}
