//! Line classification and forward fill.

use super::rules::{first_match, SUBTOPIC_RULES, TOPIC_RULES, UNIT_RULES};
use super::{OutlineLine, StructureLevel, StructureNode};
use tracing::trace;

/// Ancestry carried from one line to the next. Empty strings mean unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub unit: String,
    pub topic: String,
    pub subtopic: String,
}

/// Classify one line given the ancestry so far.
///
/// Pure: the returned state replaces the input state for the next line.
pub fn classify_line(
    state: ClassifierState,
    line: &OutlineLine,
) -> (ClassifierState, StructureNode) {
    let text = line.text.as_str();

    let (state, level) = if let Some((rule, unit)) = first_match(&UNIT_RULES, text) {
        trace!("line {}: unit rule '{}'", line.line_number, rule.name);
        let state = ClassifierState {
            unit,
            topic: String::new(),
            subtopic: String::new(),
        };
        (state, StructureLevel::UnitHeader)
    } else if let Some((rule, topic)) = first_match(&TOPIC_RULES, text) {
        trace!("line {}: topic rule '{}'", line.line_number, rule.name);
        let state = ClassifierState {
            topic,
            subtopic: String::new(),
            ..state
        };
        (state, StructureLevel::TopicHeader)
    } else if let Some((rule, subtopic)) = first_match(&SUBTOPIC_RULES, text) {
        trace!("line {}: subtopic rule '{}'", line.line_number, rule.name);
        (ClassifierState { subtopic, ..state }, StructureLevel::SubtopicHeader)
    } else if state.unit.is_empty() {
        (state, StructureLevel::GeneralContent)
    } else {
        (state, StructureLevel::Content)
    };

    let depth = match level {
        StructureLevel::UnitHeader | StructureLevel::GeneralContent => 1,
        StructureLevel::TopicHeader => 2,
        StructureLevel::SubtopicHeader => 3,
        StructureLevel::Content if !state.subtopic.is_empty() => 4,
        StructureLevel::Content if !state.topic.is_empty() => 3,
        StructureLevel::Content => 2,
    };

    let (unit, topic, subtopic) = if level == StructureLevel::GeneralContent {
        (String::new(), String::new(), String::new())
    } else {
        (
            state.unit.clone(),
            state.topic.clone(),
            state.subtopic.clone(),
        )
    };

    let node = StructureNode {
        level,
        depth,
        unit,
        topic,
        subtopic,
        page: line.page,
        line_number: line.line_number,
        content: text.trim().to_string(),
    };
    (state, node)
}

/// Classify a whole line stream, threading the state through a fold.
pub fn classify_lines(lines: &[OutlineLine]) -> Vec<StructureNode> {
    lines
        .iter()
        .fold(
            (ClassifierState::default(), Vec::with_capacity(lines.len())),
            |(state, mut nodes), line| {
                let (state, node) = classify_line(state, line);
                nodes.push(node);
                (state, nodes)
            },
        )
        .1
}

/// Replace blank `unit` / `topic` / `subtopic` fields with the nearest
/// preceding non-blank value of the same field.
pub fn forward_fill(nodes: &mut [StructureNode]) {
    let mut last_unit = String::new();
    let mut last_topic = String::new();
    let mut last_subtopic = String::new();
    for node in nodes.iter_mut() {
        fill(&mut node.unit, &mut last_unit);
        fill(&mut node.topic, &mut last_topic);
        fill(&mut node.subtopic, &mut last_subtopic);
    }
}

fn fill(field: &mut String, last: &mut String) {
    if field.is_empty() {
        field.clone_from(last);
    } else {
        last.clone_from(field);
    }
}
