//! Ordered pattern tables for the outline classifier.
//!
//! Each table is a list of [`Rule`]s tried top to bottom; the first match
//! wins. Units are tried before topics, topics before subtopics.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// One recognisable heading convention.
pub struct Rule {
    /// Stable identifier, used in logs and tests.
    pub name: &'static str,
    pattern: Regex,
    /// Match against the line as read, leading whitespace included.
    /// Other rules see the line with leading whitespace removed.
    raw: bool,
    label: fn(&Captures<'_>) -> String,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, label: fn(&Captures<'_>) -> String) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            raw: false,
            label,
        }
    }

    fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    /// Label produced by this rule for `line`, if it matches.
    pub fn apply(&self, line: &str) -> Option<String> {
        let input = if self.raw { line } else { line.trim_start() };
        self.pattern.captures(input).map(|caps| (self.label)(&caps))
    }
}

/// First rule in `rules` that matches `line`, with its label.
pub fn first_match<'r>(rules: &'r [Rule], line: &str) -> Option<(&'r Rule, String)> {
    rules
        .iter()
        .find_map(|rule| rule.apply(line).map(|label| (rule, label)))
}

fn group<'c>(caps: &'c Captures<'_>, i: usize) -> &'c str {
    caps.get(i).map(|m| m.as_str().trim()).unwrap_or_default()
}

fn unit_label(caps: &Captures<'_>) -> String {
    let (number, title) = (group(caps, 1), group(caps, 2));
    if title.is_empty() {
        format!("Unit {number}")
    } else {
        format!("Unit {number}: {title}")
    }
}

fn marker_and_title(caps: &Captures<'_>) -> String {
    format!("{} {}", group(caps, 1), group(caps, 2))
}

fn title_only(caps: &Captures<'_>) -> String {
    group(caps, 1).to_string()
}

// ── Units ────────────────────────────────────────────────────────────────────

pub static UNIT_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        // "1. Introduction"; "1.1 ..." falls through to the topic table
        Rule::new("numbered", r"^(\d+)\.\s*([^\d\s].*)$", unit_label),
        Rule::new(
            "unit",
            r"(?i)^unit\s+(\d+|[ivx]+)\b\s*[:.\-–]?\s*([^\s:.\-–].*)$",
            unit_label,
        ),
        Rule::new("roman", r"^([IVX]+)\.\s+(.+)$", unit_label),
        Rule::new(
            "chapter",
            r"(?i)^chapter\s+(\d+|[ivx]+)\b\s*[:.\-–]?\s*([^\s:.\-–].*)$",
            unit_label,
        ),
        Rule::new(
            "paper",
            r"(?i)^paper\s*[-–]?\s*(\d+|[ivx]+)\b\s*[:.\-–]?\s*(.*)$",
            unit_label,
        ),
        Rule::new("subject", r"(?i)^subject\s*:\s*(.+)$", |caps| {
            format!("Subject: {}", group(caps, 1))
        }),
        Rule::new("code", r"(?i)^code\s+no\.?\s*:\s*(\d+)\s*(.+)$", |caps| {
            format!("Code {}: {}", group(caps, 1), group(caps, 2))
        }),
    ]
});

// ── Topics ───────────────────────────────────────────────────────────────────

pub static TOPIC_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("bullet", r"^(?:[a-zA-Z]\)|[•*\-])\s*(.+)$", title_only),
        Rule::new("decimal", r"^(\d+\.\d+)\.?\s+(.+)$", marker_and_title),
        Rule::new("parenthesised", r"^\((\d+)\)\s*(.+)$", |caps| {
            format!("({}) {}", group(caps, 1), group(caps, 2))
        }),
        Rule::new("capital", r"^([A-Z])\.\s+(.+)$", marker_and_title),
        // Prose opening with these words lands here too.
        Rule::new("declarative", r"^(?:The|This|It)\s+(.+)$", |caps| {
            format!("Objective: {}", group(caps, 1))
        }),
    ]
});

// ── Subtopics ────────────────────────────────────────────────────────────────

pub static SUBTOPIC_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("indented", r"^[ \t]{2,}(\S.*)$", title_only).raw(),
        Rule::new("triplet", r"^(\d+\.\d+\.\d+)\.?\s+(.+)$", marker_and_title),
        Rule::new("half_parenthesised", r"^(\d+)\)\s+(.+)$", |caps| {
            format!("{}) {}", group(caps, 1), group(caps, 2))
        }),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(line: &str) -> Option<(&'static str, String)> {
        first_match(&UNIT_RULES, line).map(|(r, l)| (r.name, l))
    }

    fn topic(line: &str) -> Option<(&'static str, String)> {
        first_match(&TOPIC_RULES, line).map(|(r, l)| (r.name, l))
    }

    fn subtopic(line: &str) -> Option<(&'static str, String)> {
        first_match(&SUBTOPIC_RULES, line).map(|(r, l)| (r.name, l))
    }

    #[test]
    fn unit_patterns() {
        assert_eq!(unit("1. Introduction"), Some(("numbered", "Unit 1: Introduction".into())));
        assert_eq!(unit("Unit 2: Sets"), Some(("unit", "Unit 2: Sets".into())));
        assert_eq!(unit("UNIT IV - Graphs"), Some(("unit", "Unit IV: Graphs".into())));
        assert_eq!(unit("III. Algebra"), Some(("roman", "Unit III: Algebra".into())));
        assert_eq!(unit("Chapter 3. Limits"), Some(("chapter", "Unit 3: Limits".into())));
        assert_eq!(unit("PAPER-II Research"), Some(("paper", "Unit II: Research".into())));
        assert_eq!(unit("PAPER-I"), Some(("paper", "Unit I".into())));
        assert_eq!(
            unit("Subject: General Paper on Teaching"),
            Some(("subject", "Subject: General Paper on Teaching".into()))
        );
        assert_eq!(
            unit("Code No. : 00 PAPER-I"),
            Some(("code", "Code 00: PAPER-I".into()))
        );
    }

    #[test]
    fn unit_rules_reject_lookalikes() {
        assert_eq!(unit("1.1 Sets"), None);
        assert_eq!(unit("Unit 12"), None);
        assert_eq!(unit("Unit 1:"), None);
        assert_eq!(unit("Chapter 3 -"), None);
        assert_eq!(unit("Papers are due"), None);
        assert_eq!(unit("Universal truths"), None);
    }

    #[test]
    fn topic_patterns() {
        assert_eq!(topic("a) Overview"), Some(("bullet", "Overview".into())));
        assert_eq!(topic("• Point"), Some(("bullet", "Point".into())));
        assert_eq!(topic("- Dash item"), Some(("bullet", "Dash item".into())));
        assert_eq!(topic("1.2 Relations"), Some(("decimal", "1.2 Relations".into())));
        assert_eq!(topic("(3) Proofs"), Some(("parenthesised", "(3) Proofs".into())));
        assert_eq!(topic("B. Vectors"), Some(("capital", "B. Vectors".into())));
        assert_eq!(
            topic("The main objective is clarity"),
            Some(("declarative", "Objective: main objective is clarity".into()))
        );
    }

    #[test]
    fn triplet_is_not_a_topic() {
        assert_eq!(topic("1.2.3 Detail"), None);
        assert_eq!(subtopic("1.2.3 Detail"), Some(("triplet", "1.2.3 Detail".into())));
    }

    #[test]
    fn subtopic_patterns() {
        assert_eq!(subtopic("   indented note"), Some(("indented", "indented note".into())));
        assert_eq!(subtopic(" single space"), None);
        assert_eq!(subtopic("2) Step two"), Some(("half_parenthesised", "2) Step two".into())));
    }

    #[test]
    fn leading_whitespace_ignored_by_header_rules() {
        assert_eq!(unit("  2. Methods").map(|(_, l)| l), Some("Unit 2: Methods".into()));
    }
}
