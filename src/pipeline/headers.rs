//! Header sanitisation for detected tables.
//!
//! Turns the raw first row of a table into labels that are safe to use as
//! spreadsheet column names: non-empty, free of the characters spreadsheet
//! writers reject, at most [`MAX_HEADER_LEN`] characters, and unique within
//! the row.
//!
//! Sanitisation is idempotent: feeding its output back in returns the same
//! labels.

use super::normalize::{collapse_whitespace, remove_invisible_chars};
use std::collections::HashSet;
use tracing::debug;

/// Longest label emitted, in characters.
pub const MAX_HEADER_LEN: usize = 50;

const ELLIPSIS: &str = "...";

/// Characters spreadsheet writers reject in names.
const INVALID_CHARS: [char; 7] = ['\\', '/', '*', '?', ':', '[', ']'];

/// Label synthesised for a blank or unusable cell at 1-based `index`.
pub fn fallback_label(index: usize) -> String {
    format!("Column_{index}")
}

/// Synthesised labels for a header-less table of the given width.
pub fn synthesized_headers(width: usize) -> Vec<String> {
    (1..=width).map(fallback_label).collect()
}

/// Sanitise a header row.
///
/// Per cell, left to right:
/// 1. blank or missing → `Column_{i}`
/// 2. trim and collapse whitespace runs (newlines included) to one space
/// 3. replace `\ / * ? : [ ]` with `_`
/// 4. longer than 50 characters → first 47 plus `...`
/// 5. on collision with an earlier label append `_{n}`, n = 1, 2, …
///
/// A cell that is empty once invisible characters are removed falls back to
/// `Column_{i}` and is uniquified like any other label.
pub fn sanitize_headers<S: AsRef<str>>(raw: &[Option<S>]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());

    for (i, cell) in raw.iter().enumerate() {
        let index = i + 1;
        let base = match cell.as_ref().map(|s| s.as_ref()) {
            Some(s) if !s.trim().is_empty() => clean_label(s).unwrap_or_else(|| {
                debug!("header cell {index} unusable after cleaning, using fallback");
                fallback_label(index)
            }),
            _ => fallback_label(index),
        };
        let label = uniquify(&base, &seen);
        seen.insert(label.clone());
        out.push(label);
    }
    out
}

/// Steps 2–4. `None` when nothing printable survives.
fn clean_label(raw: &str) -> Option<String> {
    let visible = remove_invisible_chars(raw);
    let visible: String = visible.chars().filter(|c| !c.is_control() || c.is_whitespace()).collect();
    let collapsed = collapse_whitespace(&visible);
    if collapsed.is_empty() {
        return None;
    }
    let replaced: String = collapsed
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();
    Some(truncate(&replaced))
}

fn truncate(label: &str) -> String {
    if label.chars().count() <= MAX_HEADER_LEN {
        return label.to_string();
    }
    let keep = MAX_HEADER_LEN - ELLIPSIS.len();
    let mut s: String = label.chars().take(keep).collect();
    s.push_str(ELLIPSIS);
    s
}

/// Step 5. The base is shortened as needed so the suffixed label still fits
/// in [`MAX_HEADER_LEN`].
fn uniquify(base: &str, seen: &HashSet<String>) -> String {
    if !seen.contains(base) {
        return base.to_string();
    }
    let mut n = 1usize;
    loop {
        let suffix = format!("_{n}");
        let room = MAX_HEADER_LEN.saturating_sub(suffix.len());
        let stem: String = base.chars().take(room).collect();
        let candidate = format!("{stem}{suffix}");
        if !seen.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(str::to_string)).collect()
    }

    #[test]
    fn blank_and_duplicate_cells() {
        let out = sanitize_headers(&[None, Some("Name"), Some("Name")]);
        assert_eq!(out, vec!["Column_1", "Name", "Name_1"]);
    }

    #[test]
    fn whitespace_only_is_blank() {
        let out = sanitize_headers(&[Some("  "), Some("\n")]);
        assert_eq!(out, vec!["Column_1", "Column_2"]);
    }

    #[test]
    fn collapses_whitespace_and_replaces_invalid_chars() {
        let out = sanitize_headers(&[Some("  Unit\n Price [USD]  "), Some("a/b:c*d?e\\f")]);
        assert_eq!(out, vec!["Unit Price _USD_", "a_b_c_d_e_f"]);
    }

    #[test]
    fn truncates_to_fifty_characters() {
        let long = "x".repeat(80);
        let out = sanitize_headers(&[Some(long.as_str())]);
        assert_eq!(out[0].chars().count(), 50);
        assert!(out[0].ends_with("..."));
        assert_eq!(&out[0][..47], &long[..47]);
    }

    #[test]
    fn exactly_fifty_is_kept() {
        let label = "y".repeat(50);
        assert_eq!(sanitize_headers(&[Some(label.as_str())])[0], label);
    }

    #[test]
    fn suffix_never_exceeds_limit() {
        let long = "z".repeat(80);
        let out = sanitize_headers(&[Some(long.as_str()), Some(long.as_str())]);
        assert_eq!(out[1].chars().count(), 50);
        assert!(out[1].ends_with("_1"));
        assert_ne!(out[0], out[1]);
    }

    #[test]
    fn invisible_only_cell_falls_back() {
        let out = sanitize_headers(&[Some("\u{200B}\u{FEFF}"), Some("Column_1")]);
        assert_eq!(out, vec!["Column_1", "Column_1_1"]);
    }

    #[test]
    fn suffix_skips_taken_labels() {
        let out = sanitize_headers(&[Some("A"), Some("A_1"), Some("A"), Some("A")]);
        assert_eq!(out, vec!["A", "A_1", "A_2", "A_3"]);
    }

    #[test]
    fn idempotent() {
        let long = "w".repeat(70);
        let raw = owned(&[
            None,
            Some("Name"),
            Some("Name"),
            Some("x / y"),
            Some(long.as_str()),
            Some(long.as_str()),
            Some(""),
            Some("Column_7"),
        ]);
        let once = sanitize_headers(&raw);
        let again = sanitize_headers(
            &once.iter().cloned().map(Some).collect::<Vec<Option<String>>>(),
        );
        assert_eq!(once, again);
    }

    #[test]
    fn labels_are_unique() {
        let raw = owned(&[Some("a"), Some("a"), None, Some("Column_3"), Some("a_1"), Some("a")]);
        let out = sanitize_headers(&raw);
        let unique: HashSet<&String> = out.iter().collect();
        assert_eq!(unique.len(), out.len(), "{out:?}");
    }

    #[test]
    fn synthesized() {
        assert_eq!(synthesized_headers(2), vec!["Column_1", "Column_2"]);
    }
}
