//! Regroup word-granular input into pseudo-lines.
//!
//! When the only text available is a word list, every classifier input is a
//! single token and no heading pattern can match. Tokens are joined back
//! into lines, breaking before every token that looks like the start of a
//! sentence or heading. Page boundaries always break.

use super::OutlineLine;

/// Tokens that start a new line regardless of case.
const STARTER_TOKENS: [&str; 7] = ["PAPER", "UNIT", "Subject:", "Code", "The", "This", "It"];

/// Mean character length of the trimmed entries, `None` for empty input.
pub fn mean_entry_length(lines: &[OutlineLine]) -> Option<f64> {
    if lines.is_empty() {
        return None;
    }
    let total: usize = lines.iter().map(|l| l.text.trim().chars().count()).sum();
    Some(total as f64 / lines.len() as f64)
}

fn is_starter(token: &str) -> bool {
    let Some(first) = token.chars().next() else {
        return false;
    };
    first.is_uppercase()
        || first.is_ascii_digit()
        || first == '('
        || first == '•'
        || STARTER_TOKENS.contains(&token)
}

fn flush(page: usize, words: &mut Vec<&str>, out: &mut Vec<OutlineLine>) {
    if words.is_empty() {
        return;
    }
    let line_number = match out.last() {
        Some(prev) if prev.page == page => prev.line_number + 1,
        _ => 1,
    };
    out.push(OutlineLine::new(page, line_number, words.join(" ")));
    words.clear();
}

/// Join tokens into lines. Line numbers restart at 1 on every page.
pub fn reconstruct_lines(entries: &[OutlineLine]) -> Vec<OutlineLine> {
    let mut out: Vec<OutlineLine> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_page: Option<usize> = None;
    for entry in entries {
        let token = entry.text.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(page) = current_page {
            if page != entry.page || is_starter(token) {
                flush(page, &mut current, &mut out);
            }
        }
        current_page = Some(entry.page);
        current.push(token);
    }
    if let Some(page) = current_page {
        flush(page, &mut current, &mut out);
    }
    out
}
