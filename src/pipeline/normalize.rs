//! Deterministic cleanup of text read from a PDF text layer or OCR output.
//!
//! PDF text layers come with artefacts that are harmless on screen but break
//! line splitting and pattern matching downstream: CRLF line endings from
//! pdfium, zero-width characters, typographic ligatures, non-breaking spaces
//! and ragged runs of spaces between words.
//!
//! Leading indentation is preserved on purpose: the outline classifier reads
//! it as a subtopic signal.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can work per line;
//! invisible characters are removed before whitespace is collapsed so a
//! zero-width joiner between two spaces does not keep them apart.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all normalisation rules to one page of text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Expand typographic ligatures (`ﬁ` → `fi`)
/// 4. Turn tabs and non-breaking spaces into plain spaces
/// 5. Collapse runs of spaces inside a line, keeping leading indentation
/// 6. Trim trailing whitespace per line
pub fn normalize_page_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = expand_ligatures(&s);
    let s = normalise_spaces(&s);
    let s = collapse_inner_spaces(&s);
    trim_trailing_whitespace(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

/// Strip zero-width and formatting code points that render as nothing.
pub fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Expand ligatures ─────────────────────────────────────────────────

const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

fn expand_ligatures(input: &str) -> String {
    if !input.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match LIGATURES.iter().find(|(l, _)| *l == c) {
            Some((_, expanded)) => out.push_str(expanded),
            None => out.push(c),
        }
    }
    out
}

// ── Rule 4: Plain spaces ─────────────────────────────────────────────────────

fn normalise_spaces(input: &str) -> String {
    input.replace(['\t', '\u{00A0}', '\u{2007}', '\u{202F}'], " ")
}

// ── Rule 5: Collapse inner runs of spaces ────────────────────────────────────

static RE_INNER_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S) {2,}").unwrap());

fn collapse_inner_spaces(input: &str) -> String {
    RE_INNER_SPACES.replace_all(input, "$1 ").to_string()
}

// ── Rule 6: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse every whitespace run, newlines included, to one space and trim.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ────────────────────────────────────────────────────────────────────
