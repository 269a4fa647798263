//! Stage B: page text and word boxes.

use super::normalize::normalize_page_text;
use super::{PageYield, StageContext};
use crate::error::PageError;
use crate::outline::OutlineLine;
use crate::output::{ContentType, ExtractedRecord, ExtractionMethod};
use tracing::debug;

/// One `Text_Line` record per non-blank line of the page text.
///
/// Records carry the trimmed line; the outline input keeps leading
/// indentation.
pub fn extract_text(ctx: &StageContext<'_>, page: usize) -> Result<Option<PageYield>, PageError> {
    let raw = ctx
        .source
        .page_text(page - 1)
        .map_err(|e| PageError::TextFailed {
            page,
            detail: e.to_string(),
        })?;

    let mut out = PageYield::default();
    for (n, line) in numbered_lines(&normalize_page_text(&raw)) {
        out.records.push(
            ExtractedRecord::new(page, ContentType::TextLine, line.trim(), ExtractionMethod::PageText)
                .with_line(n),
        );
        out.lines.push(OutlineLine::new(page, n, line));
    }
    debug!("Page {}: {} text line(s)", page, out.records.len());
    Ok((!out.is_empty()).then_some(out))
}

/// One `Word` record per token, with its bounding box.
pub fn extract_words(ctx: &StageContext<'_>, page: usize) -> Result<Option<PageYield>, PageError> {
    let words = ctx
        .source
        .page_words(page - 1)
        .map_err(|e| PageError::WordsFailed {
            page,
            detail: e.to_string(),
        })?;

    let records: Vec<ExtractedRecord> = words
        .iter()
        .filter(|w| !w.text.trim().is_empty())
        .enumerate()
        .map(|(i, w)| {
            ExtractedRecord::new(page, ContentType::Word, w.text.trim(), ExtractionMethod::WordBoxes)
                .with_line(i + 1)
                .with_position(w.position())
        })
        .collect();
    debug!("Page {}: {} word(s)", page, records.len());
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(PageYield {
        records,
        ..PageYield::default()
    }))
}

/// Non-blank lines with 1-based sequential numbers, trailing whitespace
/// already removed by normalisation.
pub fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(i, l)| (i + 1, l))
}
