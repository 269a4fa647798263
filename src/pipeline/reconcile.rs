//! Completeness reconciliation.
//!
//! Every page of the document must appear in the output. Pages that no
//! stage produced anything for get one `Empty_Page` placeholder record, so
//! callers can rely on at least one row per page however badly extraction
//! degraded.

use crate::output::{ContentType, ExtractedRecord, ExtractionMethod, Table};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Percentage of pages covered, 100 for an empty document.
pub fn completeness(covered_pages: usize, total_pages: usize) -> f64 {
    if total_pages == 0 {
        return 100.0;
    }
    covered_pages as f64 / total_pages as f64 * 100.0
}

/// Distinct 1-based pages carrying at least one record or table.
pub fn covered_pages(records: &[ExtractedRecord], tables: &[Table]) -> BTreeSet<usize> {
    records
        .iter()
        .map(|r| r.page)
        .chain(tables.iter().map(|t| t.page))
        .collect()
}

/// Text of the placeholder record for an empty page.
pub fn placeholder_text(page: usize) -> String {
    format!("[Page {page} - No extractable content found]")
}

/// Append a placeholder for every page in `1..=total_pages` without content.
///
/// Returns the pages that were filled, ascending.
pub fn reconcile(
    records: &mut Vec<ExtractedRecord>,
    tables: &[Table],
    total_pages: usize,
) -> Vec<usize> {
    let covered = covered_pages(records, tables);
    let missing: Vec<usize> = (1..=total_pages).filter(|p| !covered.contains(p)).collect();

    for &page in &missing {
        debug!("Page {}: no content, adding placeholder", page);
        records.push(ExtractedRecord::new(
            page,
            ContentType::EmptyPage,
            placeholder_text(page),
            ExtractionMethod::Placeholder,
        ));
    }
    if !missing.is_empty() {
        info!(
            "Added {} placeholder(s) for empty pages: {:?}",
            missing.len(),
            missing
        );
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(page: usize) -> ExtractedRecord {
        ExtractedRecord::new(page, ContentType::TextLine, "x", ExtractionMethod::PageText)
    }

    #[test]
    fn completeness_of_empty_document() {
        assert_eq!(completeness(0, 0), 100.0);
        assert!((completeness(2, 3) - 66.666).abs() < 0.01);
    }

    #[test]
    fn fills_only_missing_pages() {
        let mut records = vec![line(1), line(3)];
        let filled = reconcile(&mut records, &[], 3);
        assert_eq!(filled, vec![2]);
        assert_eq!(records.len(), 3);
        let placeholder = &records[2];
        assert_eq!(placeholder.page, 2);
        assert_eq!(placeholder.content_type, ContentType::EmptyPage);
        assert_eq!(placeholder.text, "[Page 2 - No extractable content found]");
    }

    #[test]
    fn tables_count_as_coverage() {
        let table = Table {
            page: 2,
            table_index: 1,
            headers: vec!["Column_1".into()],
            rows: vec![vec!["a".into()]],
            method: ExtractionMethod::TableGrid,
        };
        let mut records = Vec::new();
        let filled = reconcile(&mut records, &[table], 2);
        assert_eq!(filled, vec![1]);
    }

    #[test]
    fn every_page_covered_afterwards() {
        for total in 0..6 {
            let mut records = vec![line(2)];
            records.retain(|r| r.page <= total);
            reconcile(&mut records, &[], total);
            let covered = covered_pages(&records, &[]);
            assert_eq!(covered, (1..=total).collect::<BTreeSet<_>>());
            assert_eq!(completeness(covered.len(), total), 100.0);
        }
    }

    #[test]
    fn idempotent() {
        let mut records = Vec::new();
        reconcile(&mut records, &[], 2);
        let again = reconcile(&mut records, &[], 2);
        assert!(again.is_empty());
        assert_eq!(records.len(), 2);
    }
}
