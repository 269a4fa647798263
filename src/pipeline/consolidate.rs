//! Final assembly of the ordered output.
//!
//! Layout: one summary segment with a `Page_Summary` record per page, then
//! for each page in ascending order its tables (by table index) followed by
//! one record group per content type, in the order the types first appear
//! on that page.

use crate::output::{ContentType, ExtractedRecord, ExtractionMethod, Segment, Table};
use std::collections::{BTreeMap, BTreeSet};

/// Summary line for one page.
///
/// `items` counts records plus table data rows.
pub fn summary_text(page: usize, items: usize, types: &BTreeSet<&str>) -> String {
    if items == 0 {
        return format!("Page {page}: No content extracted");
    }
    let types: Vec<&str> = types.iter().copied().collect();
    format!(
        "Page {page}: {items} total items, Content types: {}",
        types.join(", ")
    )
}

/// Build the per-page summary records for pages `1..=total_pages`.
pub fn page_summaries(
    records: &[ExtractedRecord],
    tables: &[Table],
    total_pages: usize,
) -> Vec<ExtractedRecord> {
    (1..=total_pages)
        .map(|page| {
            let mut types: BTreeSet<&str> = BTreeSet::new();
            let mut items = 0usize;
            for r in records.iter().filter(|r| r.page == page) {
                types.insert(r.content_type.as_str());
                items += 1;
            }
            for t in tables.iter().filter(|t| t.page == page) {
                types.insert(ContentType::Table.as_str());
                items += t.rows.len();
            }
            ExtractedRecord::new(
                page,
                ContentType::PageSummary,
                summary_text(page, items, &types),
                ExtractionMethod::Summary,
            )
        })
        .collect()
}

/// Merge records and tables into the final segment list.
pub fn consolidate(
    records: Vec<ExtractedRecord>,
    tables: Vec<Table>,
    total_pages: usize,
) -> Vec<Segment> {
    let summaries = page_summaries(&records, &tables, total_pages);

    #[derive(Default)]
    struct PageParts {
        tables: Vec<Table>,
        groups: Vec<(ContentType, Vec<ExtractedRecord>)>,
    }

    let mut pages: BTreeMap<usize, PageParts> = BTreeMap::new();
    for table in tables {
        pages.entry(table.page).or_default().tables.push(table);
    }
    for record in records {
        let parts = pages.entry(record.page).or_default();
        match parts
            .groups
            .iter_mut()
            .find(|(ct, _)| *ct == record.content_type)
        {
            Some((_, group)) => group.push(record),
            None => parts.groups.push((record.content_type, vec![record])),
        }
    }

    let mut segments = vec![Segment::Summary(summaries)];
    for (page, mut parts) in pages {
        parts.tables.sort_by_key(|t| t.table_index);
        segments.extend(parts.tables.into_iter().map(Segment::Table));
        segments.extend(
            parts
                .groups
                .into_iter()
                .map(|(content_type, records)| Segment::Records {
                    page,
                    content_type,
                    records,
                }),
        );
    }
    segments
}
