//! Stage A: structured tables.
//!
//! Raw table regions come from [`DocumentSource::page_tables`]; this stage
//! shapes them into [`Table`]s with sanitized headers and fixed-width rows.
//! A malformed table is skipped with a warning and the next table on the
//! page is still processed.

use super::headers::{sanitize_headers, synthesized_headers};
use super::{PageYield, StageContext};
use crate::error::PageError;
use crate::output::{ExtractionMethod, Table, PAGE_COLUMN, TABLE_INDEX_COLUMN};
use crate::source::RawTable;
use tracing::{debug, warn};

/// Run Stage A on one page (1-based).
pub fn extract_tables(ctx: &StageContext<'_>, page: usize) -> Result<Option<PageYield>, PageError> {
    let raw_tables = ctx
        .source
        .page_tables(page - 1, &ctx.config.table_settings)
        .map_err(|e| PageError::TablesFailed {
            page,
            detail: e.to_string(),
        })?;

    let mut out = PageYield::default();
    for (i, raw) in raw_tables.into_iter().enumerate() {
        let table_index = i + 1;
        match shape_table(page, table_index, raw, ExtractionMethod::TableGrid) {
            Ok(Some(table)) => {
                debug!(
                    "Page {}: table {} with {} column(s), {} row(s)",
                    page,
                    table_index,
                    table.headers.len(),
                    table.rows.len()
                );
                out.tables.push(table);
            }
            Ok(None) => debug!("Page {}: table {} is blank, skipped", page, table_index),
            Err(e) => {
                warn!("{}", e);
                out.warnings.push(e);
            }
        }
    }
    Ok((!out.is_empty()).then_some(out))
}

/// Shape one raw table.
///
/// * Rows whose cells are all blank are dropped; `Ok(None)` if none remain.
/// * A single surviving row is data under synthesized `Column_N` headers.
/// * Otherwise row 1 is sanitized into the header and the rest is data.
/// * Short rows are padded with `""`; a row wider than the header is an
///   error for the whole table.
/// * `Page` and `Table_Index` columns are prepended unless the header
///   already has columns of those names.
///
/// `method` records where the cells came from.
pub fn shape_table(
    page: usize,
    table_index: usize,
    raw: RawTable,
    method: ExtractionMethod,
) -> Result<Option<Table>, PageError> {
    let mut rows: Vec<Vec<Option<String>>> = raw
        .into_iter()
        .filter(|row| row.iter().any(|c| c.as_deref().is_some_and(|s| !s.trim().is_empty())))
        .collect();

    if rows.is_empty() {
        return Ok(None);
    }

    let (headers, data) = if rows.len() == 1 {
        let width = rows[0].len();
        (synthesized_headers(width), rows)
    } else {
        let header_row = rows.remove(0);
        (sanitize_headers(&header_row), rows)
    };

    let width = headers.len();
    let mut body = Vec::with_capacity(data.len());
    for (r, row) in data.into_iter().enumerate() {
        if row.len() > width {
            return Err(PageError::TableMalformed {
                page,
                table: table_index,
                detail: format!(
                    "row {} has {} cells but the header has {}",
                    r + 1,
                    row.len(),
                    width
                ),
            });
        }
        let mut cells: Vec<String> = row
            .into_iter()
            .map(|c| c.map(|s| s.trim().to_string()).unwrap_or_default())
            .collect();
        cells.resize(width, String::new());
        body.push(cells);
    }

    let mut meta_headers = Vec::new();
    let mut meta_values = Vec::new();
    if !headers.iter().any(|h| h == PAGE_COLUMN) {
        meta_headers.push(PAGE_COLUMN.to_string());
        meta_values.push(page.to_string());
    }
    if !headers.iter().any(|h| h == TABLE_INDEX_COLUMN) {
        meta_headers.push(TABLE_INDEX_COLUMN.to_string());
        meta_values.push(table_index.to_string());
    }

    let headers = meta_headers.into_iter().chain(headers).collect();
    let rows = body
        .into_iter()
        .map(|cells| meta_values.iter().cloned().chain(cells).collect())
        .collect();

    Ok(Some(Table {
        page,
        table_index,
        headers,
        rows,
        method,
    }))
}
