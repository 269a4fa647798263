//! Word boxes and table regions, backed by pdfplumber.
//!
//! pdfium covers text, images, annotations and rasterisation; pdfplumber
//! owns everything that needs character geometry. Both libraries report
//! coordinates with a top-left origin here, so nothing is flipped.

use super::{RawTable, Word};
use crate::config::{TableSettings, TableStrategy};
use crate::error::SourceError;
use pdfplumber::{Pdf, Strategy, TableSettings as PlumberSettings, WordOptions};
use std::path::Path;
use tracing::{debug, warn};

/// A second, geometry-only view of the same file.
///
/// Opening it can fail where pdfium succeeds (an unsupported filter, a
/// broken xref pdfium repairs silently). That only costs the word and
/// table stages, so the failure is kept and replayed per page instead of
/// aborting the document.
pub struct PageGeometry {
    pdf: Result<Pdf, String>,
}

impl PageGeometry {
    pub fn open(path: &Path, password: Option<&str>) -> Self {
        let opened = match password {
            Some(pwd) => Pdf::open_file_with_password(path, pwd.as_bytes(), None),
            None => Pdf::open_file(path, None),
        };
        let pdf = opened.map_err(|e| {
            warn!("Geometry unavailable for {}: {e}", path.display());
            e.to_string()
        });
        Self { pdf }
    }

    fn pdf(&self) -> Result<&Pdf, SourceError> {
        self.pdf
            .as_ref()
            .map_err(|detail| SourceError::Backend(detail.clone()))
    }

    pub fn words(&self, index: usize) -> Result<Vec<Word>, SourceError> {
        let page = self.pdf()?.page(index).map_err(plumber)?;
        Ok(page
            .extract_words(&WordOptions::default())
            .into_iter()
            .map(|w| {
                Word::new(
                    w.text,
                    w.bbox.x0 as f32,
                    w.bbox.top as f32,
                    w.bbox.x1 as f32,
                    w.bbox.bottom as f32,
                )
            })
            .collect())
    }

    pub fn tables(
        &self,
        index: usize,
        settings: &TableSettings,
    ) -> Result<Vec<RawTable>, SourceError> {
        let page = self.pdf()?.page(index).map_err(plumber)?;
        let tables: Vec<RawTable> = page
            .find_tables(&plumber_settings(settings))
            .into_iter()
            .map(|table| {
                table
                    .rows
                    .into_iter()
                    .map(|row| row.into_iter().map(|cell| cell.text).collect())
                    .collect()
            })
            .collect();
        debug!("Page {}: {} table region(s)", index + 1, tables.len());
        Ok(tables)
    }
}

fn plumber(e: impl std::fmt::Display) -> SourceError {
    SourceError::Backend(e.to_string())
}

/// Translate the crate's table settings into pdfplumber's.
///
/// pdfplumber picks one strategy for both axes: ruling lines on both axes
/// select the lattice finder, anything else falls back to word alignment.
pub fn plumber_settings(settings: &TableSettings) -> PlumberSettings {
    let strategy = match (settings.vertical_strategy, settings.horizontal_strategy) {
        (TableStrategy::Lines, TableStrategy::Lines) => Strategy::Lattice,
        _ => Strategy::Stream,
    };
    let snap = f64::from(settings.snap_tolerance);
    let join = f64::from(settings.join_tolerance);
    let ix = f64::from(settings.intersection_x_tolerance);
    let iy = f64::from(settings.intersection_y_tolerance);
    PlumberSettings {
        strategy,
        snap_tolerance: snap,
        snap_x_tolerance: snap,
        snap_y_tolerance: snap,
        join_tolerance: join,
        join_x_tolerance: join,
        join_y_tolerance: join,
        intersection_tolerance: ix.max(iy),
        intersection_x_tolerance: ix,
        intersection_y_tolerance: iy,
        text_y_tolerance: f64::from(settings.text_y_tolerance),
        min_words_vertical: settings.min_words_vertical,
        min_words_horizontal: settings.min_words_horizontal,
        ..PlumberSettings::default()
    }
}
