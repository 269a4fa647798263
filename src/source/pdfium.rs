//! [`DocumentSource`] backed by pdfium.
//!
//! pdfium is not async-safe and keeps per-thread state, so a
//! [`PdfiumDocument`] is created and used on one blocking thread (see
//! [`crate::extract`]). pdfium reports coordinates with a bottom-left
//! origin; everything leaving this module is flipped to top-left.
//!
//! Word boxes and table regions are delegated to [`PageGeometry`].

use super::geometry::PageGeometry;
use super::{AnnotationInfo, DocumentSource, ImageInfo, RawTable, Word};
use crate::config::TableSettings;
use crate::error::{ExtractError, SourceError};
use crate::output::Position;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to the pdfium shared library.
///
/// Lookup order: `PDFIUM_LIB_PATH` (a directory or the library file itself),
/// the current directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = PathBuf::from(&p);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            Pdfium::bind_to_library(lib)
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// A loaded PDF document.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    geometry: PageGeometry,
    path: PathBuf,
}

impl<'a> PdfiumDocument<'a> {
    /// Open a document. Any failure here means the pages cannot be
    /// enumerated and is reported as [`ExtractError::Unreadable`].
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, ExtractError> {
        let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{e:?}");
            let detail = if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    "wrong password".to_string()
                } else {
                    "document is encrypted; provide a password".to_string()
                }
            } else {
                err_str
            };
            ExtractError::Unreadable {
                path: path.to_path_buf(),
                detail,
            }
        })?;
        info!(
            "PDF loaded: {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Self {
            document,
            geometry: PageGeometry::open(path, password),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page(&self, index: usize) -> Result<PdfPage<'_>, SourceError> {
        let total = self.document.pages().len() as usize;
        if index >= total {
            return Err(SourceError::PageOutOfRange { index, total });
        }
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| SourceError::Backend(format!("{e:?}")))
    }
}

fn backend(e: PdfiumError) -> SourceError {
    SourceError::Backend(format!("{e:?}"))
}

impl DocumentSource for PdfiumDocument<'_> {
    fn page_count(&self) -> Result<usize, SourceError> {
        Ok(self.document.pages().len() as usize)
    }

    fn page_text(&self, index: usize) -> Result<String, SourceError> {
        let page = self.page(index)?;
        let text = page.text().map_err(backend)?;
        Ok(text.all())
    }

    fn page_words(&self, index: usize) -> Result<Vec<Word>, SourceError> {
        self.page(index)?;
        self.geometry.words(index)
    }

    fn page_tables(
        &self,
        index: usize,
        settings: &TableSettings,
    ) -> Result<Vec<RawTable>, SourceError> {
        self.page(index)?;
        self.geometry.tables(index, settings)
    }

    fn page_images(&self, index: usize) -> Result<Vec<ImageInfo>, SourceError> {
        let page = self.page(index)?;
        let height = page.height().value;
        let mut images = Vec::new();
        for object in page.objects().iter() {
            if object.object_type() != PdfPageObjectType::Image {
                continue;
            }
            let Ok(b) = object.bounds() else { continue };
            let position = Position {
                x: b.left().value,
                y: height - b.top().value,
                width: b.right().value - b.left().value,
                height: b.top().value - b.bottom().value,
            };
            let pixel_size = object.as_image_object().and_then(|img| {
                match (img.width(), img.height()) {
                    (Ok(w), Ok(h)) if w > 0 && h > 0 => Some((w as u32, h as u32)),
                    _ => None,
                }
            });
            images.push(ImageInfo {
                position,
                pixel_size,
            });
        }
        Ok(images)
    }

    fn page_annotations(&self, index: usize) -> Result<Vec<AnnotationInfo>, SourceError> {
        let page = self.page(index)?;
        let height = page.height().value;
        let mut out = Vec::new();
        for annotation in page.annotations().iter() {
            let position = annotation.bounds().ok().map(|b| Position {
                x: b.left().value,
                y: height - b.top().value,
                width: b.right().value - b.left().value,
                height: b.top().value - b.bottom().value,
            });
            out.push(AnnotationInfo {
                subtype: format!("{:?}", annotation.annotation_type()),
                position,
                contents: annotation.contents(),
            });
        }
        Ok(out)
    }

    fn rasterize(&self, index: usize, dpi: u32) -> Result<DynamicImage, SourceError> {
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
        let bitmap = page.render_with_config(&render_config).map_err(backend)?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} at {} DPI → {}x{} px",
            index + 1,
            dpi,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
