//! Stage C: images and annotations.
//!
//! Neither carries text the earlier stages could read, but both are
//! content: a scanned figure on an otherwise blank page should still show
//! up in the output. Images and annotations fail independently.

use super::{PageYield, StageContext};
use crate::error::PageError;
use crate::output::{ContentType, ExtractedRecord, ExtractionMethod};
use crate::source::{AnnotationInfo, ImageInfo};
use tracing::{debug, warn};

pub fn extract_residual(
    ctx: &StageContext<'_>,
    page: usize,
) -> Result<Option<PageYield>, PageError> {
    let mut out = PageYield::default();

    match ctx.source.page_images(page - 1) {
        Ok(images) => out.records.extend(
            images
                .iter()
                .enumerate()
                .map(|(i, img)| image_record(page, i + 1, img)),
        ),
        Err(e) => {
            let err = PageError::ResidualFailed {
                page,
                detail: format!("images: {e}"),
            };
            warn!("{}", err);
            out.warnings.push(err);
        }
    }

    match ctx.source.page_annotations(page - 1) {
        Ok(annotations) => out.records.extend(
            annotations
                .iter()
                .enumerate()
                .map(|(i, a)| annotation_record(page, i + 1, a)),
        ),
        Err(e) => {
            let err = PageError::ResidualFailed {
                page,
                detail: format!("annotations: {e}"),
            };
            warn!("{}", err);
            out.warnings.push(err);
        }
    }

    debug!("Page {}: {} residual item(s)", page, out.records.len());
    Ok((!out.is_empty()).then_some(out))
}

/// `[Image i: WxH]`, positioned at the image's bounding box.
pub fn image_record(page: usize, index: usize, image: &ImageInfo) -> ExtractedRecord {
    let (w, h) = image.dimensions();
    ExtractedRecord::new(
        page,
        ContentType::Image,
        format!("[Image {index}: {w}x{h}]"),
        ExtractionMethod::ImageObject,
    )
    .with_line(index)
    .with_position(image.position)
}

/// `[Annotation i: Subtype]`, followed by the annotation's text if any.
pub fn annotation_record(page: usize, index: usize, annotation: &AnnotationInfo) -> ExtractedRecord {
    let mut text = format!("[Annotation {index}: {}]", annotation.subtype);
    if let Some(contents) = annotation.contents.as_deref().map(str::trim) {
        if !contents.is_empty() {
            text.push(' ');
            text.push_str(contents);
        }
    }
    let record = ExtractedRecord::new(page, ContentType::Annotation, text, ExtractionMethod::Annotation)
        .with_line(index);
    match annotation.position {
        Some(p) => record.with_position(p),
        None => record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Position;

    fn pos() -> Position {
        Position {
            x: 10.0,
            y: 20.0,
            width: 99.6,
            height: 50.2,
        }
    }

    #[test]
    fn image_uses_pixel_size_when_known() {
        let r = image_record(
            2,
            1,
            &ImageInfo {
                position: pos(),
                pixel_size: Some((640, 480)),
            },
        );
        assert_eq!(r.text, "[Image 1: 640x480]");
        assert_eq!(r.content_type, ContentType::Image);
        assert_eq!(r.position, Some(pos()));
    }

    #[test]
    fn image_falls_back_to_points() {
        let r = image_record(
            1,
            3,
            &ImageInfo {
                position: pos(),
                pixel_size: None,
            },
        );
        assert_eq!(r.text, "[Image 3: 100x50]");
    }

    #[test]
    fn annotation_text() {
        let bare = annotation_record(
            1,
            1,
            &AnnotationInfo {
                subtype: "Link".into(),
                position: None,
                contents: Some("  ".into()),
            },
        );
        assert_eq!(bare.text, "[Annotation 1: Link]");
        assert_eq!(bare.position, None);

        let note = annotation_record(
            1,
            2,
            &AnnotationInfo {
                subtype: "Text".into(),
                position: Some(pos()),
                contents: Some("check this".into()),
            },
        );
        assert_eq!(note.text, "[Annotation 2: Text] check this");
    }
}
