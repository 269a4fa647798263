//! Content-kind detection: does the document carry a usable text layer?

use crate::config::DetectionPolicy;
use crate::output::ContentKind;
use crate::source::DocumentSource;
use tracing::{debug, info, warn};

/// Trimmed character count of each page's text layer.
///
/// `None` marks a page whose text could not be read.
pub fn page_text_lengths(source: &dyn DocumentSource, total_pages: usize) -> Vec<Option<usize>> {
    (0..total_pages)
        .map(|idx| match source.page_text(idx) {
            Ok(text) => Some(text.trim().chars().count()),
            Err(e) => {
                warn!("Page {}: text layer unreadable during detection: {}", idx + 1, e);
                None
            }
        })
        .collect()
}

/// Decide the content kind from per-page text lengths.
///
/// Any unreadable page makes the whole document image-based, which routes
/// it to OCR.
pub fn classify_lengths(
    lengths: &[Option<usize>],
    min_text_length: usize,
    policy: DetectionPolicy,
) -> ContentKind {
    let Some(lengths) = lengths.iter().copied().collect::<Option<Vec<usize>>>() else {
        return ContentKind::ImageBased;
    };
    let text_based = match policy {
        DetectionPolicy::PerPageMaximum => lengths.iter().any(|&n| n > min_text_length),
        DetectionPolicy::Cumulative => lengths.iter().sum::<usize>() > min_text_length,
    };
    if text_based {
        ContentKind::TextBased
    } else {
        ContentKind::ImageBased
    }
}

/// Classify a document as text-based or image-based.
pub fn detect_content_kind(
    source: &dyn DocumentSource,
    total_pages: usize,
    min_text_length: usize,
    policy: DetectionPolicy,
) -> ContentKind {
    let lengths = page_text_lengths(source, total_pages);
    debug!("Text lengths per page: {:?}", lengths);
    let kind = classify_lengths(&lengths, min_text_length, policy);
    info!("Detected {} document ({:?} policy)", kind, policy);
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_page_maximum_needs_one_rich_page() {
        let lengths = [Some(10), Some(60), Some(0)];
        assert_eq!(
            classify_lengths(&lengths, 50, DetectionPolicy::PerPageMaximum),
            ContentKind::TextBased
        );
    }

    #[test]
    fn threshold_is_exclusive() {
        let lengths = [Some(50)];
        assert_eq!(
            classify_lengths(&lengths, 50, DetectionPolicy::PerPageMaximum),
            ContentKind::ImageBased
        );
        assert_eq!(
            classify_lengths(&lengths, 50, DetectionPolicy::Cumulative),
            ContentKind::ImageBased
        );
    }

    #[test]
    fn policies_disagree_on_many_thin_pages() {
        let lengths = vec![Some(20); 10];
        assert_eq!(
            classify_lengths(&lengths, 50, DetectionPolicy::PerPageMaximum),
            ContentKind::ImageBased
        );
        assert_eq!(
            classify_lengths(&lengths, 50, DetectionPolicy::Cumulative),
            ContentKind::TextBased
        );
    }

    #[test]
    fn unreadable_page_fails_safe() {
        let lengths = [Some(500), None];
        assert_eq!(
            classify_lengths(&lengths, 50, DetectionPolicy::PerPageMaximum),
            ContentKind::ImageBased
        );
    }

    #[test]
    fn empty_document_is_image_based() {
        assert_eq!(
            classify_lengths(&[], 50, DetectionPolicy::Cumulative),
            ContentKind::ImageBased
        );
    }
}
