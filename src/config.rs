//! Configuration types for PDF extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Every knob lives in one struct so a
//! config can be shared across threads, logged, and compared between runs.

use crate::error::ExtractError;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Highest page-segmentation mode understood by tesseract.
const MAX_PSM: u8 = 13;

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2rows::{DetectionPolicy, ExtractionConfig};
///
/// let config = ExtractionConfig::builder()
///     .dpi(300)
///     .min_text_length(50)
///     .detection_policy(DetectionPolicy::Cumulative)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rasterisation DPI used before OCR. Range: 72–600. Default: 300.
    ///
    /// Tesseract accuracy drops sharply below ~200 DPI on body text; the
    /// cost of OCR grows with the square of this value.
    pub dpi: u32,

    /// Trimmed text length a page (or the whole document, depending on
    /// [`DetectionPolicy`]) must exceed to count as text-based. Default: 50.
    pub min_text_length: usize,

    /// Minimum trimmed length of an OCR line (and of an outline input line)
    /// for it to be kept. Default: 2.
    pub min_line_length: usize,

    /// How page text lengths are combined when detecting the content kind.
    pub detection_policy: DetectionPolicy,

    /// Geometry parameters for table detection.
    pub table_settings: TableSettings,

    /// Page-segmentation modes tried per page, in order. The longest output
    /// wins; ties keep the earlier mode. Default: `[6, 3, 4]`.
    pub ocr_psm_modes: Vec<u8>,

    /// Tesseract language code(s), e.g. `"eng"` or `"eng+deu"`. Default: `"eng"`.
    pub ocr_language: String,

    /// Explicit path to the tesseract executable. If None, `tesseract` is
    /// looked up on `PATH`.
    pub tesseract_path: Option<PathBuf>,

    /// Pre-constructed OCR engine. Takes precedence over `tesseract_path`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Emit one `Word` record per token in addition to text lines. Default: true.
    pub include_words: bool,

    /// Emit image and annotation descriptor records. Default: true.
    pub include_residual: bool,

    /// Run the outline classifier over the extracted lines. Default: false.
    pub build_outline: bool,

    /// Mean token length below which outline input is treated as
    /// word-granular and regrouped into pseudo-lines first. Default: 10.0.
    pub reconstruct_threshold: f64,

    /// Caller-level bound on the whole run, in seconds. Default: None.
    ///
    /// OCR cost scales with pages × DPI × segmentation modes; set this when
    /// extraction runs inside a request handler.
    pub timeout_secs: Option<u64>,

    /// Optional progress callback for per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            min_text_length: 50,
            min_line_length: 2,
            detection_policy: DetectionPolicy::default(),
            table_settings: TableSettings::default(),
            ocr_psm_modes: vec![6, 3, 4],
            ocr_language: "eng".to_string(),
            tesseract_path: None,
            ocr_engine: None,
            password: None,
            include_words: true,
            include_residual: true,
            build_outline: false,
            reconstruct_threshold: 10.0,
            timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("min_text_length", &self.min_text_length)
            .field("min_line_length", &self.min_line_length)
            .field("detection_policy", &self.detection_policy)
            .field("table_settings", &self.table_settings)
            .field("ocr_psm_modes", &self.ocr_psm_modes)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_path", &self.tesseract_path)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("include_words", &self.include_words)
            .field("include_residual", &self.include_residual)
            .field("build_outline", &self.build_outline)
            .field("reconstruct_threshold", &self.reconstruct_threshold)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn min_text_length(mut self, n: usize) -> Self {
        self.config.min_text_length = n;
        self
    }

    pub fn min_line_length(mut self, n: usize) -> Self {
        self.config.min_line_length = n.max(1);
        self
    }

    pub fn detection_policy(mut self, policy: DetectionPolicy) -> Self {
        self.config.detection_policy = policy;
        self
    }

    pub fn table_settings(mut self, settings: TableSettings) -> Self {
        self.config.table_settings = settings;
        self
    }

    pub fn ocr_psm_modes(mut self, modes: impl Into<Vec<u8>>) -> Self {
        self.config.ocr_psm_modes = modes.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = Some(path.into());
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn include_words(mut self, v: bool) -> Self {
        self.config.include_words = v;
        self
    }

    pub fn include_residual(mut self, v: bool) -> Self {
        self.config.include_residual = v;
        self
    }

    pub fn build_outline(mut self, v: bool) -> Self {
        self.config.build_outline = v;
        self
    }

    pub fn reconstruct_threshold(mut self, t: f64) -> Self {
        self.config.reconstruct_threshold = t;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    /// Attach a progress callback that receives per-page events.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ExtractError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.ocr_psm_modes.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "At least one OCR page-segmentation mode is required".into(),
            ));
        }
        if let Some(bad) = c.ocr_psm_modes.iter().find(|&&m| m > MAX_PSM) {
            return Err(ExtractError::InvalidConfig(format!(
                "OCR page-segmentation mode must be 0–{MAX_PSM}, got {bad}"
            )));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if !(c.reconstruct_threshold.is_finite() && c.reconstruct_threshold >= 0.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "Reconstruction threshold must be a non-negative number, got {}",
                c.reconstruct_threshold
            )));
        }
        c.table_settings.validate()?;
        if c.timeout_secs == Some(0) {
            return Err(ExtractError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the content-kind detector combines per-page text lengths.
///
/// The two policies disagree on documents with many low-text pages (for
/// example a scan with a short typed header on every page): per-page maximum
/// calls it image-based, cumulative calls it text-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectionPolicy {
    /// Text-based when any single page exceeds the threshold. (default)
    #[default]
    PerPageMaximum,
    /// Text-based when the sum over all pages exceeds the threshold.
    Cumulative,
}

/// Where table cell boundaries come from along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableStrategy {
    /// Infer boundaries from the alignment of words. (default)
    #[default]
    Text,
    /// Use ruling lines drawn on the page.
    Lines,
}

/// Geometry parameters for table detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    pub vertical_strategy: TableStrategy,
    pub horizontal_strategy: TableStrategy,
    /// Horizontal distance (points) within which edges count as the same
    /// column boundary. Default: 10.
    pub intersection_x_tolerance: f32,
    /// Vertical distance (points) within which edges count as the same row
    /// boundary. Default: 10.
    pub intersection_y_tolerance: f32,
    /// Distance (points) within which parallel ruling edges snap to one
    /// line. Default: 3.
    pub snap_tolerance: f32,
    /// Gap (points) across which collinear ruling segments are joined. Default: 3.
    pub join_tolerance: f32,
    /// Maximum baseline offset (points) for words to share a text line. Default: 3.
    pub text_y_tolerance: f32,
    /// Number of words that must share a left edge before it is accepted as
    /// a column boundary. Default: 3.
    pub min_words_vertical: usize,
    /// Number of words that must share a baseline before it is accepted as
    /// a row boundary. Default: 1.
    pub min_words_horizontal: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            vertical_strategy: TableStrategy::Text,
            horizontal_strategy: TableStrategy::Text,
            intersection_x_tolerance: 10.0,
            intersection_y_tolerance: 10.0,
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            text_y_tolerance: 3.0,
            min_words_vertical: 3,
            min_words_horizontal: 1,
        }
    }
}

impl TableSettings {
    fn validate(&self) -> Result<(), ExtractError> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ExtractError::InvalidConfig(format!(
                    "{name} must be a positive number of points, got {v}"
                )))
            }
        };
        positive("intersection_x_tolerance", self.intersection_x_tolerance)?;
        positive("intersection_y_tolerance", self.intersection_y_tolerance)?;
        positive("snap_tolerance", self.snap_tolerance)?;
        positive("join_tolerance", self.join_tolerance)?;
        positive("text_y_tolerance", self.text_y_tolerance)?;
        if self.min_words_vertical == 0 || self.min_words_horizontal == 0 {
            return Err(ExtractError::InvalidConfig(
                "min_words_vertical and min_words_horizontal must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}
