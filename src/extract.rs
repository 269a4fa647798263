//! Extraction entry points.
//!
//! [`extract`] is the primary API: validate the input, open it with pdfium
//! on a blocking worker thread, run the pipeline, and return an
//! [`ExtractionResult`]. pdfium keeps thread-local state and must not run on
//! the async executor, hence `spawn_blocking`.
//!
//! The optional `timeout_secs` bounds the whole run. On expiry the pipeline
//! is asked to stop at the next page boundary and [`ExtractError::Timeout`]
//! is returned immediately.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{DocumentInfo, ExtractionResult};
use crate::pipeline::{self, detect, input};
use crate::sheets::Workbook;
use crate::source::{bind_pdfium, DocumentSource, PdfiumDocument};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Serialised form written by [`extract_to_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The full [`ExtractionResult`] as JSON.
    #[default]
    Result,
    /// The [`Workbook`] sheet projection as JSON.
    Sheets,
}

/// Extract a PDF file into records, tables and (optionally) an outline.
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal errors:
/// - File not found / permission denied / not a PDF
/// - Document cannot be opened or its pages counted (incl. password)
/// - pdfium library not found
/// - Timeout elapsed
///
/// Page- and table-level failures are reported in
/// [`ExtractionResult::warnings`] instead.
pub async fn extract(
    input: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let path = input::resolve_local(input)?;
    info!("Starting extraction: {}", path.display());

    let cancel = Arc::new(AtomicBool::new(false));
    let task = {
        let path = path.clone();
        let config = config.clone();
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || extract_blocking(&path, &config, &cancel))
    };

    let joined = match config.timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), task).await {
            Ok(joined) => joined,
            Err(_) => {
                cancel.store(true, Ordering::SeqCst);
                warn!("Extraction of {} timed out after {}s", path.display(), secs);
                return Err(ExtractError::Timeout { secs });
            }
        },
        None => task.await,
    };

    joined.map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {e}")))?
}

/// Blocking implementation: bind pdfium, open the document, run the pipeline.
fn extract_blocking(
    path: &Path,
    config: &ExtractionConfig,
    cancel: &AtomicBool,
) -> Result<ExtractionResult, ExtractError> {
    let pdfium = bind_pdfium()?;
    let document = PdfiumDocument::open(&pdfium, path, config.password.as_deref())?;
    pipeline::run(&document, path, config, cancel)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input, config))
}

/// Run the pipeline over any [`DocumentSource`].
///
/// No input validation and no timeout; `path` is only recorded in the
/// result. Useful for custom backends and in-memory documents.
pub fn extract_from_source(
    source: &dyn DocumentSource,
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let cancel = AtomicBool::new(false);
    pipeline::run(source, path.as_ref(), config, &cancel)
}

/// Extract PDF bytes held in memory.
///
/// The bytes are written to a managed temporary file which is removed when
/// extraction returns.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    extract(tmp.path(), config).await
}

/// Serialise a result in the given format.
pub fn render_json(result: &ExtractionResult, format: OutputFormat) -> Result<String, ExtractError> {
    let json = match format {
        OutputFormat::Result => serde_json::to_string_pretty(result),
        OutputFormat::Sheets => Workbook::from_result(result).to_json_pretty(),
    };
    json.map_err(|e| ExtractError::Internal(format!("JSON serialisation failed: {e}")))
}

/// Extract a PDF and write the JSON output to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
    format: OutputFormat,
) -> Result<ExtractionResult, ExtractError> {
    let result = extract(input, config).await?;
    let json = render_json(&result, format)?;
    write_atomic(output_path.as_ref(), json.as_bytes()).await?;
    Ok(result)
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExtractError> {
    let write_failed = |e| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    Ok(())
}

/// Page count and content kind without running the pipeline.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentInfo, ExtractError> {
    let path = input::resolve_local(input)?;
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = PdfiumDocument::open(&pdfium, &path, config.password.as_deref())?;
        inspect_source(&document, &path, &config)
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Inspect task panicked: {e}")))?
}

/// [`inspect`] over any [`DocumentSource`].
pub fn inspect_source(
    source: &dyn DocumentSource,
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentInfo, ExtractError> {
    let path = path.as_ref();
    let total_pages = source.page_count().map_err(|e| ExtractError::Unreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let lengths = detect::page_text_lengths(source, total_pages);
    let content_kind =
        detect::classify_lengths(&lengths, config.min_text_length, config.detection_policy);
    Ok(DocumentInfo {
        path: path.to_path_buf(),
        total_pages,
        content_kind,
        text_chars_per_page: lengths,
    })
}
