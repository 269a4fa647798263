//! Input resolution: check that a user-supplied path names a readable PDF.
//!
//! pdfium gives opaque errors for missing or non-PDF files, so the path is
//! validated up front: it must exist, be a regular file, be readable, and
//! start with the `%PDF` magic bytes.

use crate::error::ExtractError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate `path` and return it unchanged on success.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, ExtractError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() || path.is_dir() {
        return Err(ExtractError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic == b"%PDF" => {}
                Ok(()) => return Err(ExtractError::NotAPdf { path, magic }),
                Err(_) => {
                    // Shorter than the magic itself.
                    return Err(ExtractError::NotAPdf { path, magic });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
