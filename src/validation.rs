//! # Input Validation
//!
//! Preconditions checked before the uploader hashes a file or contacts AWS.
//!
//! ## Checks, in order
//!
//! - **Source file**: must exist and be a regular file
//! - **Extension**: the file name must carry a non-empty extension
//! - **Version tag**: must be non-empty and start with `v`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use webpage_ops::validation::InputValidator;
//!
//! let ext = InputValidator::validate_inputs(Path::new("slides/opening.pdf"), "v2025-10-19")?;
//! assert_eq!(ext, ".pdf");
//! # Ok::<(), webpage_ops::errors::AppError>(())
//! ```

use std::path::Path;

use crate::constants::VERSION_TAG_PREFIX;
use crate::errors::{AppError, AppResult};

/// Validation entry points for uploader input.
///
/// All methods are side-effect free apart from reading file metadata, and
/// return `AppResult` so that callers can propagate with `?`.
pub struct InputValidator;

impl InputValidator {
    /// Runs every check and returns the file extension with its leading dot.
    ///
    /// # Errors
    ///
    /// - `NotFound`: the path is not an existing file
    /// - `InvalidArgument`: missing extension or malformed version tag
    pub fn validate_inputs(file_path: &Path, version_tag: &str) -> AppResult<String> {
        Self::validate_source_file(file_path)?;
        let ext = Self::validate_extension(file_path)?;
        Self::validate_version_tag(version_tag)?;
        Ok(ext)
    }

    pub fn validate_source_file(file_path: &Path) -> AppResult<()> {
        if !file_path.is_file() {
            return Err(AppError::NotFound {
                path: file_path.display().to_string(),
            });
        }
        Ok(())
    }

    /// Returns the extension of `file_path` including the leading dot.
    pub fn validate_extension(file_path: &Path) -> AppResult<String> {
        match file_path.extension().map(|e| e.to_string_lossy()) {
            Some(ext) if !ext.is_empty() => Ok(format!(".{}", ext)),
            _ => Err(AppError::InvalidArgument {
                message: "Source file must have an extension (e.g., .pdf, .jpg).".to_string(),
            }),
        }
    }

    pub fn validate_version_tag(version_tag: &str) -> AppResult<()> {
        if !version_tag.starts_with(VERSION_TAG_PREFIX) {
            return Err(AppError::InvalidArgument {
                message: "--version-tag must start with \"v\" (e.g., v2025-10-19 or v1.2.3)."
                    .to_string(),
            });
        }
        Ok(())
    }
}
