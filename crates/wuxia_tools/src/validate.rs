//! Technique data validation.
//!
//! Every `.ron` file in a directory holds a list of techniques. Files are
//! loaded in name order into one catalog, so names must be unique across
//! the whole directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use wuxia_core::data::TechniqueCatalog;
use wuxia_core::error::CombatError;

/// Error type for validation.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// Directory not found.
    #[error("Data directory not found: {0}")]
    DirectoryNotFound(String),
    /// Failed to read a file or directory.
    #[error("Failed to read data: {0}")]
    ReadError(#[from] std::io::Error),
    /// A file failed to parse or validate.
    #[error("Invalid technique data: {0}")]
    Content(#[from] CombatError),
    /// One or more files failed; see the report.
    #[error("{failed} of {checked} technique files failed validation")]
    Failed {
        /// Files that failed.
        failed: usize,
        /// Files checked.
        checked: usize,
    },
}

/// A file that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Path of the file.
    pub path: String,
    /// Why it failed.
    pub reason: String,
}

/// Outcome of validating a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// `.ron` files examined.
    pub files_checked: usize,
    /// Techniques accepted across all files.
    pub techniques: usize,
    /// Files rejected.
    pub failures: Vec<FileFailure>,
}

impl ValidationReport {
    /// Whether every file passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn a report with failures into an error.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::Failed`] if any file failed.
    pub fn into_result(self) -> Result<Self, ValidateError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ValidateError::Failed {
                failed: self.failures.len(),
                checked: self.files_checked,
            })
        }
    }
}

/// `.ron` files in `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory is missing or unreadable.
pub fn technique_files(dir: &Path) -> Result<Vec<PathBuf>, ValidateError> {
    if !dir.exists() {
        return Err(ValidateError::DirectoryNotFound(dir.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "ron").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load one file into `catalog`, returning the number of techniques added.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails to parse, holds an
/// invalid technique or reuses a name already in `catalog`. Nothing is added
/// on error.
pub fn load_technique_file(
    catalog: &mut TechniqueCatalog,
    path: &Path,
) -> Result<usize, ValidateError> {
    let contents = fs::read_to_string(path)?;
    Ok(catalog.extend_from_ron_str(&contents)?)
}

/// Validate every technique file in a directory.
///
/// A bad file is logged and recorded in the report; the rest are still
/// checked.
///
/// # Errors
///
/// Returns an error only if the directory itself cannot be listed.
pub fn validate_technique_directory(dir: &Path) -> Result<ValidationReport, ValidateError> {
    let mut catalog = TechniqueCatalog::new();
    let mut report = ValidationReport::default();

    for path in technique_files(dir)? {
        report.files_checked += 1;
        match load_technique_file(&mut catalog, &path) {
            Ok(count) => {
                tracing::debug!(path = %path.display(), count, "Technique file valid");
                report.techniques += count;
            }
            Err(e) => {
                tracing::warn!("Failed to load techniques from {:?}: {}", path, e);
                report.failures.push(FileFailure {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        files = report.files_checked,
        techniques = report.techniques,
        failures = report.failures.len(),
        "Technique validation finished"
    );
    Ok(report)
}

/// Load every technique file in a directory into one catalog.
///
/// # Errors
///
/// Unlike [`validate_technique_directory`], the first bad file is an error.
pub fn load_technique_directory(dir: &Path) -> Result<TechniqueCatalog, ValidateError> {
    let mut catalog = TechniqueCatalog::new();
    for path in technique_files(dir)? {
        load_technique_file(&mut catalog, &path)?;
    }
    Ok(catalog)
}
