//! Validation pipeline.
//!
//! [`validate_file`] is total: whatever happens inside a validator, the
//! caller gets a [`ValidationResult`] back. Missing paths, directories, I/O
//! failures, parser errors, and even panics inside a validator all become
//! negative results with a message describing the cause.
//!
//! ## Resolution
//!
//! 1. The path must exist and be a regular file; otherwise the result is
//!    invalid and no validator runs.
//! 2. The validator is resolved from the file name's dotted suffixes,
//!    longest first ([`Registry::validator_for_path`]).
//! 3. Files with no registered validator go through [`GenericValidator`],
//!    which only checks that the file is readable and non-empty.

use crate::registry::{Registry, Validator, ValidatorError};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
    pub details: BTreeMap<String, Value>,
}

impl ValidationResult {
    pub fn valid(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Same verdict and details with `suffix` appended to the message.
    pub fn annotated(mut self, suffix: &str) -> Self {
        self.message.push_str(suffix);
        self
    }
}

/// Intermediate outcome for validators that chain several checks.
///
/// `Failed` short-circuits the chain with a negative result, `Passed`
/// carries whatever the check extracted for the next step.
pub(crate) enum Checked<T> {
    Passed(T),
    Failed(ValidationResult),
}

/// Fallback for files with no format-specific validator.
pub struct GenericValidator;

impl Validator for GenericValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let mut file = File::open(path)?;
        let mut first = [0u8; 1];
        if file.read(&mut first)? == 0 {
            return Ok(ValidationResult::invalid("File is empty"));
        }
        let size = fs::metadata(path)?.len();
        Ok(ValidationResult::valid("File exists and is readable").with_detail("size", size))
    }
}

/// Validate one file. Never panics and never returns an error.
pub fn validate_file(registry: &Registry, path: &Path) -> ValidationResult {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return ValidationResult::invalid(format!("File not found: {}", path.display())),
    };
    if !metadata.is_file() {
        return ValidationResult::invalid(format!("Not a file: {}", path.display()));
    }

    match registry.validator_for_path(path) {
        Some((format, validator)) => {
            debug!(path = %path.display(), %format, "validating");
            let result = run_guarded(validator, path);
            if result.details.contains_key("format") {
                result
            } else {
                result.with_detail("format", format.as_str())
            }
        }
        None => {
            debug!(path = %path.display(), "no validator registered, using generic check");
            run_guarded(&GenericValidator, path)
        }
    }
}

/// Text carried by a panic payload, or `fallback` for non-string payloads.
pub(crate) fn panic_cause(payload: &(dyn Any + Send), fallback: &str) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| fallback.to_string())
}

fn run_guarded(validator: &dyn Validator, path: &Path) -> ValidationResult {
    match panic::catch_unwind(AssertUnwindSafe(|| validator.check(path))) {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => ValidationResult::invalid(format!("Error validating: {e}")),
        Err(payload) => {
            let cause = panic_cause(payload.as_ref(), "validator panicked");
            warn!(path = %path.display(), %cause, "validator panicked");
            ValidationResult::invalid(format!("Error validating: {cause}"))
        }
    }
}

/// Validate a single file, or every regular file under a directory.
///
/// Results are keyed by path, so iteration order is sorted.
pub fn validate_path(
    registry: &Registry,
    path: &Path,
    recursive: bool,
) -> BTreeMap<PathBuf, ValidationResult> {
    if path.is_dir() {
        collect_files(path, recursive)
            .into_iter()
            .map(|file| {
                let result = validate_file(registry, &file);
                (file, result)
            })
            .collect()
    } else {
        BTreeMap::from([(path.to_path_buf(), validate_file(registry, path))])
    }
}

/// Regular files directly in `dir` (or anywhere below it), sorted by path.
///
/// Symlinks are followed: a link to a regular file is listed under the
/// link's own path, and linked directories are descended into when
/// recursive. Dangling links and link cycles are skipped with a warning.
pub(crate) fn collect_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
