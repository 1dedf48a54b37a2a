//! Cleanup orchestrator: validate every file in a directory and delete the
//! invalid ones.
//!
//! The sweep is best-effort. Each file is validated and (if invalid)
//! deleted independently; a failure on one file is recorded in its entry and
//! the sweep moves on. Nothing is transactional across files.
//!
//! Symlinks are followed when collecting files, but deleting an invalid
//! entry removes the link itself, never its target.
//!
//! A file whose validation passed is never deleted. In dry-run mode nothing
//! is deleted at all and invalid entries are annotated `(would delete)`.

use crate::registry::Registry;
use crate::validate::{ValidationResult, collect_files, validate_file};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    pub recursive: bool,
    pub dry_run: bool,
}

/// What the sweep did with a file.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanupAction {
    Kept,
    Deleted,
    WouldDelete,
    DeleteFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanupEntry {
    pub result: ValidationResult,
    pub action: CleanupAction,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub entries: BTreeMap<PathBuf, CleanupEntry>,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn valid(&self) -> usize {
        self.entries.values().filter(|e| e.result.is_valid).count()
    }

    pub fn invalid(&self) -> usize {
        self.total() - self.valid()
    }

    pub fn deleted(&self) -> usize {
        self.count(|a| matches!(a, CleanupAction::Deleted))
    }

    pub fn failed(&self) -> usize {
        self.count(|a| matches!(a, CleanupAction::DeleteFailed(_)))
    }

    fn count(&self, pred: impl Fn(&CleanupAction) -> bool) -> usize {
        self.entries.values().filter(|e| pred(&e.action)).count()
    }
}

pub fn cleanup_invalid(
    registry: &Registry,
    dir: &Path,
    options: CleanupOptions,
) -> Result<CleanupReport, CleanupError> {
    if !fs::metadata(dir)?.is_dir() {
        return Err(CleanupError::NotADirectory(dir.to_path_buf()));
    }

    let mut report = CleanupReport::default();
    for path in collect_files(dir, options.recursive) {
        let result = validate_file(registry, &path);
        let entry = settle(&path, result, options.dry_run);
        report.entries.insert(path, entry);
    }

    debug!(
        total = report.total(),
        invalid = report.invalid(),
        deleted = report.deleted(),
        "cleanup sweep finished"
    );
    Ok(report)
}

fn settle(path: &Path, result: ValidationResult, dry_run: bool) -> CleanupEntry {
    if result.is_valid {
        return CleanupEntry {
            result,
            action: CleanupAction::Kept,
        };
    }
    if dry_run {
        return CleanupEntry {
            result: result.annotated(" (would delete)"),
            action: CleanupAction::WouldDelete,
        };
    }
    match fs::remove_file(path) {
        Ok(()) => CleanupEntry {
            result: result.annotated(" (deleted)"),
            action: CleanupAction::Deleted,
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to delete invalid file");
            let cause = e.to_string();
            CleanupEntry {
                result: result.annotated(&format!(" (failed to delete: {cause})")),
                action: CleanupAction::DeleteFailed(cause),
            }
        }
    }
}
