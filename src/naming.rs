//! Centralized filename handling for generated fixtures.
//!
//! Generated files follow one naming pattern: a prefix, a local timestamp at
//! second resolution, an optional collision counter, and the format
//! extension:
//!
//! - `generated_20240131_142501.png`
//! - `generated_20240131_142501_1.png` (second file in the same second)
//!
//! The same module owns the reverse direction: splitting a file name into
//! the dotted suffixes the registry tries (`a.tar.gz` → `tar.gz`, `gz`) and
//! parsing `WxH` size strings used by image-set configs.

use crate::layout::MAX_CANVAS;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Timestamp component of generated file names (`YYYYmmdd_HHMMSS`).
pub fn timestamp(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Build a generated file name. `attempt` 0 has no counter.
///
/// - `("generated", "20240131_142501", "png", 0)` → `generated_20240131_142501.png`
/// - `("generated", "20240131_142501", "png", 2)` → `generated_20240131_142501_2.png`
pub fn output_file_name(prefix: &str, stamp: &str, ext: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{prefix}_{stamp}.{ext}")
    } else {
        format!("{prefix}_{stamp}_{attempt}.{ext}")
    }
}

/// First free path in `dir` for the given prefix, stamp, and extension.
pub fn unique_output_path(dir: &Path, prefix: &str, stamp: &str, ext: &str) -> PathBuf {
    let mut attempt = 0;
    loop {
        let candidate = dir.join(output_file_name(prefix, stamp, ext, attempt));
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

/// Every dotted suffix of a file name, longest first.
///
/// A leading dot (hidden file) does not start a suffix, and neither does a
/// trailing dot.
///
/// - `"fixture.tar.gz"` → `["tar.gz", "gz"]`
/// - `"notes.txt"` → `["txt"]`
/// - `".bashrc"` → `[]`
pub fn extension_candidates(file_name: &str) -> Vec<String> {
    let lower = file_name.to_lowercase();
    lower
        .char_indices()
        .filter(|&(i, c)| c == '.' && i > 0 && i + 1 < lower.len())
        .map(|(i, _)| lower[i + 1..].to_string())
        .collect()
}

/// Parse a `WxH` size string such as `"192x192"`. Each side must be in
/// `1..=MAX_CANVAS`.
pub fn parse_dimensions(sizes: &str) -> Option<(u32, u32)> {
    let lower = sizes.trim().to_ascii_lowercase();
    let (w, h) = lower.split_once('x')?;
    let width: u32 = w.trim().parse().ok()?;
    let height: u32 = h.trim().parse().ok()?;
    let fits = (1..=MAX_CANVAS.0).contains(&width) && (1..=MAX_CANVAS.1).contains(&height);
    fits.then_some((width, height))
}
