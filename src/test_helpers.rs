//! Shared test utilities for the fixgen test suite.
//!
//! Provides isolated registries, trivial validators, file fixtures, and mock
//! fonts for the layout engine.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_file(tmp.path(), "a.ok", b"data");
//! let registry = registry_of([Registration::validator_only(&["ok"], always_valid)]);
//!
//! let font = MonoFont::default();
//! assert_eq!(font.text_width("abc"), 30.0);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::formats;
use crate::layout::{Canvas, FontMetrics, GlyphPainter};
use crate::options::{Options, Rgba};
use crate::registry::{EncodeError, Registration, Registry, ValidatorError};
use crate::validate::ValidationResult;

// =========================================================================
// Registries
// =========================================================================

/// Build an isolated registry from the given registrations.
pub fn registry_of(registrations: impl IntoIterator<Item = Registration>) -> Registry {
    Registry::build(registrations).unwrap()
}

/// The full built-in registry.
pub fn builtin() -> Registry {
    formats::builtin_registry().unwrap()
}

pub fn always_valid(_path: &Path) -> Result<ValidationResult, ValidatorError> {
    Ok(ValidationResult::valid("ok"))
}

pub fn always_invalid(_path: &Path) -> Result<ValidationResult, ValidatorError> {
    Ok(ValidationResult::invalid("rejected"))
}

/// Generator that writes the content verbatim.
pub fn write_verbatim(content: &str, dest: &Path, _options: &Options) -> Result<PathBuf, EncodeError> {
    std::fs::write(dest, content)?;
    Ok(dest.to_path_buf())
}

/// Generator that writes a partial file, then fails.
pub fn fail_midway(content: &str, dest: &Path, _options: &Options) -> Result<PathBuf, EncodeError> {
    std::fs::write(dest, &content[..content.len() / 2])?;
    Err(EncodeError::Encoder("encoder crashed".into()))
}

/// Generator that writes a partial file, then panics.
pub fn panic_midway(content: &str, dest: &Path, _options: &Options) -> Result<PathBuf, EncodeError> {
    std::fs::write(dest, &content[..content.len() / 2])?;
    panic!("encoder blew up halfway");
}

// =========================================================================
// Files
// =========================================================================

/// Write `bytes` to `dir/name`, creating `dir` if needed.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =========================================================================
// Fonts
// =========================================================================

/// Monospace metrics: every character is `advance` wide, lines are `height` tall.
#[derive(Debug, Clone, Copy)]
pub struct MonoFont {
    pub advance: f32,
    pub height: f32,
}

impl Default for MonoFont {
    fn default() -> Self {
        Self {
            advance: 10.0,
            height: 12.0,
        }
    }
}

impl FontMetrics for MonoFont {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn line_height(&self) -> f32 {
        self.height
    }
}

/// A text stamp recorded by [`RecordingFont`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub text: String,
    pub x: i64,
    pub y: i64,
    pub color: Rgba,
}

/// Mono font that records every draw call instead of touching pixels.
#[derive(Default)]
pub struct RecordingFont {
    pub metrics: MonoFont,
    pub stamps: Mutex<Vec<Stamp>>,
}

impl RecordingFont {
    pub fn get_stamps(&self) -> Vec<Stamp> {
        self.stamps.lock().unwrap().clone()
    }
}

impl FontMetrics for RecordingFont {
    fn text_width(&self, text: &str) -> f32 {
        self.metrics.text_width(text)
    }

    fn line_height(&self) -> f32 {
        self.metrics.line_height()
    }
}

impl GlyphPainter for RecordingFont {
    fn draw_text(&self, _canvas: &mut dyn Canvas, x: i64, y: i64, text: &str, color: Rgba) {
        self.stamps.lock().unwrap().push(Stamp {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }
}
