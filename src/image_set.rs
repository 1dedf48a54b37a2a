//! Batch generation of image sets (favicons, app icons, thumbnails).
//!
//! A set is described by a JSON manifest in the web-app manifest shape:
//!
//! ```json
//! { "icons": [ { "src": "icons/icon-192.png", "sizes": "192x192" } ] }
//! ```
//!
//! Every record produces one file at `out_dir/src`. With a base image the
//! file is a Lanczos resize of it; otherwise it is a placeholder rendered by
//! the registry's raster generator (solid background, optional centered
//! text at a quarter of the short side). Records fail independently: a bad
//! size or an unwritable path is reported and the batch moves on.

use crate::formats::raster::{format_from_path, write_image};
use crate::generate::{GenerateError, generate_with};
use crate::naming::{extension_candidates, parse_dimensions};
use crate::options::{DEFAULT_BACKGROUND, DEFAULT_TEXT_COLOR, Options, VAlign};
use crate::registry::{EncodeError, FormatId, Generator, Registry};
use image::DynamicImage;
use image::imageops::FilterType;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ImageSetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid image set config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot read base image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid size '{0}', expected WxH with sides 1-8192")]
    InvalidSize(String),
    #[error("Invalid src '{0}': must be a relative path inside the output directory")]
    InvalidSource(String),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// One record of the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct IconSpec {
    pub src: String,
    pub sizes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSetConfig {
    #[serde(default)]
    pub icons: Vec<IconSpec>,
}

#[derive(Debug, Clone)]
pub struct ImageSetOptions {
    pub base_image: Option<PathBuf>,
    pub background_color: String,
    pub text_color: String,
    pub text: Option<String>,
}

impl Default for ImageSetOptions {
    fn default() -> Self {
        Self {
            base_image: None,
            background_color: DEFAULT_BACKGROUND.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            text: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ImageSetReport {
    pub generated: Vec<PathBuf>,
    pub failures: Vec<(String, ImageSetError)>,
}

pub fn load_config(path: &Path) -> Result<ImageSetConfig, ImageSetError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Resizes one source image to a fixed size, in the format of the
/// destination extension.
struct BaseImageGenerator<'a> {
    source: &'a DynamicImage,
    size: (u32, u32),
}

impl Generator for BaseImageGenerator<'_> {
    fn encode(&self, _content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let format = format_from_path(dest)?;
        let resized = self
            .source
            .resize_exact(self.size.0, self.size.1, FilterType::Lanczos3);
        write_image(resized.to_rgba8(), dest, format, options.jpeg_quality())?;
        Ok(dest.to_path_buf())
    }
}

/// Generate every record of `config` under `out_dir`.
///
/// Only whole-batch problems (unreadable base image, uncreatable output
/// directory) are returned as `Err`; per-record failures land in the report.
pub fn generate_set(
    registry: &Registry,
    config: &ImageSetConfig,
    out_dir: &Path,
    options: &ImageSetOptions,
) -> Result<ImageSetReport, ImageSetError> {
    fs::create_dir_all(out_dir)?;

    let base = match &options.base_image {
        Some(path) if path.is_file() => Some(image::open(path)?),
        Some(path) => {
            warn!("base image {} not found; rendering placeholders", path.display());
            None
        }
        None => None,
    };

    let mut report = ImageSetReport::default();
    for icon in &config.icons {
        match generate_icon(registry, icon, out_dir, options, base.as_ref()) {
            Ok(path) => {
                debug!(src = %icon.src, "generated {}", path.display());
                report.generated.push(path);
            }
            Err(e) => {
                warn!("failed to generate {}: {e}", icon.src);
                report.failures.push((icon.src.clone(), e));
            }
        }
    }
    Ok(report)
}

fn generate_icon(
    registry: &Registry,
    icon: &IconSpec,
    out_dir: &Path,
    options: &ImageSetOptions,
    base: Option<&DynamicImage>,
) -> Result<PathBuf, ImageSetError> {
    let size =
        parse_dimensions(&icon.sizes).ok_or_else(|| ImageSetError::InvalidSize(icon.sizes.clone()))?;
    let dest = out_dir.join(relative_source(&icon.src)?);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let (format, generator) = resolve_format(registry, &icon.src)?;
    let rendered = placeholder_options(size, options);
    let path = match base {
        Some(source) => {
            let resize = BaseImageGenerator { source, size };
            generate_with(&resize, &format, "", &dest, &rendered)?
        }
        None => {
            let text = options.text.as_deref().unwrap_or_default();
            generate_with(generator, &format, text, &dest, &rendered)?
        }
    };
    Ok(path)
}

/// `src` must stay inside the output directory.
fn relative_source(src: &str) -> Result<&Path, ImageSetError> {
    let path = Path::new(src);
    let inside = path.components().count() > 0
        && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if inside {
        Ok(path)
    } else {
        Err(ImageSetError::InvalidSource(src.to_string()))
    }
}

fn resolve_format<'r>(
    registry: &'r Registry,
    src: &str,
) -> Result<(FormatId, &'r dyn Generator), ImageSetError> {
    let name = Path::new(src)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    extension_candidates(&name)
        .into_iter()
        .find_map(|ext| {
            let generator = registry.lookup_generator(&ext)?;
            Some((FormatId::new(&ext), generator))
        })
        .ok_or_else(|| ImageSetError::Generate(GenerateError::UnsupportedFormat(name)))
}

fn placeholder_options((width, height): (u32, u32), options: &ImageSetOptions) -> Options {
    let short = width.min(height);
    Options {
        width: Some(width),
        height: Some(height),
        font_size: Some((short / 4).max(1)),
        padding: short / 10,
        valign: VAlign::Middle,
        auto_resize: false,
        background_color: options.background_color.clone(),
        text_color: options.text_color.clone(),
        ..Options::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{builtin, write_file};
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config(icons: &[(&str, &str)]) -> ImageSetConfig {
        ImageSetConfig {
            icons: icons
                .iter()
                .map(|(src, sizes)| IconSpec {
                    src: src.to_string(),
                    sizes: sizes.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn load_config_reads_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            tmp.path(),
            "set.json",
            br#"{"name": "app", "icons": [{"src": "a.png", "sizes": "16x16"}]}"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.icons.len(), 1);
        assert_eq!(config.icons[0].sizes, "16x16");
    }

    #[test]
    fn load_config_without_icons_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "set.json", b"{}");
        assert!(load_config(&path).unwrap().icons.is_empty());
    }

    #[test]
    fn load_config_rejects_malformed_json() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "set.json", b"{icons: }");
        assert!(matches!(load_config(&path), Err(ImageSetError::Json(_))));
    }

    #[test]
    fn placeholders_have_requested_sizes() {
        let tmp = TempDir::new().unwrap();
        let options = ImageSetOptions {
            text: Some("Hi".into()),
            ..ImageSetOptions::default()
        };
        let report = generate_set(
            &builtin(),
            &config(&[("icon-32.png", "32x32"), ("nested/dir/wide.jpg", "64X48")]),
            tmp.path(),
            &options,
        )
        .unwrap();

        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.generated.len(), 2);
        assert_eq!(
            image::image_dimensions(tmp.path().join("icon-32.png")).unwrap(),
            (32, 32)
        );
        assert_eq!(
            image::image_dimensions(tmp.path().join("nested/dir/wide.jpg")).unwrap(),
            (64, 48)
        );
    }

    #[test]
    fn placeholder_without_text_is_solid_background() {
        let tmp = TempDir::new().unwrap();
        let options = ImageSetOptions {
            background_color: "#ff0000".into(),
            ..ImageSetOptions::default()
        };
        generate_set(&builtin(), &config(&[("red.png", "8x8")]), tmp.path(), &options).unwrap();

        let img = image::open(tmp.path().join("red.png")).unwrap().to_rgba8();
        assert!(img.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn base_image_is_resized() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("base.png");
        RgbaImage::from_pixel(100, 50, Rgba([0, 0, 255, 255]))
            .save(&base)
            .unwrap();

        let options = ImageSetOptions {
            base_image: Some(base),
            ..ImageSetOptions::default()
        };
        let out = tmp.path().join("out");
        let report =
            generate_set(&builtin(), &config(&[("small.png", "20x10")]), &out, &options).unwrap();

        assert_eq!(report.generated, vec![out.join("small.png")]);
        assert_eq!(image::image_dimensions(out.join("small.png")).unwrap(), (20, 10));
    }

    #[test]
    fn missing_base_image_falls_back_to_placeholder() {
        let tmp = TempDir::new().unwrap();
        let options = ImageSetOptions {
            base_image: Some(tmp.path().join("nope.png")),
            ..ImageSetOptions::default()
        };
        let report =
            generate_set(&builtin(), &config(&[("a.png", "16x16")]), tmp.path(), &options).unwrap();
        assert_eq!(report.generated.len(), 1);
    }

    #[test]
    fn bad_records_fail_individually() {
        let tmp = TempDir::new().unwrap();
        let report = generate_set(
            &builtin(),
            &config(&[
                ("bad-size.png", "big"),
                ("huge.png", "100000x100000"),
                ("../escape.png", "16x16"),
                ("/abs.png", "16x16"),
                ("icon.unknownext", "16x16"),
                ("ok.png", "16x16"),
            ]),
            tmp.path(),
            &ImageSetOptions::default(),
        )
        .unwrap();

        assert_eq!(report.generated, vec![tmp.path().join("ok.png")]);
        let failed: Vec<&str> = report.failures.iter().map(|(src, _)| src.as_str()).collect();
        assert_eq!(
            failed,
            vec!["bad-size.png", "huge.png", "../escape.png", "/abs.png", "icon.unknownext"]
        );
        assert!(matches!(report.failures[0].1, ImageSetError::InvalidSize(_)));
        assert!(matches!(report.failures[1].1, ImageSetError::InvalidSize(_)));
        assert!(matches!(report.failures[2].1, ImageSetError::InvalidSource(_)));
        assert!(!tmp.path().join("huge.png").exists());
        assert!(!tmp.path().parent().unwrap().join("escape.png").exists());
    }
}
