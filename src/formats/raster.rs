//! Raster images: png, jpg/jpeg, bmp, gif, tiff, webp.
//!
//! Content is laid out with the built-in bitmap font and stamped onto a
//! solid background. Canvas and font size are picked from the content
//! length unless `width`/`height`/`font_size` are given:
//!
//! | Characters | Canvas | Font size |
//! |---|---|---|
//! | ≤ 50 | 400×200 | 24 |
//! | ≤ 200 | 600×400 | 16 |
//! | ≤ 500 | 800×600 | 16 |
//! | more | 1000×800 | 8 |
//!
//! With `auto_resize` on, the canvas grows to fit the measured block plus
//! padding (never below 100×50). No canvas exceeds 8192×8192; larger
//! requests are clamped. JPEG drops the alpha channel and encodes
//! at `quality`; the other formats are written as RGBA.

use crate::layout::{
    BitmapFont, Border, Decorations, LayoutResult, MAX_CANVAS, Point, Shadow, auto_resize, measure,
    render,
};
use crate::options::{Align, Options, VAlign};
use crate::registry::{EncodeError, Generator, Validator, ValidatorError};
use crate::validate::ValidationResult;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

/// Canvas and font size picked from content length.
pub fn default_geometry(chars: usize) -> ((u32, u32), u32) {
    match chars {
        0..=50 => ((400, 200), 24),
        51..=200 => ((600, 400), 16),
        201..=500 => ((800, 600), 16),
        _ => ((1000, 800), 8),
    }
}

/// Render `content` into a new RGBA image according to `options`.
pub fn render_text_image(content: &str, options: &Options) -> RgbaImage {
    let ((auto_w, auto_h), auto_font) = default_geometry(content.chars().count());
    let base = (
        options.width.unwrap_or(auto_w).clamp(1, MAX_CANVAS.0),
        options.height.unwrap_or(auto_h).clamp(1, MAX_CANVAS.1),
    );
    let font = BitmapFont::for_size(options.font_size.unwrap_or(auto_font));

    let padding = options.padding;
    let wrap_at = if options.auto_resize {
        base.0 as f32 * 0.8
    } else {
        base.0.saturating_sub(padding.saturating_mul(2)).max(1) as f32
    };
    let layout = measure(content, &font, Some(wrap_at), options.line_spacing as f32);

    let (width, height) = if options.auto_resize {
        auto_resize(base, &layout, padding)
    } else {
        base
    };

    let mut canvas = RgbaImage::from_pixel(width, height, image::Rgba(options.background().0));
    let decorations = Decorations {
        shadow: options.shadow.then(Shadow::default),
        border: options.border.then(Border::default),
    };
    let origin = block_origin(&layout, (width, height), padding, options.align, options.valign);
    render(
        &layout,
        &mut canvas,
        &font,
        origin,
        options.align,
        options.valign,
        &decorations,
        options.foreground(),
    );
    canvas
}

/// Render onto a fixed-size canvas (video frames, image-set placeholders).
pub fn render_fixed(content: &str, size: (u32, u32), font_size: u32, options: &Options) -> RgbaImage {
    let fixed = Options {
        width: Some(size.0),
        height: Some(size.1),
        font_size: Some(font_size),
        auto_resize: false,
        ..options.clone()
    };
    render_text_image(content, &fixed)
}

/// Left edge and vertical anchor of the text block on the canvas.
fn block_origin(
    layout: &LayoutResult,
    (width, height): (u32, u32),
    padding: u32,
    align: Align,
    valign: VAlign,
) -> Point {
    let (w, h, pad) = (width as f32, height as f32, padding as f32);
    let x = match align {
        Align::Left => pad,
        Align::Center => (w - layout.total_width) / 2.0,
        Align::Right => w - pad - layout.total_width,
    };
    let y = match valign {
        VAlign::Top => pad,
        VAlign::Middle => h / 2.0,
        VAlign::Bottom => h - pad,
    };
    Point { x, y }
}

/// Encode `img` to `dest` in `format`.
pub fn write_image(img: RgbaImage, dest: &Path, format: ImageFormat, quality: u8) -> Result<(), EncodeError> {
    match format {
        ImageFormat::Jpeg => {
            let writer = BufWriter::new(File::create(dest)?);
            let encoder = JpegEncoder::new_with_quality(writer, quality);
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8())
                .write_with_encoder(encoder)?;
        }
        _ => img.save_with_format(dest, format)?,
    }
    Ok(())
}

pub(crate) fn format_from_path(path: &Path) -> Result<ImageFormat, EncodeError> {
    ImageFormat::from_path(path)
        .map_err(|_| EncodeError::Encoder(format!("no raster encoder for {}", path.display())))
}

pub struct RasterGenerator;

impl Generator for RasterGenerator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let format = format_from_path(dest)?;
        if options.font_path.is_some() {
            tracing::warn!("font_path is not supported; using the built-in bitmap font");
        }
        let img = render_text_image(content, options);
        write_image(img, dest, format, options.jpeg_quality())?;
        Ok(dest.to_path_buf())
    }
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_ascii_uppercase())
        .unwrap_or_else(|| format!("{format:?}"))
}

/// Magic bytes must match the extension, then the image must decode to
/// non-zero dimensions.
pub struct RasterValidator;

impl Validator for RasterValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let expected = ImageFormat::from_path(path)
            .map_err(|e| ValidatorError::Parse(format!("Unknown image extension: {e}")))?;

        let mut header = Vec::with_capacity(32);
        File::open(path)?.take(32).read_to_end(&mut header)?;
        let detected = match image::guess_format(&header) {
            Ok(format) => format,
            Err(_) => {
                return Ok(ValidationResult::invalid("File is not a recognized image format"));
            }
        };
        if detected != expected {
            return Ok(ValidationResult::invalid(format!(
                "File is not a {} image (detected as {})",
                format_name(expected),
                format_name(detected)
            )));
        }

        let img = match ImageReader::open(path)?.with_guessed_format()?.decode() {
            Ok(img) => img,
            Err(e) => return Ok(ValidationResult::invalid(format!("Invalid image file: {e}"))),
        };
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Ok(ValidationResult::invalid("Image has zero width or height"));
        }
        Ok(ValidationResult::valid(format!(
            "Valid {} image: {width}x{height} pixels",
            format_name(expected)
        ))
        .with_detail("width", width)
        .with_detail("height", height)
        .with_detail("color", format!("{:?}", img.color()))
        .with_detail("size", fs::metadata(path)?.len()))
    }
}
