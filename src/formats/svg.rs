//! SVG: text drawn as `<text>`/`<tspan>` elements over a filled rectangle.

use crate::formats::text::{scan_xml, text_or_return};
use crate::layout::{FontMetrics, measure};
use crate::options::Options;
use crate::registry::{EncodeError, Generator, Validator, ValidatorError};
use crate::validate::ValidationResult;
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_FONT_SIZE: u32 = 16;

/// Average-advance metrics for a sans-serif face at `size`.
struct ApproxSans {
    size: f32,
}

impl FontMetrics for ApproxSans {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.size * 0.6
    }

    fn line_height(&self) -> f32 {
        self.size * 1.2
    }
}

pub struct SvgGenerator;

impl Generator for SvgGenerator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        fs::write(dest, render_svg(content, options))?;
        Ok(dest.to_path_buf())
    }
}

fn render_svg(content: &str, options: &Options) -> String {
    let font = ApproxSans {
        size: options.font_size.unwrap_or(DEFAULT_FONT_SIZE) as f32,
    };
    let padding = options.padding as f32;
    let wrap_at = options.width.map(|w| (w as f32 - 2.0 * padding).max(font.size));
    let layout = measure(content, &font, wrap_at, options.line_spacing as f32);

    let width = options
        .width
        .unwrap_or((layout.total_width + 2.0 * padding).ceil().max(100.0) as u32);
    let height = options
        .height
        .unwrap_or((layout.total_height + 2.0 * padding).ceil().max(50.0) as u32);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(
        svg,
        r#"  <rect width="100%" height="100%" fill="{}"/>"#,
        options.background().to_hex_rgb()
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{padding}" y="{padding}" font-family="sans-serif" font-size="{}" fill="{}" dominant-baseline="hanging">"#,
        font.size,
        options.foreground().to_hex_rgb()
    );
    let step = font.line_height() + layout.line_spacing;
    for (i, line) in layout.lines.iter().enumerate() {
        let dy = if i == 0 { 0.0 } else { step };
        let _ = writeln!(
            svg,
            r#"    <tspan x="{padding}" dy="{dy}">{}</tspan>"#,
            escape(line.text.as_str())
        );
    }
    svg.push_str("  </text>\n</svg>\n");
    svg
}

pub struct SvgValidator;

impl Validator for SvgValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        let summary = match scan_xml(&text) {
            Ok(summary) => summary,
            Err(e) => return Ok(ValidationResult::invalid(format!("Invalid SVG: {e}"))),
        };
        if summary.root != "svg" {
            return Ok(ValidationResult::invalid(format!(
                "Root element is <{}>, expected <svg>",
                summary.root
            )));
        }
        Ok(ValidationResult::valid("File is a valid SVG image")
            .with_detail("elements", summary.elements))
    }
}
