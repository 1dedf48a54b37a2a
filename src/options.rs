//! Generation options shared by every generator.
//!
//! [`Options`] is one typed record instead of a per-format keyword bag. Each
//! generator reads the fields it cares about and ignores the rest; fields a
//! format has no use for are harmless. The same record is the `[options]`
//! table of `fixgen.toml`, so every field has a serde default and unknown
//! keys are ignored on load.
//!
//! ## Fields by consumer
//!
//! | Field | Default | Used by |
//! |---|---|---|
//! | `sheet_name` | `"Sheet1"` | xlsx |
//! | `auto_adjust_columns` | `true` | xlsx |
//! | `title`, `author` | first content line / none | pdf, docx, odt, html |
//! | `width`, `height` | auto from content length | raster, svg, video |
//! | `background_color`, `text_color` | `#f0f0f0`, `#333333` | raster, svg, video |
//! | `font_size` | auto from content length | raster, svg, video |
//! | `padding`, `align`, `valign`, `line_spacing` | 40, center, middle, 4 | raster, video |
//! | `shadow`, `border`, `auto_resize` | off, off, on | raster |
//! | `quality` | 85 (clamped 1–100) | jpeg |
//! | `duration_secs`, `fps` | 2, 12 | mp4 |
//!
//! ## Colors
//!
//! Color fields are strings so config files stay readable. [`parse_color`]
//! accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, and a handful of CSS names. An
//! unparseable value falls back to the field's default color.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BACKGROUND: &str = "#f0f0f0";
pub const DEFAULT_TEXT_COLOR: &str = "#333333";
pub const DEFAULT_QUALITY: u8 = 85;

/// Horizontal alignment of each line within the text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical anchoring of the text block relative to its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub sheet_name: String,
    pub auto_adjust_columns: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub background_color: String,
    pub text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    pub padding: u32,
    pub align: Align,
    pub valign: VAlign,
    pub line_spacing: u32,
    pub shadow: bool,
    pub border: bool,
    pub quality: u8,
    pub auto_resize: bool,
    pub duration_secs: u32,
    pub fps: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            auto_adjust_columns: true,
            title: None,
            author: None,
            width: None,
            height: None,
            background_color: DEFAULT_BACKGROUND.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            font_path: None,
            font_size: None,
            padding: 40,
            align: Align::default(),
            valign: VAlign::default(),
            line_spacing: 4,
            shadow: false,
            border: false,
            quality: DEFAULT_QUALITY,
            auto_resize: true,
            duration_secs: 2,
            fps: 12,
        }
    }
}

impl Options {
    pub fn background(&self) -> Rgba {
        parse_color(&self.background_color).unwrap_or(Rgba::from_hex_const(0xf0f0f0ff))
    }

    pub fn foreground(&self) -> Rgba {
        parse_color(&self.text_color).unwrap_or(Rgba::from_hex_const(0x333333ff))
    }

    /// JPEG quality clamped to 1–100.
    pub fn jpeg_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }

    /// Explicit title, else the first non-blank line of `content`.
    pub fn title_for(&self, content: &str) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("Untitled")
            .to_string()
    }
}

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

    const fn from_hex_const(rgba: u32) -> Self {
        Rgba(rgba.to_be_bytes())
    }

    pub fn alpha(self) -> u8 {
        self.0[3]
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Rgba([r, g, b, alpha])
    }

    /// `#rrggbb` form, dropping alpha (SVG `fill` and ffmpeg colors).
    pub fn to_hex_rgb(self) -> String {
        let [r, g, b, _] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Parse a color string. Returns `None` for anything unrecognized.
pub fn parse_color(input: &str) -> Option<Rgba> {
    let s = input.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let named = match s.as_str() {
        "black" => 0x000000ff,
        "white" => 0xffffffff,
        "red" => 0xff0000ff,
        "green" => 0x008000ff,
        "blue" => 0x0000ffff,
        "yellow" => 0xffff00ff,
        "gray" | "grey" => 0x808080ff,
        "orange" => 0xffa500ff,
        "purple" => 0x800080ff,
        "transparent" => 0x00000000,
        _ => return None,
    };
    Some(Rgba::from_hex_const(named))
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba([digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, 255])),
        6 => Some(Rgba([pair(0)?, pair(2)?, pair(4)?, 255])),
        8 => Some(Rgba([pair(0)?, pair(2)?, pair(4)?, pair(6)?])),
        _ => None,
    }
}
