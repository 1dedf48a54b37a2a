//! Placement, decoration, and stamping of a measured layout.
//!
//! [`place`] is pure: it turns a [`LayoutResult`] plus an origin and
//! alignment into per-line top-left coordinates. [`render`] stamps those
//! lines onto a [`Canvas`] in back-to-front passes:
//!
//! 1. shadow: every line once, offset and translucent
//! 2. border: every line at the 8 neighbouring offsets of the border width
//! 3. main: every line in the text color
//!
//! A later pass always paints over an earlier one, so a line's shadow never
//! lands on top of a neighbouring line's glyphs.

use super::measure::{FontMetrics, LayoutResult};
use crate::options::{Align, Rgba, VAlign};

/// Smallest canvas [`auto_resize`] will produce.
pub const MIN_CANVAS: (u32, u32) = (100, 50);
/// Largest canvas any raster generator allocates.
pub const MAX_CANVAS: (u32, u32) = (8192, 8192);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub offset: (i64, i64),
    pub color: Rgba,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset: (2, 2),
            color: Rgba([0, 0, 0, 0x80]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: i64,
    pub color: Rgba,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: 1,
            color: Rgba::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Decorations {
    pub shadow: Option<Shadow>,
    pub border: Option<Border>,
}

/// Pixel sink that alpha-blends colors. Out-of-range coordinates are ignored.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba);
}

/// A font that can stamp glyphs onto a canvas.
pub trait GlyphPainter: FontMetrics {
    /// Draw `text` with its top-left corner at (`x`, `y`).
    fn draw_text(&self, canvas: &mut dyn Canvas, x: i64, y: i64, text: &str, color: Rgba);
}

impl Canvas for image::RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba) {
        let (w, h) = self.dimensions();
        if x < 0 || y < 0 || x >= i64::from(w) || y >= i64::from(h) {
            return;
        }
        let pixel = self.get_pixel_mut(x as u32, y as u32);
        pixel.0 = blend(pixel.0, color.0);
    }
}

/// Source-over compositing of straight-alpha colors.
fn blend(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = f32::from(src[3]) / 255.0;
    if sa >= 1.0 {
        return src;
    }
    if sa <= 0.0 {
        return dst;
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |i: usize| {
        let s = f32::from(src[i]) * sa;
        let d = f32::from(dst[i]) * da * (1.0 - sa);
        ((s + d) / out_a).round().clamp(0.0, 255.0) as u8
    };
    [channel(0), channel(1), channel(2), (out_a * 255.0).round() as u8]
}

/// Top-left coordinates for every line.
///
/// Lines are aligned within the block's total width, with the block's left
/// edge at `origin.x`. Vertically the block starts at, centers on, or ends at
/// `origin.y`.
pub fn place(layout: &LayoutResult, origin: Point, align: Align, valign: VAlign) -> Vec<PlacedLine> {
    let top = match valign {
        VAlign::Top => origin.y,
        VAlign::Middle => origin.y - layout.total_height / 2.0,
        VAlign::Bottom => origin.y - layout.total_height,
    };

    let mut y = top;
    let mut placed = Vec::with_capacity(layout.lines.len());
    for line in &layout.lines {
        let x = match align {
            Align::Left => origin.x,
            Align::Center => origin.x + (layout.total_width - line.width) / 2.0,
            Align::Right => origin.x + layout.total_width - line.width,
        };
        placed.push(PlacedLine {
            text: line.text.clone(),
            x,
            y,
        });
        y += line.height + layout.line_spacing;
    }
    placed
}

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Stamp a layout onto `canvas`: shadow pass, border pass, main pass.
#[allow(clippy::too_many_arguments)]
pub fn render(
    layout: &LayoutResult,
    canvas: &mut dyn Canvas,
    font: &dyn GlyphPainter,
    origin: Point,
    align: Align,
    valign: VAlign,
    decorations: &Decorations,
    color: Rgba,
) {
    let placed: Vec<(i64, i64, &str)> = place(layout, origin, align, valign)
        .iter()
        .zip(&layout.lines)
        .filter(|(_, line)| !line.text.is_empty())
        .map(|(p, line)| (p.x.round() as i64, p.y.round() as i64, line.text.as_str()))
        .collect();

    if let Some(shadow) = decorations.shadow {
        let (dx, dy) = shadow.offset;
        for &(x, y, text) in &placed {
            font.draw_text(canvas, x + dx, y + dy, text, shadow.color);
        }
    }

    if let Some(border) = decorations.border {
        for &(x, y, text) in &placed {
            for (nx, ny) in NEIGHBOURS {
                let (dx, dy) = (nx * border.width, ny * border.width);
                font.draw_text(canvas, x + dx, y + dy, text, border.color);
            }
        }
    }

    for &(x, y, text) in &placed {
        font.draw_text(canvas, x, y, text, color);
    }
}

/// Canvas size that fits the layout plus padding on every side.
///
/// Never shrinks: the result is at least `canvas` and at least [`MIN_CANVAS`].
/// Growth stops at [`MAX_CANVAS`].
pub fn auto_resize(canvas: (u32, u32), layout: &LayoutResult, padding: u32) -> (u32, u32) {
    let margin = padding.saturating_mul(2);
    // Float-to-int casts saturate.
    let required_w = (layout.total_width.ceil() as u32).saturating_add(margin);
    let required_h = (layout.total_height.ceil() as u32).saturating_add(margin);
    (
        canvas.0.max(required_w.min(MAX_CANVAS.0)).max(MIN_CANVAS.0),
        canvas.1.max(required_h.min(MAX_CANVAS.1)).max(MIN_CANVAS.1),
    )
}
