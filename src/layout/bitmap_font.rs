//! Built-in 5×7 bitmap font.
//!
//! Every generator that draws text uses this font, so output is
//! byte-for-byte deterministic across machines and needs no font files.
//!
//! Glyphs cover printable ASCII (`0x20..=0x7E`). Each glyph is five column
//! bytes; bit 0 is the top row of an 8-row cell (row 7 holds descenders).
//! A glyph advances 6 cells (5 columns plus one blank). Any other character
//! renders as `?`.
//!
//! The font scales by whole cells: a cell is `scale` × `scale` pixels, where
//! `scale = max(1, round(font_size / 8))`.

use super::measure::FontMetrics;
use super::render::{Canvas, GlyphPainter};
use crate::options::Rgba;

const FIRST: u32 = 0x20;
const ADVANCE: u32 = 6;
const CELL_ROWS: u32 = 8;

#[rustfmt::skip]
const GLYPHS: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x56, 0x20, 0x50], // &
    [0x00, 0x08, 0x07, 0x03, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x2A, 0x1C, 0x7F, 0x1C, 0x2A], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x80, 0x70, 0x30, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x00, 0x60, 0x60, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x72, 0x49, 0x49, 0x49, 0x46], // 2
    [0x21, 0x41, 0x49, 0x4D, 0x33], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x31], // 6
    [0x41, 0x21, 0x11, 0x09, 0x07], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x46, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x00, 0x14, 0x00, 0x00], // :
    [0x00, 0x40, 0x34, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x59, 0x09, 0x06], // ?
    [0x3E, 0x41, 0x5D, 0x59, 0x4E], // @
    [0x7C, 0x12, 0x11, 0x12, 0x7C], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x41, 0x3E], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x73], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x1C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x26, 0x49, 0x49, 0x49, 0x32], // S
    [0x03, 0x01, 0x7F, 0x01, 0x03], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x59, 0x49, 0x4D, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x41, 0x7F], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x03, 0x07, 0x08, 0x00], // `
    [0x20, 0x54, 0x54, 0x78, 0x40], // a
    [0x7F, 0x28, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x28], // c
    [0x38, 0x44, 0x44, 0x28, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x00, 0x08, 0x7E, 0x09, 0x02], // f
    [0x18, 0xA4, 0xA4, 0x9C, 0x78], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x40, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x78, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0xFC, 0x18, 0x24, 0x24, 0x18], // p
    [0x18, 0x24, 0x24, 0x18, 0xFC], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x24], // s
    [0x04, 0x04, 0x3F, 0x44, 0x24], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x4C, 0x90, 0x90, 0x90, 0x7C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x77, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x02, 0x01, 0x02, 0x04, 0x02], // ~
];

fn glyph(c: char) -> &'static [u8; 5] {
    let code = c as u32;
    let index = if (FIRST..FIRST + GLYPHS.len() as u32).contains(&code) {
        code - FIRST
    } else {
        '?' as u32 - FIRST
    };
    &GLYPHS[index as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    pub fn with_scale(scale: u32) -> Self {
        Self { scale: scale.max(1) }
    }

    /// Closest whole-cell scale for a nominal point size.
    pub fn for_size(font_size: u32) -> Self {
        Self::with_scale(font_size.saturating_add(CELL_ROWS / 2) / CELL_ROWS)
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl Default for BitmapFont {
    fn default() -> Self {
        Self::with_scale(2)
    }
}

impl FontMetrics for BitmapFont {
    fn text_width(&self, text: &str) -> f32 {
        let chars = text.chars().count() as u64;
        if chars == 0 {
            return 0.0;
        }
        // No trailing gap after the last glyph.
        ((chars * u64::from(ADVANCE) - 1) * u64::from(self.scale)) as f32
    }

    fn line_height(&self) -> f32 {
        (u64::from(CELL_ROWS) * u64::from(self.scale)) as f32
    }
}

impl GlyphPainter for BitmapFont {
    fn draw_text(&self, canvas: &mut dyn Canvas, x: i64, y: i64, text: &str, color: Rgba) {
        let scale = i64::from(self.scale);
        let (width, height) = (i64::from(canvas.width()), i64::from(canvas.height()));
        for (i, c) in text.chars().enumerate() {
            let cell_x = x.saturating_add(i as i64 * i64::from(ADVANCE) * scale);
            if cell_x >= width {
                break;
            }
            for (col, bits) in glyph(c).iter().enumerate() {
                for row in 0..CELL_ROWS {
                    if (*bits >> row) & 1 == 0 {
                        continue;
                    }
                    // Only the visible part of each cell is visited.
                    let px = cell_x.saturating_add(col as i64 * scale);
                    let py = y.saturating_add(i64::from(row) * scale);
                    for cy in py.max(0)..py.saturating_add(scale).min(height) {
                        for cx in px.max(0)..px.saturating_add(scale).min(width) {
                            canvas.blend_pixel(cx, cy, color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn lit(canvas: &RgbaImage) -> usize {
        canvas.pixels().filter(|p| p.0[3] != 0).count()
    }

    #[test]
    fn scale_rounds_font_size() {
        assert_eq!(BitmapFont::for_size(0).scale(), 1);
        assert_eq!(BitmapFont::for_size(8).scale(), 1);
        assert_eq!(BitmapFont::for_size(12).scale(), 2);
        assert_eq!(BitmapFont::for_size(24).scale(), 3);
    }

    #[test]
    fn metrics_scale_with_cells() {
        let font = BitmapFont::with_scale(2);
        assert_eq!(font.text_width(""), 0.0);
        assert_eq!(font.text_width("a"), 10.0);
        assert_eq!(font.text_width("ab"), 22.0);
        assert_eq!(font.line_height(), 16.0);
    }

    #[test]
    fn non_ascii_renders_as_question_mark() {
        assert_eq!(glyph('é'), glyph('?'));
        assert_eq!(glyph('\t'), glyph('?'));
        assert_ne!(glyph('A'), glyph('?'));
    }

    #[test]
    fn space_draws_nothing() {
        let mut canvas = RgbaImage::new(20, 20);
        BitmapFont::with_scale(1).draw_text(&mut canvas, 0, 0, "  ", Rgba::BLACK);
        assert_eq!(lit(&canvas), 0);
    }

    #[test]
    fn draws_expected_pixel_count_for_i() {
        // 'I' columns are 0x41, 0x7F, 0x41: 2 + 7 + 2 lit cells.
        let mut canvas = RgbaImage::new(20, 20);
        BitmapFont::with_scale(1).draw_text(&mut canvas, 0, 0, "I", Rgba::BLACK);
        assert_eq!(lit(&canvas), 11);

        let mut big = RgbaImage::new(40, 40);
        BitmapFont::with_scale(2).draw_text(&mut big, 0, 0, "I", Rgba::BLACK);
        assert_eq!(lit(&big), 44);
    }

    #[test]
    fn extreme_font_sizes_do_not_overflow() {
        let font = BitmapFont::for_size(u32::MAX);
        assert_eq!(font.scale(), u32::MAX / CELL_ROWS);
        assert!(font.text_width("abc").is_finite());
        assert!(font.line_height() > 0.0);
    }

    #[test]
    fn huge_cells_are_clipped_to_canvas() {
        let mut canvas = RgbaImage::new(16, 16);
        BitmapFont::with_scale(u32::MAX / CELL_ROWS).draw_text(&mut canvas, 0, 0, "II", Rgba::BLACK);
        assert_eq!(lit(&canvas), 16 * 16);
    }

    #[test]
    fn drawing_clips_at_canvas_edge() {
        let mut canvas = RgbaImage::new(3, 3);
        BitmapFont::with_scale(1).draw_text(&mut canvas, -2, -2, "W", Rgba::BLACK);
        assert!(lit(&canvas) > 0);
    }
}
