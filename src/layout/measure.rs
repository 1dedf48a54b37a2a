//! Line breaking and bounding-box measurement.
//!
//! ## Algorithm
//!
//! 1. Empty text produces an empty layout (no lines, 0×0).
//! 2. Text without a newline that fits `max_width` (or has no limit) is one
//!    line, kept verbatim.
//! 3. Otherwise the text is split on `\n` and every input line is wrapped
//!    greedily on spaces. A word wider than `max_width` on its own still gets
//!    a line to itself rather than being split mid-word.
//! 4. Blank input lines become empty output lines that keep the font's line
//!    height, so paragraph gaps survive.
//!
//! Total height is the sum of line heights plus `line_spacing` between each
//! pair of adjacent lines. Total width is the widest line.

/// Font metrics needed for measurement.
pub trait FontMetrics {
    /// Advance width of `text` rendered on one line.
    fn text_width(&self, text: &str) -> f32;
    /// Height of one line box.
    fn line_height(&self) -> f32;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutResult {
    pub lines: Vec<LayoutLine>,
    pub total_width: f32,
    pub total_height: f32,
    pub line_spacing: f32,
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub fn measure<F: FontMetrics + ?Sized>(
    text: &str,
    font: &F,
    max_width: Option<f32>,
    line_spacing: f32,
) -> LayoutResult {
    if text.is_empty() {
        return LayoutResult {
            line_spacing,
            ..LayoutResult::default()
        };
    }

    let fits = |s: &str| max_width.is_none_or(|max| font.text_width(s) <= max);

    let mut texts = Vec::new();
    if !text.contains('\n') && fits(text) {
        texts.push(text.to_string());
    } else {
        for raw in text.split('\n') {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            if raw.trim().is_empty() {
                texts.push(String::new());
                continue;
            }
            match max_width {
                Some(max) if !fits(raw) => wrap_words(raw, font, max, &mut texts),
                _ => texts.push(raw.to_string()),
            }
        }
    }

    let height = font.line_height();
    let lines: Vec<LayoutLine> = texts
        .into_iter()
        .map(|text| LayoutLine {
            width: if text.is_empty() { 0.0 } else { font.text_width(&text) },
            height,
            text,
        })
        .collect();

    let total_width = lines.iter().map(|l| l.width).fold(0.0, f32::max);
    let gaps = lines.len().saturating_sub(1) as f32;
    let total_height = lines.iter().map(|l| l.height).sum::<f32>() + gaps * line_spacing;

    LayoutResult {
        lines,
        total_width,
        total_height,
        line_spacing,
    }
}

fn wrap_words<F: FontMetrics + ?Sized>(line: &str, font: &F, max: f32, out: &mut Vec<String>) {
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if font.text_width(&candidate) <= max {
            current = candidate;
        } else {
            out.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}
