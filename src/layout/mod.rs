//! Text layout engine.
//!
//! Turns free-form text into positioned lines for every generator that
//! renders text into pixels (raster images, video frames, image-set
//! placeholders) and for the PDF writer's line breaking.
//!
//! The engine is split the same way the work is:
//!
//! | Module | Purity | Responsibility |
//! |---|---|---|
//! | [`measure`] | pure | line breaking, per-line and total bounding boxes |
//! | [`render`] | placement pure, stamping on a [`Canvas`] | alignment, decorations, auto-resize |
//! | [`bitmap_font`] | pure | built-in 5×7 font implementing [`FontMetrics`] and [`GlyphPainter`] |
//!
//! Fonts are traits so tests can drive the engine with fixed-advance mock
//! metrics and assert exact coordinates.

pub mod bitmap_font;
pub mod measure;
pub mod render;

pub use bitmap_font::BitmapFont;
pub use measure::{FontMetrics, LayoutLine, LayoutResult, measure};
pub use render::{
    Border, Canvas, Decorations, GlyphPainter, MAX_CANVAS, MIN_CANVAS, PlacedLine, Point, Shadow,
    auto_resize, place, render,
};
