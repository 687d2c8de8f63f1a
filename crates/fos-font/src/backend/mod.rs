//! Font backend contract
//!
//! The glyph cache never parses font files or scan-converts outlines
//! itself. It drives a [`FontBackend`], which keeps a "current pixel size"
//! state and produces outlines, bitmaps, metrics and kerning for it.
//!
//! [`TtfBackend`] implements the contract with ttf-parser and tiny-skia.

mod ttf;

pub use ttf::{TtfBackend, TtfOutline};

use crate::bitmap::Bitmap;
use crate::fixed::{F26Dot6, Fixed16};
use crate::geometry::Vector2;

/// Per-glyph failures, absorbed by the cache into an empty glyph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlyphError {
    #[error("code point U+{0:04X} has no glyph")]
    Unmapped(u32),

    #[error("no pixel size selected")]
    SizeNotSet,

    #[error("glyph {0} has no outline or bitmap at this size")]
    NoImage(u32),

    #[error("rasterization failed: {0}")]
    Rasterization(String),
}

/// Failure to select a pixel size
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SizeError {
    #[error("invalid pixel size {0}")]
    Invalid(u32),

    #[error("bitmap font has no strike for size {requested} (available: {available:?})")]
    Unsupported { requested: u32, available: Vec<u32> },
}

/// Glyph loading options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadFlags {
    /// Skip embedded bitmaps so a real outline is produced
    pub no_bitmap: bool,
    /// Prefer the auto-hinter over the font's own hinting
    pub force_autohint: bool,
}

/// Metrics of the current pixel size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeMetrics {
    /// Horizontal pixels per em (0 until a size is set)
    pub x_ppem: u32,
    /// Vertical pixels per em
    pub y_ppem: u32,
    /// Font units to 26.6 pixels
    pub y_scale: Fixed16,
    /// Baseline-to-baseline distance
    pub height: F26Dot6,
    pub ascender: F26Dot6,
    pub descender: F26Dot6,
}

/// Underline geometry in unscaled font units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecorationMetrics {
    /// Offset of the underline center from the baseline (negative is below)
    pub position: i32,
    pub thickness: i32,
}

/// A rendered glyph bitmap with its placement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitmapGlyph {
    pub bitmap: Bitmap,
    /// Distance from the pen position to the left edge of the bitmap
    pub left: i32,
    /// Distance from the baseline to the top edge of the bitmap (y-up)
    pub top: i32,
    /// Horizontal advance
    pub advance: F26Dot6,
}

/// Image of a freshly loaded glyph
#[derive(Debug, Clone)]
pub enum GlyphImage<O> {
    /// Vector outline awaiting rasterization
    Outline(O),
    /// Pre-rendered bitmap
    Bitmap(BitmapGlyph),
}

/// Result of [`FontBackend::load_glyph`]
#[derive(Debug, Clone)]
pub struct LoadedGlyph<O> {
    pub image: GlyphImage<O>,
    /// Left side bearing change caused by hinting (26.6)
    pub lsb_delta: i32,
    /// Right side bearing change caused by hinting (26.6)
    pub rsb_delta: i32,
}

/// Everything the glyph cache needs from a font engine
///
/// All fixed-point values follow the 26.6 convention unless noted.
pub trait FontBackend {
    /// Backend representation of a glyph outline
    type Outline;

    /// Family name of the face, if it has one
    fn family_name(&self) -> Option<String>;

    /// Glyph index for a Unicode code point (0 when missing)
    fn char_index(&self, code_point: u32) -> u32;

    /// Whether the face has vector outlines
    fn is_scalable(&self) -> bool;

    /// Whether the face carries a kerning table
    fn has_kerning(&self) -> bool;

    /// Pixel sizes available in a bitmap-only face
    fn fixed_sizes(&self) -> Vec<u32>;

    /// Metrics of the currently selected size
    fn size_metrics(&self) -> SizeMetrics;

    /// Select the pixel size used by every following call
    fn set_pixel_size(&mut self, size: u32) -> Result<(), SizeError>;

    /// Underline position and thickness in font units
    fn underline_metrics(&self) -> DecorationMetrics;

    /// Unfitted kerning between two glyph indices
    ///
    /// 26.6 for scalable faces, whole pixels for bitmap faces.
    fn kerning(&self, left: u32, right: u32) -> Vector2<i32>;

    /// Load the glyph of a code point at the current size
    fn load_glyph(
        &mut self,
        code_point: u32,
        flags: LoadFlags,
    ) -> Result<LoadedGlyph<Self::Outline>, GlyphError>;

    /// Thicken an outline by `strength` (total, both sides combined)
    fn embolden_outline(&mut self, outline: &mut Self::Outline, strength: F26Dot6);

    /// Replace an outline by its border stroked with round caps and joins
    fn stroke_outline(&mut self, outline: &mut Self::Outline, radius: F26Dot6);

    /// Convert an outline into an anti-aliased bitmap
    fn render_outline(&mut self, outline: Self::Outline) -> Result<BitmapGlyph, GlyphError>;

    /// Thicken a bitmap glyph; the extra width is always added to its advance
    fn embolden_bitmap(&mut self, glyph: &mut BitmapGlyph, x_strength: F26Dot6, y_strength: F26Dot6) {
        let x = x_strength.floor_px().max(0) as u32;
        let y = y_strength.floor_px().max(0) as u32;
        glyph.advance = glyph.advance + x_strength;
        if glyph.bitmap.is_empty() {
            return;
        }
        glyph.bitmap.embolden(x, y);
        glyph.top += y as i32;
    }
}
