//! Cached glyph description

use crate::geometry::Rect;

/// A glyph ready to be drawn from its page atlas
///
/// Immutable once cached. All values are in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Glyph {
    /// Horizontal offset to the next glyph
    pub advance: f32,
    /// Left side bearing delta produced by hinting (26.6)
    pub lsb_delta: i32,
    /// Right side bearing delta produced by hinting (26.6)
    pub rsb_delta: i32,
    /// Bounding box relative to the baseline (top is y-down, so usually negative)
    pub bounds: Rect<f32>,
    /// Location of the glyph pixels inside the page atlas, padding excluded
    pub texture_rect: Rect<i32>,
}

impl Glyph {
    /// Glyph returned for anything that cannot be rendered
    pub const EMPTY: Glyph = Glyph {
        advance: 0.0,
        lsb_delta: 0,
        rsb_delta: 0,
        bounds: Rect::new(0.0, 0.0, 0.0, 0.0),
        texture_rect: Rect::new(0, 0, 0, 0),
    };

    /// True when the glyph has no pixels in the atlas
    pub fn is_blank(&self) -> bool {
        self.texture_rect.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_glyph() {
        assert_eq!(Glyph::EMPTY, Glyph::default());
        assert!(Glyph::EMPTY.is_blank());
    }
}
