//! Glyph rasterization pipeline
//!
//! Drives a [`FontBackend`] from code point to coverage bitmap:
//! load, optionally embolden, optionally stroke, render.

use crate::backend::{BitmapGlyph, FontBackend, GlyphError, GlyphImage, LoadFlags};
use crate::bitmap::Bitmap;
use crate::fixed::F26Dot6;

/// Output of the pipeline, ready to be packed into a page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterizedGlyph {
    pub bitmap: Bitmap,
    /// Horizontal offset from the pen position to the bitmap
    pub left: i32,
    /// Distance from the baseline up to the bitmap top
    pub top: i32,
    /// Advance in whole pixels
    pub advance: f32,
    pub lsb_delta: i32,
    pub rsb_delta: i32,
}

/// Stateless rasterization pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct Rasterizer;

impl Rasterizer {
    /// Emboldening strength (one pixel)
    pub const BOLD_WEIGHT: F26Dot6 = F26Dot6::ONE;

    /// Rasterize a code point at the backend's current size
    pub fn rasterize<B: FontBackend>(
        backend: &mut B,
        code_point: u32,
        bold: bool,
        outline_thickness: f32,
    ) -> Result<RasterizedGlyph, GlyphError> {
        let outlined = outline_thickness != 0.0;
        let flags = LoadFlags {
            no_bitmap: outlined,
            force_autohint: true,
        };
        let loaded = backend.load_glyph(code_point, flags)?;

        let mut outline_bold = false;
        let glyph: BitmapGlyph = match loaded.image {
            GlyphImage::Outline(mut outline) => {
                if bold {
                    backend.embolden_outline(&mut outline, Self::BOLD_WEIGHT);
                    outline_bold = true;
                }
                if outlined {
                    backend.stroke_outline(&mut outline, F26Dot6::from_f32(outline_thickness));
                }
                backend.render_outline(outline)?
            }
            GlyphImage::Bitmap(mut glyph) => {
                if bold {
                    backend.embolden_bitmap(&mut glyph, Self::BOLD_WEIGHT, Self::BOLD_WEIGHT);
                }
                if outlined {
                    tracing::warn!(
                        code_point,
                        "failed to outline glyph (no fallback available)"
                    );
                }
                glyph
            }
        };

        let mut advance = glyph.advance.floor_px() as f32;
        if outline_bold {
            advance += Self::BOLD_WEIGHT.to_f32();
        }

        tracing::trace!(
            code_point,
            bold,
            outline_thickness,
            width = glyph.bitmap.width,
            rows = glyph.bitmap.rows,
            "rasterized glyph"
        );

        Ok(RasterizedGlyph {
            bitmap: glyph.bitmap,
            left: glyph.left,
            top: glyph.top,
            advance,
            lsb_delta: loaded.lsb_delta,
            rsb_delta: loaded.rsb_delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DecorationMetrics, LoadedGlyph, SizeError, SizeMetrics};
    use crate::geometry::Vector2;

    /// Outline made of a square side length plus the operations applied to it
    #[derive(Debug, Default)]
    struct Square {
        side: u32,
        bold: Option<F26Dot6>,
        stroke: Option<F26Dot6>,
    }

    /// Backend that serves squares for 'A' and a bitmap for 'B'
    #[derive(Default)]
    struct SquareBackend {
        last_flags: Option<LoadFlags>,
        rendered: Vec<(Option<F26Dot6>, Option<F26Dot6>)>,
    }

    impl FontBackend for SquareBackend {
        type Outline = Square;

        fn family_name(&self) -> Option<String> {
            None
        }
        fn char_index(&self, code_point: u32) -> u32 {
            code_point
        }
        fn is_scalable(&self) -> bool {
            true
        }
        fn has_kerning(&self) -> bool {
            false
        }
        fn fixed_sizes(&self) -> Vec<u32> {
            Vec::new()
        }
        fn size_metrics(&self) -> SizeMetrics {
            SizeMetrics::default()
        }
        fn set_pixel_size(&mut self, _: u32) -> Result<(), SizeError> {
            Ok(())
        }
        fn underline_metrics(&self) -> DecorationMetrics {
            DecorationMetrics::default()
        }
        fn kerning(&self, _: u32, _: u32) -> Vector2<i32> {
            Vector2::default()
        }

        fn load_glyph(&mut self, code_point: u32, flags: LoadFlags) -> Result<LoadedGlyph<Square>, GlyphError> {
            self.last_flags = Some(flags);
            let image = match code_point {
                0x41 => GlyphImage::Outline(Square { side: 4, ..Square::default() }),
                0x42 => GlyphImage::Bitmap(BitmapGlyph {
                    bitmap: Bitmap::gray(3, 3, vec![200; 9]).unwrap(),
                    left: 0,
                    top: 3,
                    advance: F26Dot6::from_i32(4),
                }),
                _ => return Err(GlyphError::Unmapped(code_point)),
            };
            Ok(LoadedGlyph { image, lsb_delta: -3, rsb_delta: 5 })
        }

        fn embolden_outline(&mut self, outline: &mut Square, strength: F26Dot6) {
            outline.bold = Some(strength);
        }

        fn stroke_outline(&mut self, outline: &mut Square, radius: F26Dot6) {
            outline.stroke = Some(radius);
        }

        fn render_outline(&mut self, outline: Square) -> Result<BitmapGlyph, GlyphError> {
            self.rendered.push((outline.bold, outline.stroke));
            Ok(BitmapGlyph {
                bitmap: Bitmap::gray(outline.side, outline.side, vec![255; (outline.side * outline.side) as usize]).unwrap(),
                left: 1,
                top: outline.side as i32,
                advance: F26Dot6::from_bits(5 * 64 + 40),
            })
        }
    }

    #[test]
    fn test_plain_outline() {
        let mut backend = SquareBackend::default();
        let glyph = Rasterizer::rasterize(&mut backend, 0x41, false, 0.0).unwrap();

        assert_eq!(backend.last_flags, Some(LoadFlags { no_bitmap: false, force_autohint: true }));
        assert_eq!(backend.rendered, vec![(None, None)]);
        assert_eq!(glyph.advance, 5.0);
        assert_eq!((glyph.left, glyph.top), (1, 4));
        assert_eq!((glyph.lsb_delta, glyph.rsb_delta), (-3, 5));
    }

    #[test]
    fn test_bold_outline_adds_advance() {
        let mut backend = SquareBackend::default();
        let glyph = Rasterizer::rasterize(&mut backend, 0x41, true, 0.0).unwrap();

        assert_eq!(backend.rendered, vec![(Some(F26Dot6::ONE), None)]);
        assert_eq!(glyph.advance, 6.0);
    }

    #[test]
    fn test_outline_thickness_requests_stroke() {
        let mut backend = SquareBackend::default();
        Rasterizer::rasterize(&mut backend, 0x41, false, 1.5).unwrap();

        assert_eq!(backend.last_flags.map(|f| f.no_bitmap), Some(true));
        assert_eq!(backend.rendered, vec![(None, Some(F26Dot6::from_bits(96)))]);
    }

    #[test]
    fn test_bold_bitmap_bakes_advance() {
        let mut backend = SquareBackend::default();
        let glyph = Rasterizer::rasterize(&mut backend, 0x42, true, 0.0).unwrap();

        assert_eq!((glyph.bitmap.width, glyph.bitmap.rows), (4, 4));
        assert_eq!(glyph.top, 4);
        // 4 + 1 from emboldening, nothing extra
        assert_eq!(glyph.advance, 5.0);
        assert!(backend.rendered.is_empty());
    }

    #[test]
    fn test_outlined_bitmap_is_left_as_is() {
        let mut backend = SquareBackend::default();
        let glyph = Rasterizer::rasterize(&mut backend, 0x42, false, 2.0).unwrap();

        assert_eq!((glyph.bitmap.width, glyph.bitmap.rows), (3, 3));
        assert_eq!(glyph.advance, 4.0);
    }

    #[test]
    fn test_load_failure_propagates() {
        let mut backend = SquareBackend::default();
        let result = Rasterizer::rasterize(&mut backend, 0x43, false, 0.0);
        assert_eq!(result, Err(GlyphError::Unmapped(0x43)));
    }
}
