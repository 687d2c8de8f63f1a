//! Glyph pages
//!
//! A page holds every glyph rendered at one character size: a growable
//! atlas texture, the shelves used to pack it and the glyph table.

use std::collections::HashMap;

use crate::config::FontConfig;
use crate::geometry::{Rect, Vector2};
use crate::glyph::Glyph;
use crate::key::GlyphKey;
use crate::packer::{Row, ShelfPacker};
use crate::rasterizer::RasterizedGlyph;
use crate::texture::Texture;

/// Transparent border kept around every glyph, so that filtering never
/// samples a neighbour
pub const GLYPH_PADDING: u32 = 2;

/// Size of the opaque white block reserved at the atlas origin
const WHITE_BLOCK: u32 = 2;

/// First shelf starts below the white block
const FIRST_ROW: u32 = WHITE_BLOCK + 1;

/// Rect handed out when the atlas cannot make room
pub const DEGENERATE_RECT: Rect<i32> = Rect::new(0, 0, WHITE_BLOCK as i32, WHITE_BLOCK as i32);

/// Transparent white, the background of every atlas
const BACKGROUND: [u8; 4] = [255, 255, 255, 0];

/// Glyph cache for one character size
#[derive(Debug)]
pub struct Page<T: Texture> {
    texture: T,
    packer: ShelfPacker,
    glyphs: HashMap<GlyphKey, Glyph>,
    /// Atlas growth ceiling
    max_size: u32,
}

impl<T: Texture> Page<T> {
    /// Create an empty page with a fresh atlas
    pub fn new(config: &FontConfig, smooth: bool) -> Option<Self> {
        let max_size = T::maximum_size().min(config.max_texture_size);
        let size = config.initial_page_size.min(max_size);

        let Some(mut texture) = T::create(size, size) else {
            tracing::error!(size, "failed to create font page texture");
            return None;
        };

        let background = BACKGROUND.repeat(size as usize * size as usize);
        texture.update(&background, Vector2::new(size, size), Vector2::new(0, 0));

        // Opaque block used to draw underlines and strike-throughs
        let white = [255u8; (WHITE_BLOCK * WHITE_BLOCK * 4) as usize];
        texture.update(&white, Vector2::new(WHITE_BLOCK, WHITE_BLOCK), Vector2::new(0, 0));
        texture.set_smooth(smooth);

        tracing::debug!(size, max_size, "created font page");

        Some(Self {
            texture,
            packer: ShelfPacker::new(FIRST_ROW),
            glyphs: HashMap::new(),
            max_size,
        })
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }

    /// Cached glyph for a key, if any
    pub fn glyph(&self, key: GlyphKey) -> Option<&Glyph> {
        self.glyphs.get(&key)
    }

    /// Number of cached glyphs (including empty ones)
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Shelves of the atlas
    pub fn rows(&self) -> &[Row] {
        self.packer.rows()
    }

    /// Largest atlas dimension this page may reach
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        self.texture.set_smooth(smooth);
    }

    /// Return the glyph for `key`, producing it on a miss
    ///
    /// `rasterize` runs at most once per key; `None` caches an empty glyph.
    /// `scratch` is the pixel buffer reused across uploads.
    pub fn get_or_insert_with<F>(&mut self, key: GlyphKey, scratch: &mut Vec<u8>, rasterize: F) -> &Glyph
    where
        F: FnOnce() -> Option<RasterizedGlyph>,
    {
        if !self.glyphs.contains_key(&key) {
            let glyph = match rasterize() {
                Some(raster) => self.store(&raster, scratch),
                None => Glyph::EMPTY,
            };
            self.glyphs.insert(key, glyph);
        }
        self.glyphs.entry(key).or_default()
    }

    /// Reserve a `width` x `height` area in the atlas, growing it if needed
    ///
    /// Returns [`DEGENERATE_RECT`] when the atlas is already as large as it
    /// can get or a bigger texture cannot be created.
    pub fn find_glyph_rect(&mut self, width: u32, height: u32) -> Rect<i32> {
        let max_size = self.max_size;
        let atlas = self.texture.size();
        let texture = &mut self.texture;

        let grow = |size: Vector2<u32>| -> Option<Vector2<u32>> {
            let doubled = size
                .x
                .checked_mul(2)
                .zip(size.y.checked_mul(2))
                .filter(|&(w, h)| w <= max_size && h <= max_size);
            let Some((new_width, new_height)) = doubled else {
                tracing::error!(
                    width,
                    height,
                    max_size,
                    "failed to add a new glyph to the font: the maximum texture size has been reached"
                );
                return None;
            };

            let Some(mut grown) = T::create(new_width, new_height) else {
                tracing::error!(new_width, new_height, "failed to create new page texture");
                return None;
            };
            grown.set_smooth(texture.is_smooth());
            grown.update_from(texture);
            texture.swap(&mut grown);

            tracing::debug!(new_width, new_height, "grew font page texture");
            Some(texture.size())
        };

        self.packer.allocate(width, height, atlas, grow).unwrap_or(DEGENERATE_RECT)
    }

    /// Pack a rasterized glyph and upload its pixels
    fn store(&mut self, raster: &RasterizedGlyph, scratch: &mut Vec<u8>) -> Glyph {
        let mut glyph = Glyph {
            advance: raster.advance,
            lsb_delta: raster.lsb_delta,
            rsb_delta: raster.rsb_delta,
            ..Glyph::EMPTY
        };

        let bitmap = &raster.bitmap;
        if bitmap.is_empty() {
            return glyph;
        }

        let padded = Vector2::new(bitmap.width + 2 * GLYPH_PADDING, bitmap.rows + 2 * GLYPH_PADDING);
        let rect = self.find_glyph_rect(padded.x, padded.y);

        glyph.bounds = Rect::new(
            raster.left as f32,
            -raster.top as f32,
            bitmap.width as f32,
            bitmap.rows as f32,
        );

        // Nothing was reserved, leave the atlas untouched
        if rect == DEGENERATE_RECT {
            return glyph;
        }

        let pad = GLYPH_PADDING as i32;
        glyph.texture_rect = Rect::new(
            rect.left + pad,
            rect.top + pad,
            rect.width - 2 * pad,
            rect.height - 2 * pad,
        );

        // White pixels, alpha carries the coverage
        scratch.clear();
        scratch.resize(padded.x as usize * padded.y as usize * 4, 0);
        for pixel in scratch.chunks_exact_mut(4) {
            pixel.copy_from_slice(&BACKGROUND);
        }
        for y in 0..bitmap.rows {
            let row = (y + GLYPH_PADDING) as usize * padded.x as usize;
            for x in 0..bitmap.width {
                let index = (row + (x + GLYPH_PADDING) as usize) * 4 + 3;
                scratch[index] = bitmap.coverage(x, y);
            }
        }

        let offset = Vector2::new(rect.left as u32, rect.top as u32);
        self.texture.update(scratch, padded, offset);

        glyph
    }
}
