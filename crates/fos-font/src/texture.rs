//! Atlas texture storage
//!
//! Pages only need a handful of operations from their texture: create,
//! partial upload, full copy (for growth), filtering flag and swap.
//! [`ImageTexture`] implements them on a CPU-side RGBA8 buffer.

use crate::geometry::Vector2;

/// Largest texture dimension supported by [`ImageTexture`]
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// Bytes per RGBA8 pixel
const BPP: usize = 4;

/// Texture storage used by glyph pages
pub trait Texture: Sized {
    /// Create a fully transparent texture
    ///
    /// Returns `None` for empty or unsupported dimensions.
    fn create(width: u32, height: u32) -> Option<Self>;

    /// Largest supported width or height
    fn maximum_size() -> u32;

    /// Current dimensions
    fn size(&self) -> Vector2<u32>;

    /// Upload RGBA8 `pixels` of `size` at `offset`
    fn update(&mut self, pixels: &[u8], size: Vector2<u32>, offset: Vector2<u32>);

    /// Copy the whole content of `other` at the origin
    fn update_from(&mut self, other: &Self);

    /// Enable or disable bilinear filtering
    fn set_smooth(&mut self, smooth: bool);

    fn is_smooth(&self) -> bool;

    fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }
}

/// RGBA8 texture kept in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    /// Pixel data (RGBA, not premultiplied)
    pixels: Vec<u8>,
    smooth: bool,
}

impl ImageTexture {
    /// Raw RGBA pixels, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BPP;
        let px = &self.pixels[idx..idx + BPP];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert to a premultiplied tiny-skia pixmap (for debugging or export)
    pub fn to_pixmap(&self) -> Option<tiny_skia::Pixmap> {
        let mut pixmap = tiny_skia::Pixmap::new(self.width, self.height)?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(self.pixels.chunks_exact(BPP)) {
            *dst = tiny_skia::ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }
        Some(pixmap)
    }

    /// Encode the texture as PNG
    pub fn encode_png(&self) -> Option<Vec<u8>> {
        self.to_pixmap()?.encode_png().ok()
    }
}

impl Texture for ImageTexture {
    fn create(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BPP],
            smooth: false,
        })
    }

    fn maximum_size() -> u32 {
        MAX_TEXTURE_SIZE
    }

    fn size(&self) -> Vector2<u32> {
        Vector2::new(self.width, self.height)
    }

    fn update(&mut self, pixels: &[u8], size: Vector2<u32>, offset: Vector2<u32>) {
        let stride = self.width as usize * BPP;
        let src_stride = size.x as usize * BPP;

        // Clip to the texture bounds
        let copy_w = size.x.min(self.width.saturating_sub(offset.x)) as usize * BPP;
        let copy_h = size.y.min(self.height.saturating_sub(offset.y)) as usize;
        if copy_w == 0 || copy_h == 0 {
            return;
        }

        for row in 0..copy_h {
            let src_start = row * src_stride;
            let src_end = src_start + copy_w;
            if src_end > pixels.len() {
                break;
            }
            let dst_start = (offset.y as usize + row) * stride + offset.x as usize * BPP;
            self.pixels[dst_start..dst_start + copy_w].copy_from_slice(&pixels[src_start..src_end]);
        }
    }

    fn update_from(&mut self, other: &Self) {
        self.update(&other.pixels, other.size(), Vector2::new(0, 0));
    }

    fn set_smooth(&mut self, smooth: bool) {
        self.smooth = smooth;
    }

    fn is_smooth(&self) -> bool {
        self.smooth
    }
}
