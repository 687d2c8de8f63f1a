//! Glyph coverage bitmaps

/// Pixel format of a glyph bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelMode {
    /// 1 bit per pixel, most significant bit first, rows padded to `pitch`
    Mono,
    /// 8 bits of coverage per pixel
    #[default]
    Gray,
}

/// A coverage bitmap produced by the rasterizer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub rows: u32,
    /// Bytes per row
    pub pitch: usize,
    pub pixel_mode: PixelMode,
    pub buffer: Vec<u8>,
}

impl Bitmap {
    /// Create an 8-bit coverage bitmap
    ///
    /// Returns `None` if `buffer` is too small for the dimensions.
    pub fn gray(width: u32, rows: u32, buffer: Vec<u8>) -> Option<Self> {
        let pitch = width as usize;
        (buffer.len() >= pitch * rows as usize).then_some(Self {
            width,
            rows,
            pitch,
            pixel_mode: PixelMode::Gray,
            buffer,
        })
    }

    /// Create a 1-bit bitmap with rows padded to `pitch` bytes
    pub fn mono(width: u32, rows: u32, pitch: usize, buffer: Vec<u8>) -> Option<Self> {
        let valid = pitch * 8 >= width as usize && buffer.len() >= pitch * rows as usize;
        valid.then_some(Self {
            width,
            rows,
            pitch,
            pixel_mode: PixelMode::Mono,
            buffer,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }

    /// Coverage of one pixel as alpha (0-255)
    ///
    /// Mono pixels expand to 0 or 255.
    #[inline]
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        let row = y as usize * self.pitch;
        match self.pixel_mode {
            PixelMode::Gray => self.buffer.get(row + x as usize).copied().unwrap_or(0),
            PixelMode::Mono => {
                let byte = self.buffer.get(row + x as usize / 8).copied().unwrap_or(0);
                if byte & (0x80 >> (x % 8)) != 0 { 255 } else { 0 }
            }
        }
    }

    /// Convert to an 8-bit coverage bitmap
    pub fn to_gray(&self) -> Bitmap {
        if self.pixel_mode == PixelMode::Gray {
            return self.clone();
        }
        let mut buffer = Vec::with_capacity(self.width as usize * self.rows as usize);
        for y in 0..self.rows {
            for x in 0..self.width {
                buffer.push(self.coverage(x, y));
            }
        }
        Bitmap {
            width: self.width,
            rows: self.rows,
            pitch: self.width as usize,
            pixel_mode: PixelMode::Gray,
            buffer,
        }
    }

    /// Thicken the bitmap by `x` pixels to the right and `y` pixels upward
    ///
    /// The result is always 8-bit. Each output pixel takes the maximum
    /// coverage of the source pixels it covers after dilation.
    pub fn embolden(&mut self, x: u32, y: u32) {
        if self.is_empty() || (x == 0 && y == 0) {
            return;
        }
        let src = self.to_gray();
        let width = src.width + x;
        let rows = src.rows + y;
        let mut buffer = vec![0u8; width as usize * rows as usize];

        for sy in 0..src.rows {
            for sx in 0..src.width {
                let value = src.buffer[sy as usize * src.pitch + sx as usize];
                if value == 0 {
                    continue;
                }
                // Source row sy lands at sy + y, then spreads up by y rows
                for dy in 0..=y {
                    let row = (sy + y - dy) as usize * width as usize;
                    for dx in 0..=x {
                        let dst = &mut buffer[row + (sx + dx) as usize];
                        *dst = (*dst).max(value);
                    }
                }
            }
        }

        *self = Bitmap {
            width,
            rows,
            pitch: width as usize,
            pixel_mode: PixelMode::Gray,
            buffer,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_coverage() {
        // 10 pixels wide needs 2 bytes per row
        let bitmap = Bitmap::mono(10, 1, 2, vec![0b1000_0001, 0b0100_0000]).unwrap();
        assert_eq!(bitmap.coverage(0, 0), 255);
        assert_eq!(bitmap.coverage(1, 0), 0);
        assert_eq!(bitmap.coverage(7, 0), 255);
        assert_eq!(bitmap.coverage(9, 0), 255);
        assert_eq!(bitmap.coverage(8, 0), 0);
    }

    #[test]
    fn test_invalid_buffers_rejected() {
        assert!(Bitmap::gray(4, 4, vec![0; 15]).is_none());
        assert!(Bitmap::mono(9, 1, 1, vec![0; 1]).is_none());
    }

    #[test]
    fn test_to_gray() {
        let bitmap = Bitmap::mono(2, 2, 1, vec![0b1000_0000, 0b0100_0000]).unwrap();
        let gray = bitmap.to_gray();
        assert_eq!(gray.pixel_mode, PixelMode::Gray);
        assert_eq!(gray.buffer, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_embolden_grows_right_and_up() {
        let mut bitmap = Bitmap::gray(1, 1, vec![200]).unwrap();
        bitmap.embolden(1, 1);

        assert_eq!(bitmap.width, 2);
        assert_eq!(bitmap.rows, 2);
        assert_eq!(bitmap.buffer, vec![200, 200, 200, 200]);
    }

    #[test]
    fn test_embolden_empty_is_noop() {
        let mut bitmap = Bitmap::default();
        bitmap.embolden(1, 1);
        assert!(bitmap.is_empty());
    }
}
