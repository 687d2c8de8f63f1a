//! Composite glyph cache key

/// Key for glyph lookup inside one page
///
/// Packs the rendering inputs into 64 bits:
/// - bits 63..32: outline thickness (raw `f32` bit pattern, no quantization)
/// - bit 31: bold
/// - bits 30..0: backend glyph index
///
/// The glyph index (not the code point) is stored, so code points that map
/// to the same glyph share one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct GlyphKey(u64);

impl GlyphKey {
    const BOLD_BIT: u64 = 1 << 31;
    const INDEX_MASK: u32 = 0x7FFF_FFFF;

    /// Create a new glyph key
    #[inline]
    pub fn new(outline_thickness: f32, bold: bool, glyph_index: u32) -> Self {
        let thickness = u64::from(outline_thickness.to_bits()) << 32;
        let bold = if bold { Self::BOLD_BIT } else { 0 };
        Self(thickness | bold | u64::from(glyph_index & Self::INDEX_MASK))
    }

    /// Raw 64-bit value
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn outline_thickness(self) -> f32 {
        f32::from_bits((self.0 >> 32) as u32)
    }

    #[inline]
    pub const fn is_bold(self) -> bool {
        self.0 & Self::BOLD_BIT != 0
    }

    #[inline]
    pub const fn glyph_index(self) -> u32 {
        (self.0 as u32) & Self::INDEX_MASK
    }
}
