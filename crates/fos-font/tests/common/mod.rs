//! Scripted font backend shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;

use fos_font::backend::{
    BitmapGlyph, DecorationMetrics, GlyphImage, LoadFlags, LoadedGlyph, SizeMetrics,
};
use fos_font::fixed::{self, F26Dot6};
use fos_font::{Bitmap, FontBackend, GlyphError, SizeError, Vector2};

/// Install a test subscriber so `RUST_LOG=fos_font=debug` shows cache activity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Copy)]
pub struct MockGlyph {
    pub index: u32,
    pub width: u32,
    pub rows: u32,
    pub lsb_delta: i32,
    pub rsb_delta: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MockOutline {
    pub width: u32,
    pub rows: u32,
    pub bold: bool,
    pub stroke: Option<F26Dot6>,
}

/// Backend answering from tables instead of font data
#[derive(Debug)]
pub struct MockBackend {
    pub family: Option<String>,
    pub scalable: bool,
    pub has_kerning: bool,
    pub fixed_sizes: Vec<u32>,
    pub units_per_em: i32,
    /// Ascender - descender + line gap, in font units
    pub line_height: i32,
    pub underline: DecorationMetrics,
    pub glyphs: HashMap<u32, MockGlyph>,
    /// Kerning by glyph index pair
    pub kerning: HashMap<(u32, u32), i32>,
    pub metrics: SizeMetrics,
    /// Number of `load_glyph` calls
    pub loads: usize,
    /// Number of successful `set_pixel_size` calls
    pub size_changes: usize,
}

impl MockBackend {
    pub fn scalable() -> Self {
        Self {
            family: Some("Mock Sans".into()),
            scalable: true,
            has_kerning: true,
            fixed_sizes: Vec::new(),
            units_per_em: 1000,
            line_height: 1200,
            underline: DecorationMetrics { position: -100, thickness: 50 },
            glyphs: HashMap::new(),
            kerning: HashMap::new(),
            metrics: SizeMetrics::default(),
            loads: 0,
            size_changes: 0,
        }
    }

    pub fn bitmap(sizes: &[u32]) -> Self {
        Self {
            family: Some("Mock Fixed".into()),
            scalable: false,
            fixed_sizes: sizes.to_vec(),
            ..Self::scalable()
        }
    }

    /// Map a code point to glyph `index` drawn as a `width` x `rows` block
    pub fn with_glyph(mut self, code_point: char, index: u32, width: u32, rows: u32) -> Self {
        self.glyphs.insert(
            code_point as u32,
            MockGlyph { index, width, rows, lsb_delta: 0, rsb_delta: 0 },
        );
        self
    }

    pub fn with_deltas(mut self, code_point: char, lsb_delta: i32, rsb_delta: i32) -> Self {
        if let Some(glyph) = self.glyphs.get_mut(&(code_point as u32)) {
            glyph.lsb_delta = lsb_delta;
            glyph.rsb_delta = rsb_delta;
        }
        self
    }

    pub fn with_kerning(mut self, left: char, right: char, value: i32) -> Self {
        let index = |c: char| self.glyphs.get(&(c as u32)).map_or(0, |g| g.index);
        let pair = (index(left), index(right));
        self.kerning.insert(pair, value);
        self
    }

    pub fn without_kerning(mut self) -> Self {
        self.has_kerning = false;
        self
    }

    /// Advance of a block glyph: one pixel wider than its ink
    fn advance(width: u32) -> F26Dot6 {
        F26Dot6::from_i32(width as i32 + 1)
    }
}

impl FontBackend for MockBackend {
    type Outline = MockOutline;

    fn family_name(&self) -> Option<String> {
        self.family.clone()
    }

    fn char_index(&self, code_point: u32) -> u32 {
        self.glyphs.get(&code_point).map_or(0, |glyph| glyph.index)
    }

    fn is_scalable(&self) -> bool {
        self.scalable
    }

    fn has_kerning(&self) -> bool {
        self.has_kerning
    }

    fn fixed_sizes(&self) -> Vec<u32> {
        self.fixed_sizes.clone()
    }

    fn size_metrics(&self) -> SizeMetrics {
        self.metrics
    }

    fn set_pixel_size(&mut self, size: u32) -> Result<(), SizeError> {
        if size == 0 {
            return Err(SizeError::Invalid(size));
        }
        if !self.scalable && !self.fixed_sizes.contains(&size) {
            return Err(SizeError::Unsupported {
                requested: size,
                available: self.fixed_sizes.clone(),
            });
        }
        let y_scale = fixed::div_fix((size as i32) << 6, self.units_per_em);
        self.metrics = SizeMetrics {
            x_ppem: size,
            y_ppem: size,
            y_scale,
            height: F26Dot6::from_bits(fixed::mul_fix(self.line_height, y_scale)).pix_round(),
            ascender: F26Dot6::from_i32(size as i32),
            descender: F26Dot6::ZERO,
        };
        self.size_changes += 1;
        Ok(())
    }

    fn underline_metrics(&self) -> DecorationMetrics {
        self.underline
    }

    fn kerning(&self, left: u32, right: u32) -> Vector2<i32> {
        Vector2::new(self.kerning.get(&(left, right)).copied().unwrap_or(0), 0)
    }

    fn load_glyph(
        &mut self,
        code_point: u32,
        _flags: LoadFlags,
    ) -> Result<LoadedGlyph<MockOutline>, GlyphError> {
        self.loads += 1;
        if self.metrics.x_ppem == 0 {
            return Err(GlyphError::SizeNotSet);
        }
        let glyph = *self
            .glyphs
            .get(&code_point)
            .ok_or(GlyphError::Unmapped(code_point))?;

        let image = if self.scalable {
            GlyphImage::Outline(MockOutline {
                width: glyph.width,
                rows: glyph.rows,
                ..MockOutline::default()
            })
        } else {
            // Fully inked 1-bit strike
            let pitch = (glyph.width as usize).div_ceil(8);
            let buffer = vec![0xFF; pitch * glyph.rows as usize];
            let bitmap = Bitmap::mono(glyph.width, glyph.rows, pitch, buffer)
                .ok_or_else(|| GlyphError::Rasterization("bad mono strike".into()))?;
            GlyphImage::Bitmap(BitmapGlyph {
                bitmap,
                left: 0,
                top: glyph.rows as i32,
                advance: Self::advance(glyph.width),
            })
        };

        Ok(LoadedGlyph {
            image,
            lsb_delta: glyph.lsb_delta,
            rsb_delta: glyph.rsb_delta,
        })
    }

    fn embolden_outline(&mut self, outline: &mut MockOutline, _strength: F26Dot6) {
        outline.bold = true;
    }

    fn stroke_outline(&mut self, outline: &mut MockOutline, radius: F26Dot6) {
        outline.stroke = Some(radius);
    }

    fn render_outline(&mut self, outline: MockOutline) -> Result<BitmapGlyph, GlyphError> {
        let grow = outline.stroke.map_or(0, |radius| 2 * radius.pix_ceil().floor_px() as u32)
            + u32::from(outline.bold);
        let width = outline.width + grow;
        let rows = outline.rows + grow;
        let bitmap = Bitmap::gray(width, rows, vec![255; (width * rows) as usize])
            .ok_or_else(|| GlyphError::Rasterization("bad coverage buffer".into()))?;

        Ok(BitmapGlyph {
            bitmap,
            left: 1,
            top: rows as i32 - 2,
            advance: Self::advance(outline.width),
        })
    }
}
