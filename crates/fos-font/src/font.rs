//! Font loading and the per-size glyph cache
//!
//! A [`Font`] owns one backend instance and a [`Page`] per character size.
//! Glyphs are rasterized on first request and then served from the page;
//! metrics (kerning, line spacing, underline) are computed on demand for
//! the requested size.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use crate::backend::{FontBackend, TtfBackend};
use crate::config::FontConfig;
use crate::fixed;
use crate::glyph::Glyph;
use crate::key::GlyphKey;
use crate::page::Page;
use crate::rasterizer::Rasterizer;
use crate::stream::{self, FileInputStream, InputStream, MemoryInputStream};
use crate::texture::{ImageTexture, Texture};
use crate::{FontError, Result};

/// Descriptive information about a font
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontInfo {
    /// Family name, empty if the font does not provide one
    pub family: String,
}

/// A font with its cache of rendered glyphs
///
/// Every query that may rasterize takes `&mut self`: the backend keeps a
/// "current size" state, so a font must not be used from two places at
/// once. Without a backend (see [`Font::default`]) all queries answer
/// zero values.
#[derive(Debug)]
pub struct Font<B: FontBackend = TtfBackend, T: Texture = ImageTexture> {
    backend: Option<B>,
    info: FontInfo,
    smooth: bool,
    config: FontConfig,
    pages: HashMap<u32, Page<T>>,
    /// Scratch RGBA buffer reused for every glyph upload
    pixel_buffer: Vec<u8>,
}

impl Font {
    /// Load a font from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut stream = FileInputStream::open(path).map_err(|err| {
            tracing::error!(path = %path.display(), %err, "failed to load font (failed to open file)");
            FontError::from(err)
        })?;
        Self::from_stream(&mut stream)
    }

    /// Load a font from bytes in memory
    ///
    /// The data is copied, so the buffer does not need to outlive the font.
    pub fn from_memory(data: &[u8]) -> Result<Self> {
        Self::from_stream(&mut MemoryInputStream::new(data))
    }

    /// Load a font from a custom stream
    pub fn from_stream<S: InputStream + ?Sized>(stream: &mut S) -> Result<Self> {
        let data = stream::read_all(stream).inspect_err(|err| {
            tracing::error!(%err, "failed to load font (failed to read stream)");
        })?;
        let backend = TtfBackend::open(data).inspect_err(|err| {
            tracing::error!(%err, "failed to load font");
        })?;
        Ok(Self::from_backend(backend))
    }
}

impl<B: FontBackend, T: Texture> Default for Font<B, T> {
    fn default() -> Self {
        let config = FontConfig::default();
        Self {
            backend: None,
            info: FontInfo::default(),
            smooth: config.smooth,
            config,
            pages: HashMap::new(),
            pixel_buffer: Vec::new(),
        }
    }
}

impl<B: FontBackend, T: Texture> Font<B, T> {
    /// Wrap an already opened backend
    pub fn from_backend(backend: B) -> Self {
        let info = FontInfo {
            family: backend.family_name().unwrap_or_default(),
        };
        tracing::debug!(family = %info.family, scalable = backend.is_scalable(), "loaded font");
        Self {
            backend: Some(backend),
            info,
            ..Self::default()
        }
    }

    /// Apply a cache configuration
    pub fn with_config(mut self, config: FontConfig) -> Self {
        self.config = config;
        self.set_smooth(config.smooth);
        self
    }

    pub fn info(&self) -> &FontInfo {
        &self.info
    }

    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Get a glyph, rasterizing it on first use
    ///
    /// Glyphs that cannot be produced (missing code point, unsupported
    /// size, atlas failure) are cached as [`Glyph::EMPTY`].
    pub fn glyph(&mut self, code_point: u32, size: u32, bold: bool, outline_thickness: f32) -> &Glyph {
        let Some(page) = Self::load_page(&mut self.pages, size, &self.config, self.smooth) else {
            return &Glyph::EMPTY;
        };

        let index = self.backend.as_ref().map_or(0, |backend| backend.char_index(code_point));
        let key = GlyphKey::new(outline_thickness, bold, index);
        let backend = &mut self.backend;

        page.get_or_insert_with(key, &mut self.pixel_buffer, || {
            let backend = backend.as_mut()?;
            if !set_current_size(backend, size) {
                return None;
            }
            Rasterizer::rasterize(backend, code_point, bold, outline_thickness)
                .inspect_err(|err| tracing::debug!(code_point, size, %err, "glyph not rendered"))
                .ok()
        })
    }

    /// Check whether the font maps a code point to a glyph
    pub fn has_glyph(&self, code_point: u32) -> bool {
        self.backend
            .as_ref()
            .is_some_and(|backend| backend.char_index(code_point) != 0)
    }

    /// Horizontal offset to apply between two characters, in pixels
    pub fn kerning(&mut self, first: u32, second: u32, size: u32, bold: bool) -> f32 {
        // Special case where first or second is 0 (null character)
        if first == 0 || second == 0 {
            return 0.0;
        }
        let Some(backend) = self.backend.as_mut() else {
            return 0.0;
        };
        if !set_current_size(backend, size) {
            return 0.0;
        }

        let first_rsb_delta = self.glyph(first, size, bold, 0.0).rsb_delta;
        let second_lsb_delta = self.glyph(second, size, bold, 0.0).lsb_delta;

        let Some(backend) = self.backend.as_ref() else {
            return 0.0;
        };
        // Without a kerning table only the hinting deltas apply
        let kerning_x = if backend.has_kerning() {
            backend.kerning(backend.char_index(first), backend.char_index(second)).x
        } else {
            0
        };

        // Bitmap fonts report whole pixels
        if !backend.is_scalable() {
            return kerning_x as f32;
        }

        // Combine kerning with hinting deltas and round to whole pixels
        ((second_lsb_delta - first_rsb_delta + kerning_x + 32) as f32 / 64.0).floor()
    }

    /// Distance between two consecutive baselines, in pixels
    pub fn line_spacing(&mut self, size: u32) -> f32 {
        match self.sized_backend(size) {
            Some(backend) => backend.size_metrics().height.to_bits() as f32 / 64.0,
            None => 0.0,
        }
    }

    /// Underline offset from the baseline (positive is below), in pixels
    pub fn underline_position(&mut self, size: u32) -> f32 {
        let Some(backend) = self.sized_backend(size) else {
            return 0.0;
        };
        // Bitmap fonts have no underline metrics
        if !backend.is_scalable() {
            return size as f32 / 10.0;
        }
        let position = backend.underline_metrics().position;
        -fixed::mul_fix(position, backend.size_metrics().y_scale) as f32 / 64.0
    }

    /// Underline thickness, in pixels
    pub fn underline_thickness(&mut self, size: u32) -> f32 {
        let Some(backend) = self.sized_backend(size) else {
            return 0.0;
        };
        if !backend.is_scalable() {
            return size as f32 / 14.0;
        }
        let thickness = backend.underline_metrics().thickness;
        fixed::mul_fix(thickness, backend.size_metrics().y_scale) as f32 / 64.0
    }

    /// Atlas texture holding the glyphs of a size
    ///
    /// The page is created if needed. `None` only if its texture cannot be
    /// created.
    pub fn texture(&mut self, size: u32) -> Option<&T> {
        Self::load_page(&mut self.pages, size, &self.config, self.smooth).map(|page| page.texture())
    }

    /// Enable or disable smoothing on every page texture
    pub fn set_smooth(&mut self, smooth: bool) {
        self.smooth = smooth;
        for page in self.pages.values_mut() {
            page.set_smooth(smooth);
        }
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    /// Number of character sizes with a page
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of glyphs cached for a size
    pub fn glyph_count(&self, size: u32) -> usize {
        self.pages.get(&size).map_or(0, Page::len)
    }

    /// Page for a size, if it exists
    pub fn page(&self, size: u32) -> Option<&Page<T>> {
        self.pages.get(&size)
    }

    fn sized_backend(&mut self, size: u32) -> Option<&B> {
        let backend = self.backend.as_mut()?;
        set_current_size(backend, size).then_some(&*backend)
    }

    fn load_page<'a>(
        pages: &'a mut HashMap<u32, Page<T>>,
        size: u32,
        config: &FontConfig,
        smooth: bool,
    ) -> Option<&'a mut Page<T>> {
        match pages.entry(size) {
            Entry::Occupied(entry) => Some(entry.into_mut()),
            Entry::Vacant(entry) => Page::new(config, smooth).map(|page| entry.insert(page)),
        }
    }
}

/// Make `size` the backend's current size, if it is not already
fn set_current_size<B: FontBackend>(backend: &mut B, size: u32) -> bool {
    if backend.size_metrics().x_ppem == size {
        return true;
    }
    match backend.set_pixel_size(size) {
        Ok(()) => true,
        Err(err) => {
            if backend.is_scalable() {
                tracing::error!(size, %err, "failed to set font size");
            } else {
                tracing::error!(
                    size,
                    available = ?backend.fixed_sizes(),
                    "failed to set bitmap font size"
                );
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_font() {
        let mut font: Font = Font::default();

        assert_eq!(font.info().family, "");
        assert!(!font.has_glyph('A' as u32));
        assert_eq!(*font.glyph('A' as u32, 12, false, 0.0), Glyph::EMPTY);
        assert_eq!(font.kerning('A' as u32, 'V' as u32, 12, false), 0.0);
        assert_eq!(font.line_spacing(12), 0.0);
        assert_eq!(font.underline_position(12), 0.0);
        assert_eq!(font.underline_thickness(12), 0.0);
    }

    #[test]
    fn test_empty_font_still_has_pages() {
        let mut font: Font = Font::default();
        let texture = font.texture(20).unwrap();

        assert_eq!(texture.size().x, 128);
        assert_eq!(font.page_count(), 1);
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(Font::from_memory(&[]), Err(FontError::EmptyData)));
        assert!(matches!(Font::from_memory(b"nope"), Err(FontError::FaceParsing(_))));
        assert!(matches!(
            Font::from_file("/nonexistent/fos-font/missing.ttf"),
            Err(FontError::Io(_))
        ));
    }

    #[test]
    fn test_smooth_propagates() {
        let mut font: Font = Font::default();
        font.texture(10);
        font.set_smooth(false);
        font.texture(11);

        assert!(!font.is_smooth());
        assert!(!font.texture(10).unwrap().is_smooth());
        assert!(!font.texture(11).unwrap().is_smooth());
    }

    #[test]
    fn test_config_applies() {
        let config = FontConfig::new().with_initial_page_size(64).with_smooth(false);
        let mut font: Font = Font::default().with_config(config);

        assert!(!font.is_smooth());
        assert_eq!(font.texture(10).unwrap().size().x, 64);
    }
}
