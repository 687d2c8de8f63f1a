//! Font backend built on ttf-parser (parsing) and tiny-skia (rasterization)

use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathStroker, Pixmap, Stroke, Transform};
use ttf_parser::{Face, GlyphId, OutlineBuilder, RasterGlyphImage, RasterImageFormat};

use super::{
    BitmapGlyph, DecorationMetrics, FontBackend, GlyphError, GlyphImage, LoadFlags, LoadedGlyph,
    SizeError, SizeMetrics,
};
use crate::bitmap::Bitmap;
use crate::fixed::{self, F26Dot6};
use crate::geometry::Vector2;
use crate::{FontError, Result};

/// Glyph outline in pixel space (y-down, origin on the baseline)
#[derive(Debug, Clone)]
pub struct TtfOutline {
    /// `None` for glyphs without contours (e.g. space)
    path: Option<tiny_skia::Path>,
    advance: F26Dot6,
    /// Pending emboldening, in pixels
    embolden: f32,
}

impl TtfOutline {
    /// Replace the path by its border
    ///
    /// Pending emboldening widens the stroke instead of offsetting the path
    /// first: the outer edge lands where an emboldened outline would put it,
    /// the inner edge moves inward by the same amount.
    fn stroke(&mut self, stroker: &mut PathStroker, radius: F26Dot6) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let stroke = Stroke {
            width: 2.0 * radius.to_f32().abs() + self.embolden,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        if let Some(border) = stroker.stroke(path, &stroke, 1.0) {
            self.path = Some(border);
            self.embolden = 0.0;
        }
    }

    /// Scan-convert the path into a coverage bitmap
    fn render(self) -> std::result::Result<BitmapGlyph, GlyphError> {
        let empty = BitmapGlyph {
            advance: self.advance,
            ..BitmapGlyph::default()
        };
        let Some(path) = self.path else {
            return Ok(empty);
        };

        let grow = self.embolden / 2.0;
        let bounds = path.bounds();
        let left = (bounds.left() - grow).floor() as i32;
        let top = (bounds.top() - grow).floor() as i32;
        let right = (bounds.right() + grow).ceil() as i32;
        let bottom = (bounds.bottom() + grow).ceil() as i32;
        let (width, height) = (right - left, bottom - top);
        if width <= 0 || height <= 0 {
            return Ok(empty);
        }

        let mut pixmap = Pixmap::new(width as u32, height as u32)
            .ok_or_else(|| GlyphError::Rasterization(format!("cannot allocate {width}x{height} pixmap")))?;

        let mut paint = Paint::default();
        paint.set_color(tiny_skia::Color::WHITE);
        paint.anti_alias = true;
        let transform = Transform::from_translate(-left as f32, -top as f32);

        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        if self.embolden > 0.0 {
            let stroke = Stroke {
                width: self.embolden,
                line_join: LineJoin::Round,
                line_cap: LineCap::Round,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }

        let coverage = pixmap.pixels().iter().map(|p| p.alpha()).collect();
        let bitmap = Bitmap::gray(width as u32, height as u32, coverage)
            .ok_or_else(|| GlyphError::Rasterization("coverage buffer size mismatch".into()))?;

        Ok(BitmapGlyph {
            bitmap,
            left,
            top: -top,
            advance: self.advance,
        })
    }
}

/// Face-level values read once at load time
#[derive(Debug, Clone, Copy)]
struct FaceMetrics {
    units_per_em: u16,
    ascender: i32,
    descender: i32,
    line_height: i32,
    underline: DecorationMetrics,
}

/// [`FontBackend`] over an in-memory TrueType/OpenType font
///
/// Fields drop in declaration order: the stroker is released before the
/// font data it works on.
pub struct TtfBackend {
    stroker: PathStroker,
    data: Vec<u8>,
    face_index: u32,
    family: Option<String>,
    scalable: bool,
    has_kerning: bool,
    fixed_sizes: Vec<u32>,
    face_metrics: FaceMetrics,
    metrics: SizeMetrics,
}

impl TtfBackend {
    /// Parse font data and prepare the backend
    ///
    /// Fails if the data does not hold a font face or the face has no
    /// Unicode character map.
    pub fn open(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(FontError::EmptyData);
        }

        let face_index = 0;
        let (family, scalable, has_kerning, fixed_sizes, face_metrics) = {
            let face = Face::parse(&data, face_index)?;

            let has_unicode = face
                .tables()
                .cmap
                .map(|cmap| cmap.subtables.into_iter().any(|subtable| subtable.is_unicode()))
                .unwrap_or(false);
            if !has_unicode {
                return Err(FontError::NoUnicodeCharmap);
            }

            let tables = face.tables();
            let scalable = tables.glyf.is_some() || tables.cff.is_some() || tables.cff2.is_some();
            let fixed_sizes = if scalable { Vec::new() } else { strike_sizes(&face) };
            let underline = face
                .underline_metrics()
                // `post` stores the top of the stem, keep its center
                .map(|line| DecorationMetrics {
                    position: i32::from(line.position) - i32::from(line.thickness) / 2,
                    thickness: i32::from(line.thickness),
                })
                .unwrap_or_default();
            let face_metrics = FaceMetrics {
                units_per_em: face.units_per_em(),
                ascender: i32::from(face.ascender()),
                descender: i32::from(face.descender()),
                line_height: i32::from(face.ascender()) - i32::from(face.descender())
                    + i32::from(face.line_gap()),
                underline,
            };

            (
                family_name(&face),
                scalable,
                face.tables().kern.is_some(),
                fixed_sizes,
                face_metrics,
            )
        };

        Ok(Self {
            stroker: PathStroker::new(),
            data,
            face_index,
            family,
            scalable,
            has_kerning,
            fixed_sizes,
            face_metrics,
            metrics: SizeMetrics::default(),
        })
    }

    /// Raw font data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Re-parse the face; cheap, ttf-parser reads tables lazily
    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.face_index).ok()
    }

    /// Font units to 26.6 at the current size
    fn scale(&self, units: i32) -> F26Dot6 {
        F26Dot6::from_bits(fixed::mul_fix(units, self.metrics.y_scale))
    }

    fn advance_of(&self, face: &Face<'_>, glyph: GlyphId) -> Option<F26Dot6> {
        face.glyph_hor_advance(glyph)
            .map(|units| self.scale(i32::from(units)).pix_round())
    }

    /// Embedded bitmap for a glyph at the current size, if there is one
    fn load_bitmap(&self, face: &Face<'_>, glyph: GlyphId) -> Option<BitmapGlyph> {
        let ppem = u16::try_from(self.metrics.y_ppem).ok()?;
        let image = face.glyph_raster_image(glyph, ppem)?;
        if self.scalable && image.pixels_per_em != ppem {
            return None;
        }
        let bitmap = decode_raster(&image)?;
        let advance = self
            .advance_of(face, glyph)
            .unwrap_or(F26Dot6::from_i32(i32::from(image.width)));

        Some(BitmapGlyph {
            bitmap,
            left: i32::from(image.x),
            top: i32::from(image.y) + i32::from(image.height),
            advance,
        })
    }

    fn load_outline(&self, face: &Face<'_>, glyph: GlyphId) -> TtfOutline {
        let scale = self.metrics.y_ppem as f32 / f32::from(self.face_metrics.units_per_em);
        let mut builder = PathBuilder::new(scale);
        let path = face.outline_glyph(glyph, &mut builder).and_then(|_| builder.finish());

        TtfOutline {
            path,
            advance: self.advance_of(face, glyph).unwrap_or_default(),
            embolden: 0.0,
        }
    }
}

impl FontBackend for TtfBackend {
    type Outline = TtfOutline;

    fn family_name(&self) -> Option<String> {
        self.family.clone()
    }

    fn char_index(&self, code_point: u32) -> u32 {
        let Some(c) = char::from_u32(code_point) else {
            return 0;
        };
        self.face()
            .and_then(|face| face.glyph_index(c))
            .map_or(0, |glyph| u32::from(glyph.0))
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

    fn set_pixel_size(&mut self, size: u32) -> std::result::Result<(), SizeError> {
        if size == 0 || size > u32::from(u16::MAX) {
            return Err(SizeError::Invalid(size));
        }
        if !self.scalable && !self.fixed_sizes.contains(&size) {
            return Err(SizeError::Unsupported {
                requested: size,
                available: self.fixed_sizes.clone(),
            });
        }

        let units_per_em = i32::from(self.face_metrics.units_per_em);
        let y_scale = fixed::div_fix((size as i32) << 6, units_per_em);
        let scaled = |units: i32| F26Dot6::from_bits(fixed::mul_fix(units, y_scale));

        self.metrics = SizeMetrics {
            x_ppem: size,
            y_ppem: size,
            y_scale,
            height: scaled(self.face_metrics.line_height).pix_round(),
            ascender: scaled(self.face_metrics.ascender).pix_ceil(),
            descender: scaled(self.face_metrics.descender).pix_floor(),
        };
        Ok(())
    }

    fn underline_metrics(&self) -> DecorationMetrics {
        self.face_metrics.underline
    }

    fn kerning(&self, left: u32, right: u32) -> Vector2<i32> {
        if !self.has_kerning {
            return Vector2::default();
        }
        let (Ok(left), Ok(right)) = (u16::try_from(left), u16::try_from(right)) else {
            return Vector2::default();
        };
        let units = self
            .face()
            .and_then(|face| face.tables().kern)
            .and_then(|kern| {
                kern.subtables
                    .into_iter()
                    .filter(|subtable| subtable.horizontal && !subtable.variable)
                    .find_map(|subtable| subtable.glyphs_kerning(GlyphId(left), GlyphId(right)))
            })
            .map_or(0, i32::from);

        let x = if self.scalable { self.scale(units).to_bits() } else { units };
        Vector2::new(x, 0)
    }

    fn load_glyph(
        &mut self,
        code_point: u32,
        flags: LoadFlags,
    ) -> std::result::Result<LoadedGlyph<TtfOutline>, GlyphError> {
        if self.metrics.y_ppem == 0 {
            return Err(GlyphError::SizeNotSet);
        }
        let face = self
            .face()
            .ok_or_else(|| GlyphError::Rasterization("font data no longer parses".into()))?;
        let glyph = char::from_u32(code_point)
            .and_then(|c| face.glyph_index(c))
            .ok_or(GlyphError::Unmapped(code_point))?;

        let bitmap = if flags.no_bitmap && self.scalable {
            None
        } else {
            self.load_bitmap(&face, glyph)
        };

        let image = match bitmap {
            Some(bitmap) => GlyphImage::Bitmap(bitmap),
            None if self.scalable => GlyphImage::Outline(self.load_outline(&face, glyph)),
            None => return Err(GlyphError::NoImage(u32::from(glyph.0))),
        };

        // Outlines are not hinted, so there are no side bearing changes
        Ok(LoadedGlyph {
            image,
            lsb_delta: 0,
            rsb_delta: 0,
        })
    }

    fn embolden_outline(&mut self, outline: &mut TtfOutline, strength: F26Dot6) {
        outline.embolden += strength.to_f32();
    }

    fn stroke_outline(&mut self, outline: &mut TtfOutline, radius: F26Dot6) {
        outline.stroke(&mut self.stroker, radius);
    }

    fn render_outline(&mut self, outline: TtfOutline) -> std::result::Result<BitmapGlyph, GlyphError> {
        outline.render()
    }
}

impl std::fmt::Debug for TtfBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfBackend")
            .field("family", &self.family)
            .field("len", &self.data.len())
            .field("scalable", &self.scalable)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

fn family_name(face: &Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY)
        .find_map(|name| name.to_string())
}

/// Collect the strike sizes of a bitmap-only face
///
/// ttf-parser picks the closest strike at or above the requested size (or
/// the largest one), so walking upward from 1 visits every strike.
fn strike_sizes(face: &Face<'_>) -> Vec<u32> {
    let Some(glyph) = (0..face.number_of_glyphs())
        .map(GlyphId)
        .find(|&glyph| face.glyph_raster_image(glyph, u16::MAX).is_some())
    else {
        return Vec::new();
    };

    let mut sizes = Vec::new();
    let mut request = 1u16;
    while let Some(image) = face.glyph_raster_image(glyph, request) {
        let ppem = u32::from(image.pixels_per_em);
        if !sizes.contains(&ppem) {
            sizes.push(ppem);
        }
        if image.pixels_per_em < request {
            break;
        }
        match image.pixels_per_em.checked_add(1) {
            Some(next) => request = next,
            None => break,
        }
    }
    sizes.sort_unstable();
    sizes
}

/// Convert an embedded bitmap into a coverage bitmap
///
/// Only monochrome and 8-bit gray strikes are supported; color strikes
/// (PNG, BGRA) are left to color-glyph renderers.
fn decode_raster(image: &RasterGlyphImage<'_>) -> Option<Bitmap> {
    let width = u32::from(image.width);
    let rows = u32::from(image.height);
    match image.format {
        RasterImageFormat::BitmapMono => {
            let pitch = (width as usize).div_ceil(8);
            Bitmap::mono(width, rows, pitch, image.data.to_vec())
        }
        RasterImageFormat::BitmapMonoPacked => {
            // Bits run across rows without padding; repack into whole bytes
            let pitch = (width as usize).div_ceil(8);
            let mut buffer = vec![0u8; pitch * rows as usize];
            for y in 0..rows as usize {
                for x in 0..width as usize {
                    let bit = y * width as usize + x;
                    let set = image.data.get(bit / 8).is_some_and(|byte| byte & (0x80 >> (bit % 8)) != 0);
                    if set {
                        buffer[y * pitch + x / 8] |= 0x80 >> (x % 8);
                    }
                }
            }
            Bitmap::mono(width, rows, pitch, buffer)
        }
        RasterImageFormat::BitmapGray8 => Bitmap::gray(width, rows, image.data.to_vec()),
        _ => None,
    }
}

/// Converts ttf-parser outlines to tiny-skia paths in pixel space
struct PathBuilder {
    builder: tiny_skia::PathBuilder,
    scale: f32,
}

impl PathBuilder {
    fn new(scale: f32) -> Self {
        Self {
            builder: tiny_skia::PathBuilder::new(),
            scale,
        }
    }

    fn x(&self, x: f32) -> f32 {
        x * self.scale
    }

    fn y(&self, y: f32) -> f32 {
        -y * self.scale // Flip Y axis
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.x(x), self.y(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.x(x), self.y(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(self.x(x1), self.y(y1), self.x(x), self.y(y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.x(x1),
            self.y(y1),
            self.x(x2),
            self.y(y2),
            self.x(x),
            self.y(y),
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
