//! fOS Font - Glyph Cache and Atlas Packing
//!
//! This crate turns font glyphs into ready-to-draw bitmaps packed in
//! texture atlases:
//! - Font loading from files, memory or custom streams (ttf-parser)
//! - Glyph rasterization with bold and outline variants (tiny-skia)
//! - One growable atlas page per character size, packed in shelves
//! - Kerning, line spacing and underline metrics

pub mod backend;
pub mod bitmap;
pub mod config;
pub mod fixed;
pub mod font;
pub mod geometry;
pub mod glyph;
pub mod key;
pub mod packer;
pub mod page;
pub mod rasterizer;
pub mod stream;
pub mod texture;

pub use backend::{FontBackend, GlyphError, SizeError, TtfBackend};
pub use bitmap::{Bitmap, PixelMode};
pub use config::FontConfig;
pub use font::{Font, FontInfo};
pub use geometry::{Rect, Vector2};
pub use glyph::Glyph;
pub use key::GlyphKey;
pub use packer::{Row, ShelfPacker};
pub use page::Page;
pub use rasterizer::{RasterizedGlyph, Rasterizer};
pub use stream::{FileInputStream, InputStream, MemoryInputStream};
pub use texture::{ImageTexture, Texture};

/// Font loading error types
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to seek font stream to its beginning")]
    StreamSeek,

    #[error("failed to read font stream at offset {offset}")]
    StreamRead { offset: u64 },

    #[error("font data is empty")]
    EmptyData,

    #[error("failed to parse font: {0}")]
    FaceParsing(#[from] ttf_parser::FaceParsingError),

    #[error("font has no Unicode character map")]
    NoUnicodeCharmap,
}

pub type Result<T> = std::result::Result<T, FontError>;
