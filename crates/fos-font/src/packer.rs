//! Shelf packing for glyph atlases
//!
//! Glyphs are placed side by side on horizontal shelves ("rows"). A glyph
//! reuses an existing row when its height is between 70% and 100% of the
//! row height; otherwise a new row 10% taller than the glyph is opened
//! below the last one. Rows are never removed or repacked.

use crate::geometry::{Rect, Vector2};

/// Smallest accepted glyph-height / row-height ratio
const MIN_ROW_RATIO: f32 = 0.7;

/// Largest accepted glyph-height / row-height ratio
const MAX_ROW_RATIO: f32 = 1.0;

/// A horizontal shelf within an atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// Top offset in the atlas
    pub top: u32,
    /// Shelf height
    pub height: u32,
    /// Next free horizontal offset
    pub width: u32,
}

impl Row {
    pub fn new(top: u32, height: u32) -> Self {
        Self { top, height, width: 0 }
    }
}

/// Shelf allocator over one atlas
///
/// The packer does not own pixels. When a new row does not fit it asks the
/// caller to grow the atlas through a callback that returns the new atlas
/// size, or `None` if the atlas cannot grow any further.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    rows: Vec<Row>,
    /// Vertical offset where the next row starts
    next_row: u32,
}

impl Default for ShelfPacker {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ShelfPacker {
    /// Create an empty packer whose first row starts at `first_row`
    pub fn new(first_row: u32) -> Self {
        Self {
            rows: Vec::new(),
            next_row: first_row,
        }
    }

    /// Rows created so far, in creation order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Vertical fill cursor
    pub fn next_row(&self) -> u32 {
        self.next_row
    }

    /// Height of a new row opened for a glyph of `height` pixels
    #[inline]
    pub fn row_height_for(height: u32) -> u32 {
        height + height / 10
    }

    /// Reserve a `width` x `height` rectangle
    ///
    /// `atlas` is the current atlas size; `grow` is called with the current
    /// size each time more room is needed. Returns `None` when the atlas
    /// cannot grow enough, leaving the packer unchanged.
    pub fn allocate<F>(
        &mut self,
        width: u32,
        height: u32,
        atlas: Vector2<u32>,
        mut grow: F,
    ) -> Option<Rect<i32>>
    where
        F: FnMut(Vector2<u32>) -> Option<Vector2<u32>>,
    {
        let index = match self.find_row(width, height, atlas.x) {
            Some(index) => index,
            None => {
                let row_height = Self::row_height_for(height);
                let mut atlas = atlas;
                while self.next_row + row_height >= atlas.y || width >= atlas.x {
                    let grown = grow(atlas)?;
                    if grown.x <= atlas.x && grown.y <= atlas.y {
                        return None;
                    }
                    atlas = grown;
                }

                self.rows.push(Row::new(self.next_row, row_height));
                self.next_row += row_height;
                self.rows.len() - 1
            }
        };

        let row = &mut self.rows[index];
        let rect = Rect::new(row.width as i32, row.top as i32, width as i32, height as i32);
        row.width += width;
        Some(rect)
    }

    /// Find the row that fits a glyph well
    ///
    /// Rows are scanned in creation order and the first acceptable one is
    /// taken, even if a later row would waste less height.
    fn find_row(&self, width: u32, height: u32, atlas_width: u32) -> Option<usize> {
        self.rows.iter().position(|row| {
            let ratio = height as f32 / row.height as f32;

            // Ignore rows that are either too small or too high
            if !(MIN_ROW_RATIO..=MAX_ROW_RATIO).contains(&ratio) {
                return false;
            }

            // Enough horizontal space left?
            width <= atlas_width.saturating_sub(row.width)
        })
    }
}
