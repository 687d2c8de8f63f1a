//! Small geometry types shared by the atlas and glyph code

use std::ops::{Add, Mul};

/// 2D vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Vector2<T> {
    pub x: T,
    pub y: T,
}

impl<T> Vector2<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Add<Output = T>> Add for Vector2<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for Vector2<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle (left/top origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect<T> {
    pub left: T,
    pub top: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub const fn new(left: T, top: T, width: T, height: T) -> Self {
        Self { left, top, width, height }
    }
}

impl<T: Copy + Add<Output = T>> Rect<T> {
    /// Right edge (exclusive)
    pub fn right(&self) -> T {
        self.left + self.width
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> T {
        self.top + self.height
    }
}

impl Rect<i32> {
    /// Check whether two rectangles share any pixel
    pub fn intersects(&self, other: &Self) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    /// Check whether this rectangle lies inside a `width` x `height` area
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && i64::from(self.right()) <= i64::from(width)
            && i64::from(self.bottom()) <= i64::from(height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl Eq for Rect<i32> {}
