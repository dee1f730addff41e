#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A placed rectangle inside a region container.
///
/// Uses container-local coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in units.
    pub width: u16,
    /// Height in units.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Area in units.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Closed-interval conflict test with a spacing buffer.
    ///
    /// Two rectangles conflict when fewer than `buffer` free units separate
    /// them on both axes. With `buffer == 0` this is plain intersection.
    #[inline]
    pub fn conflicts_with(&self, other: &Rect, buffer: u16) -> bool {
        let buffer = u32::from(buffer);
        let (ax, ay) = (u32::from(self.x), u32::from(self.y));
        let (bx, by) = (u32::from(other.x), u32::from(other.y));
        let a_right = ax + u32::from(self.width);
        let a_bottom = ay + u32::from(self.height);
        let b_right = bx + u32::from(other.width);
        let b_bottom = by + u32::from(other.height);

        ax < b_right + buffer
            && bx < a_right + buffer
            && ay < b_bottom + buffer
            && by < a_bottom + buffer
    }

    /// Check that the rectangle lies fully inside `[0, width) x [0, height)`.
    #[inline]
    pub const fn fits_in(&self, container: Container) -> bool {
        self.x as u32 + self.width as u32 <= container.width as u32
            && self.y as u32 + self.height as u32 <= container.height as u32
    }
}

/// Fixed-size area a region packs its items into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Container {
    pub width: u16,
    pub height: u16,
}

impl Container {
    /// Create a new container.
    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Area in units.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The container as a rectangle anchored at the origin.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }
}

impl From<(u16, u16)> for Container {
    fn from((width, height): (u16, u16)) -> Self {
        Self::new(width, height)
    }
}
