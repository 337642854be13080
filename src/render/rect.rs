//! Rect: screen-space rectangles for placement and dirty tracking.

/// A rectangle defined by its top-left corner and size.
///
/// Coordinates are signed because a sprite centred near the window edge
/// extends past it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Top-left corner plus size.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole window.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// A `width` x `height` rectangle whose centre is `(cx, cy)`.
    ///
    /// Odd extents put the extra pixel right of and below the centre.
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn centered(cx: i32, cy: i32, width: u32, height: u32) -> Self {
        Self::new(cx - (width / 2) as i32, cy - (height / 2) as i32, width, height)
    }

    /// Zero-sized rectangle.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Whether the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge (exclusive).
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Whether the two share at least one pixel; touching edges do not.
    #[inline]
    pub const fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Clip `self` to `other`.
    #[allow(clippy::cast_sign_loss)]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Self::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}@({}, {})", self.width, self.height, self.x, self.y)
    }
}
