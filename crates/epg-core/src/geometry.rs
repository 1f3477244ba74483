#![forbid(unsafe_code)]

//! Pixel-space geometry primitives.
//!
//! Grid space has its origin at the top-left of the full content (channel
//! column and header included). A [`Translation`] moves content relative to
//! the viewport and is always `<= 0` on both axes once clamped; the
//! corresponding positive content offset is [`Translation::offset`].

/// A point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Origin.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Component-wise difference `self - other`.
    #[inline]
    pub fn delta_from(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// A width/height pair in pixels.
///
/// Used both for the viewport and for the content extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

/// Size of the visible container.
pub type ViewportSize = Size;

/// Size of the full scrollable content.
pub type ContentExtent = Size;

impl Size {
    /// Zero size.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Copy with negative and NaN components replaced by zero.
    #[inline]
    pub fn sanitized(&self) -> Size {
        let fix = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Size::new(fix(self.width), fix(self.height))
    }

    /// Whether either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// An axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the open interval `(x, right)` contains `px` and the rectangle
    /// covers `py` vertically.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x > self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether `[x, right)` overlaps the horizontal band `[left, left + width)`.
    #[inline]
    pub fn intersects_band(&self, left: f64, width: f64) -> bool {
        self.right() > left && self.x < left + width
    }
}

/// Content translation relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Translation {
    /// Horizontal translation (`<= 0` once clamped).
    pub x: f64,
    /// Vertical translation (`<= 0` once clamped).
    pub y: f64,
}

impl Translation {
    /// No translation.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a translation.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translation that scrolls content by the positive `offset`.
    #[inline]
    pub fn from_offset(offset: Point) -> Self {
        Self::new(-offset.x, -offset.y)
    }

    /// Positive content offset (`-translation`).
    #[inline]
    pub fn offset(&self) -> Point {
        Point::new(-self.x + 0.0, -self.y + 0.0)
    }

    /// `self + delta`.
    #[inline]
    pub fn shifted(&self, delta: Point) -> Translation {
        Translation::new(self.x + delta.x, self.y + delta.y)
    }
}

/// Per-axis clamp range for a [`Translation`]: `[min, 0]`.
///
/// # Invariants
///
/// `min_x <= 0` and `min_y <= 0`. Content smaller than the viewport yields a
/// zero-length range, pinning that axis at 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollBounds {
    min_x: f64,
    min_y: f64,
}

impl ScrollBounds {
    /// Bounds for `extent` shown through `viewport`.
    pub fn new(extent: ContentExtent, viewport: ViewportSize) -> Self {
        let floor = |v: f64| if v.is_finite() { v.min(0.0) } else { 0.0 };
        Self {
            min_x: floor(viewport.width - extent.width),
            min_y: floor(viewport.height - extent.height),
        }
    }

    /// Lowest horizontal translation.
    #[inline]
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Lowest vertical translation.
    #[inline]
    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Clamp `t` into the bounds. NaN components clamp to 0.
    pub fn clamp(&self, t: Translation) -> Translation {
        let axis = |v: f64, min: f64| if v.is_nan() { 0.0 } else { v.clamp(min, 0.0) };
        Translation::new(axis(t.x, self.min_x), axis(t.y, self.min_y))
    }

    /// Whether `t` already lies inside the bounds.
    pub fn contains(&self, t: Translation) -> bool {
        t.x >= self.min_x && t.x <= 0.0 && t.y >= self.min_y && t.y <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_extent_minus_viewport() {
        let b = ScrollBounds::new(Size::new(6100.0, 6060.0), Size::new(1000.0, 600.0));
        assert_eq!(b.min_x(), -5100.0);
        assert_eq!(b.min_y(), -5460.0);
    }

    #[test]
    fn small_content_pins_axis_at_zero() {
        let b = ScrollBounds::new(Size::new(500.0, 100.0), Size::new(1000.0, 600.0));
        let t = b.clamp(Translation::new(-300.0, 50.0));
        assert_eq!(t, Translation::ZERO);
    }

    #[test]
    fn clamp_handles_nan() {
        let b = ScrollBounds::new(Size::new(2000.0, 2000.0), Size::new(100.0, 100.0));
        let t = b.clamp(Translation::new(f64::NAN, -50.0));
        assert_eq!(t, Translation::new(0.0, -50.0));
        assert!(b.contains(t));
    }

    #[test]
    fn offset_is_negated_translation() {
        let t = Translation::new(-120.0, -30.0);
        assert_eq!(t.offset(), Point::new(120.0, 30.0));
        assert_eq!(Translation::from_offset(t.offset()), t);
        assert_eq!(Translation::ZERO.offset(), Point::ZERO);
    }

    #[test]
    fn rect_contains_is_open_horizontally() {
        let r = Rect::new(100.0, 60.0, 50.0, 60.0);
        assert!(r.contains(Point::new(120.0, 60.0)));
        assert!(!r.contains(Point::new(100.0, 70.0)));
        assert!(!r.contains(Point::new(150.0, 70.0)));
        assert!(!r.contains(Point::new(120.0, 120.0)));
    }

    #[test]
    fn band_intersection_edges() {
        let r = Rect::new(500.0, 0.0, 100.0, 60.0);
        assert!(r.intersects_band(450.0, 100.0));
        assert!(!r.intersects_band(600.0, 100.0));
        assert!(!r.intersects_band(400.0, 100.0));
    }

    #[test]
    fn sanitized_size_drops_negative_and_nan() {
        assert_eq!(Size::new(-1.0, f64::NAN).sanitized(), Size::ZERO);
        assert!(Size::new(0.0, 10.0).is_empty());
    }
}
