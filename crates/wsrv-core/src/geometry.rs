#![forbid(unsafe_code)]

//! Geometric primitives.

/// An axis-aligned rectangle in screen coordinates.
///
/// Used as the region carried by invalidation and paint messages. An empty
/// rectangle (zero or negative width or height) is the "whole surface"
/// sentinel: a pending message with an empty region covers everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The empty rectangle, meaning "the entire surface" when used as a region.
    #[inline]
    pub const fn whole_surface() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has no area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if `other` lies entirely within this rectangle.
    ///
    /// An empty rectangle stands for the whole surface, so it is contained
    /// only by another empty rectangle, and it contains everything.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        if self.is_empty() {
            return true;
        }
        if other.is_empty() {
            return false;
        }
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_rect_nested() {
        let outer = Rect::new(0, 0, 100, 100);
        assert!(outer.contains_rect(&Rect::new(10, 10, 20, 20)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::new(90, 90, 20, 20)));
        assert!(!Rect::new(10, 10, 20, 20).contains_rect(&outer));
    }

    #[test]
    fn rect_contains_rect_negative_origin() {
        let outer = Rect::new(-50, -50, 100, 100);
        assert!(outer.contains_rect(&Rect::new(-10, -10, 5, 5)));
        assert!(!outer.contains_rect(&Rect::new(-60, 0, 5, 5)));
    }

    #[test]
    fn whole_surface_contained_only_by_whole_surface() {
        let r = Rect::new(3, 3, 1, 1);
        assert!(!r.contains_rect(&Rect::whole_surface()));
        assert!(!Rect::new(0, 0, 100, 100).contains_rect(&Rect::new(5, 5, 0, 10)));
        assert!(Rect::whole_surface().contains_rect(&Rect::whole_surface()));
        assert!(Rect::whole_surface().contains_rect(&r));
        assert!(Rect::new(7, 7, -1, 4).contains_rect(&Rect::new(-100, -100, 500, 500)));
    }

    #[test]
    fn rect_is_empty() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(5, 5, 0, 10).is_empty());
        assert!(Rect::new(5, 5, 10, -1).is_empty());
        assert!(!Rect::new(5, 5, 1, 1).is_empty());
    }

    #[test]
    fn rect_right_bottom_saturating() {
        let r = Rect::new(i32::MAX - 1, i32::MAX - 1, 10, 10);
        assert_eq!(r.right(), i32::MAX);
        assert_eq!(r.bottom(), i32::MAX);
    }
}
