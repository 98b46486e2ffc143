//! Axis-aligned rectangle geometry for platforms, hazards and pickups
//!
//! Screen-space convention: `x` grows right, `y` grows down, and `(x, y)` is
//! the top-left corner. For platforms the top edge (`y`) is the walkable surface.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Midpoint of the top edge
    pub fn top_center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y)
    }

    /// Closed-interval overlap test (touching edges count as overlap)
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.left()
            || self.left() > other.right()
            || self.bottom() < other.top()
            || self.top() > other.bottom())
    }

    /// Whether `x` lies within the horizontal span (inclusive)
    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }

    /// Open-interval horizontal overlap with `[left, right]`
    pub fn overlaps_x(&self, left: f32, right: f32) -> bool {
        right > self.left() && left < self.right()
    }

    /// Horizontal overlap span with another rect, if any
    pub fn x_overlap(&self, other: &Rect) -> Option<(f32, f32)> {
        let left = self.left().max(other.left());
        let right = self.right().min(other.right());
        (right > left).then_some((left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_center() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center(), Vec2::new(25.0, 40.0));
        assert_eq!(r.top_center(), Vec2::new(25.0, 20.0));
    }

    #[test]
    fn test_intersects_touching() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        let c = Rect::new(10.1, 0.0, 5.0, 5.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_x_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 10.0);
        let b = Rect::new(60.0, -200.0, 100.0, 10.0);
        assert_eq!(a.x_overlap(&b), Some((60.0, 100.0)));
        let c = Rect::new(100.0, 0.0, 10.0, 10.0);
        assert_eq!(a.x_overlap(&c), None);
    }
}
