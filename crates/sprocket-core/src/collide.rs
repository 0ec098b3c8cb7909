//! Axis-aligned bounding boxes and the overlap test entities use for
//! collision queries.
//!
//! An [`Aabb`] is expressed in an entity-local frame: its edges are offsets
//! from the owning entity's position, not world coordinates. The world-space
//! box is derived on demand via
//! [`Entity::positioned_bounding_box`](crate::entity::Entity::positioned_bounding_box).

use crate::math::Vec2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Aabb
// ---------------------------------------------------------------------------

/// An axis-aligned bounding box described by its four edges.
///
/// `left <= right` and `bottom <= top` is expected but deliberately not
/// enforced; a box with crossed edges produces unreliable intersection
/// results. Callers supply self-consistent edges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Aabb {
    /// The degenerate zero box, used as the default collision shape for
    /// entities that never override
    /// [`EntityBehavior::bounding_box`](crate::entity::EntityBehavior::bounding_box).
    pub const ZERO: Aabb = Aabb {
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
        top: 0.0,
    };

    /// Construct a box from its edges.
    #[inline]
    pub const fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// The `(left, bottom)` corner.
    #[inline]
    pub fn bottom_left(self) -> Vec2 {
        Vec2::new(self.left, self.bottom)
    }

    /// The `(right, top)` corner.
    #[inline]
    pub fn top_right(self) -> Vec2 {
        Vec2::new(self.right, self.top)
    }

    /// This box shifted by `offset` on both axes.
    #[inline]
    pub fn translated(self, offset: Vec2) -> Aabb {
        Aabb::new(
            self.left + offset.x,
            self.bottom + offset.y,
            self.right + offset.x,
            self.top + offset.y,
        )
    }

    /// Closed-interval overlap test: true iff the boxes overlap on both
    /// axes. Boxes that merely touch at an edge or corner count as
    /// intersecting.
    ///
    /// Pure and infallible. Malformed boxes (`left > right` or
    /// `bottom > top`) are not rejected; their results are unreliable.
    #[inline]
    pub fn intersects(self, other: Aabb) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.top < other.bottom
            || self.bottom > other.top)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes_intersect() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 15.0, 15.0);
        assert!(a.intersects(b));
        assert!(b.intersects(a));
    }

    #[test]
    fn edge_touch_counts_as_intersection() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        // b starts exactly where a ends on the x axis.
        let b = Aabb::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersects(b));
        assert!(b.intersects(a));
    }

    #[test]
    fn corner_touch_counts_as_intersection() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 10.0, 20.0, 20.0);
        assert!(a.intersects(b));
    }

    #[test]
    fn horizontal_gap_means_no_intersection() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.001, 0.0, 20.0, 10.0);
        assert!(!a.intersects(b));
        assert!(!b.intersects(a));
    }

    #[test]
    fn vertical_gap_means_no_intersection() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(0.0, 10.5, 10.0, 20.0);
        assert!(!a.intersects(b));
    }

    #[test]
    fn containment_intersects() {
        let outer = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let inner = Aabb::new(40.0, 40.0, 60.0, 60.0);
        assert!(outer.intersects(inner));
        assert!(inner.intersects(outer));
    }

    #[test]
    fn zero_box_on_an_edge_intersects() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let point = Aabb::new(10.0, 5.0, 10.0, 5.0);
        assert!(a.intersects(point));
    }

    #[test]
    fn corner_accessors() {
        let a = Aabb::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a.bottom_left(), Vec2::new(1.0, 2.0));
        assert_eq!(a.top_right(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn translated_shifts_all_edges() {
        let a = Aabb::new(0.0, 0.0, 25.0, 25.0);
        let moved = a.translated(Vec2::new(100.0, -50.0));
        assert_eq!(moved, Aabb::new(100.0, -50.0, 125.0, -25.0));
        // Original is untouched.
        assert_eq!(a, Aabb::new(0.0, 0.0, 25.0, 25.0));
    }

    #[test]
    fn default_is_the_zero_box() {
        assert_eq!(Aabb::default(), Aabb::ZERO);
    }
}
