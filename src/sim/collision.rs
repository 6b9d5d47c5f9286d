//! Trigger detection
//!
//! Everything in the lane game is either a box (enemies, gates, bases, the
//! player group) or a small circle (bullets, projectiles, units). Overlap is
//! all that matters; there is no collision response.

use glam::Vec2;

/// Axis-aligned box given by centre and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    /// Square box of side `size`
    pub fn square(center: Vec2, size: f32) -> Self {
        Self::new(center, Vec2::splat(size))
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    /// Closest point inside the box to `point`
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }
}

/// Circle vs box overlap
pub fn circle_aabb_overlap(center: Vec2, radius: f32, aabb: &Aabb) -> bool {
    center.distance_squared(aabb.closest_point(center)) < radius * radius
}

/// True if a point moving from `prev_y` to `y` crossed the horizontal line
/// `line_y` going downward this tick
pub fn crossed_downward(prev_y: f32, y: f32, line_y: f32) -> bool {
    prev_y >= line_y && y < line_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::square(Vec2::ZERO, 2.0);
        let b = Aabb::square(Vec2::new(1.5, 0.0), 2.0);
        let c = Aabb::square(Vec2::new(2.5, 0.0), 2.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Aabb::square(Vec2::ZERO, 2.0);
        let b = Aabb::square(Vec2::new(2.0, 0.0), 2.0);
        assert!(!a.overlaps(&b));
        assert!(a.contains(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_circle_box() {
        let aabb = Aabb::new(Vec2::ZERO, Vec2::new(2.0, 1.0));
        assert!(circle_aabb_overlap(Vec2::new(1.1, 0.0), 0.2, &aabb));
        assert!(!circle_aabb_overlap(Vec2::new(1.3, 0.0), 0.2, &aabb));
        // Corner: distance to (1, 0.5) is ~0.14
        assert!(circle_aabb_overlap(Vec2::new(1.1, 0.6), 0.15, &aabb));
        assert!(!circle_aabb_overlap(Vec2::new(1.2, 0.7), 0.15, &aabb));
    }

    #[test]
    fn test_crossed_downward() {
        assert!(crossed_downward(-5.9, -6.1, -6.0));
        assert!(!crossed_downward(-6.1, -6.2, -6.0));
    }
}
