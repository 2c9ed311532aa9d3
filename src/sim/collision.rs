//! Collision detection and response for straight geometry
//!
//! Boundary handling is a structural clamp on the integer position. Walls use a
//! one-tick look-ahead: the segment the particle is about to travel is tested
//! against each wall segment, and the heading is mirrored about the wall normal.

use glam::{DVec2, IVec2};

use crate::normalize_degrees;

/// Determinants smaller than this are treated as parallel lines
const PARALLEL_EPSILON: f64 = 1e-12;

/// Fixed world rectangle plus the collision margins applied at its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldBounds {
    pub width: i32,
    pub height: i32,
    /// Particle diameter
    pub diameter: i32,
    /// Distance a reflected particle is placed away from the edge
    pub buffer: i32,
}

impl WorldBounds {
    /// Whether a point lies in the closed rectangle [0, width] x [0, height]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..=self.width).contains(&x) && (0..=self.height).contains(&y)
    }

    /// Largest x a particle may occupy after boundary handling
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.width - self.diameter
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.height - self.diameter
    }
}

/// Parametric segment-segment intersection
///
/// Returns the `(t, u)` parameters along `p1->p2` and `q1->q2` when both lie in
/// [0, 1]. Parallel or degenerate segments never intersect.
pub fn segment_intersection(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> Option<(f64, f64)> {
    let r = p2 - p1;
    let s = q2 - q1;
    let det = r.perp_dot(s);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let qp = q1 - p1;
    let t = qp.perp_dot(s) / det;
    let u = qp.perp_dot(r) / det;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u))
    } else {
        None
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: DVec2, normal: DVec2) -> DVec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Unit normal of the segment `start->end` (zero for a degenerate segment)
#[inline]
pub fn segment_normal(start: DVec2, end: DVec2) -> DVec2 {
    (end - start).perp().normalize_or_zero()
}

/// Reflect off the world edges, clamping the position back inside
///
/// Returns the new heading. The x axis mirrors with `180 - angle`, the y axis
/// with `-angle`. A particle is considered touching the far edge once its
/// diameter reaches it, so positions stay within [0, width - diameter].
pub fn reflect_off_bounds(pos: &mut IVec2, angle: f64, bounds: &WorldBounds) -> f64 {
    let mut angle = angle;

    if pos.x <= 0 {
        angle = 180.0 - angle;
        pos.x = bounds.buffer;
    } else if pos.x.saturating_add(bounds.diameter) >= bounds.width {
        angle = 180.0 - angle;
        pos.x = bounds.width - bounds.diameter - bounds.buffer;
    }

    if pos.y.saturating_add(bounds.diameter) >= bounds.height {
        angle = -angle;
        pos.y = bounds.height - bounds.diameter - bounds.buffer;
    } else if pos.y <= 0 {
        angle = -angle;
        pos.y = bounds.buffer;
    }

    normalize_degrees(angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> WorldBounds {
        WorldBounds {
            width: 1280,
            height: 720,
            diameter: 5,
            buffer: 1,
        }
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let hit = segment_intersection(
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
            DVec2::new(10.0, 0.0),
        );
        let (t, u) = hit.expect("diagonals cross");
        assert!((t - 0.5).abs() < 1e-12);
        assert!((u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_segments_never_intersect() {
        let hit = segment_intersection(
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(5.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_short_path_misses() {
        // Path stops before reaching the wall
        let hit = segment_intersection(
            DVec2::new(0.0, 5.0),
            DVec2::new(4.0, 5.0),
            DVec2::new(5.0, 0.0),
            DVec2::new(5.0, 10.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_zero_length_path_misses() {
        let p = DVec2::new(3.0, 3.0);
        assert!(segment_intersection(p, p, DVec2::ZERO, DVec2::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving right, hits vertical wall
        let reflected = reflect_velocity(DVec2::new(100.0, 0.0), DVec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 1e-9);
        assert!(reflected.y.abs() < 1e-9);
    }

    #[test]
    fn test_segment_normal_is_unit() {
        let n = segment_normal(DVec2::new(0.0, 0.0), DVec2::new(3.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert!(n.dot(DVec2::new(3.0, 4.0)).abs() < 1e-12);
        assert_eq!(segment_normal(DVec2::ONE, DVec2::ONE), DVec2::ZERO);
    }

    #[test]
    fn test_left_edge_reflects() {
        let mut pos = IVec2::new(-3, 100);
        let angle = reflect_off_bounds(&mut pos, 170.0, &bounds());
        assert_eq!(pos, IVec2::new(1, 100));
        assert!((angle - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_right_edge_reflects() {
        let mut pos = IVec2::new(1276, 100);
        let angle = reflect_off_bounds(&mut pos, 20.0, &bounds());
        assert_eq!(pos.x, 1280 - 5 - 1);
        assert!((angle - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_and_bottom_reflect() {
        let mut pos = IVec2::new(50, 716);
        let angle = reflect_off_bounds(&mut pos, 90.0, &bounds());
        assert_eq!(pos.y, 714);
        assert!((angle - 270.0).abs() < 1e-9);

        let mut pos = IVec2::new(50, 0);
        let angle = reflect_off_bounds(&mut pos, 270.0, &bounds());
        assert_eq!(pos.y, 1);
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_corner_reflects_both_axes() {
        let mut pos = IVec2::new(0, 0);
        let angle = reflect_off_bounds(&mut pos, 225.0, &bounds());
        assert_eq!(pos, IVec2::new(1, 1));
        assert!((angle - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_position_clamped_without_overflow() {
        let mut pos = IVec2::new(i32::MAX, i32::MAX);
        let angle = reflect_off_bounds(&mut pos, 45.0, &bounds());
        assert_eq!(pos, IVec2::new(1274, 714));
        assert!((angle - 225.0).abs() < 1e-9);
    }

    #[test]
    fn test_interior_untouched() {
        let mut pos = IVec2::new(640, 360);
        let angle = reflect_off_bounds(&mut pos, 33.0, &bounds());
        assert_eq!(pos, IVec2::new(640, 360));
        assert_eq!(angle, 33.0);
    }
}
