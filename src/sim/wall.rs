//! Immutable line segment obstacles

use glam::{DVec2, IVec2};

use super::collision::segment_normal;

/// A wall segment between two integer endpoints
///
/// Endpoints are private so a wall cannot change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wall {
    start: IVec2,
    end: IVec2,
}

impl Wall {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            start: IVec2::new(x1, y1),
            end: IVec2::new(x2, y2),
        }
    }

    #[inline]
    pub fn start(&self) -> IVec2 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> IVec2 {
        self.end
    }

    /// Endpoints as floating point vectors for intersection tests
    #[inline]
    pub fn segment(&self) -> (DVec2, DVec2) {
        (self.start.as_dvec2(), self.end.as_dvec2())
    }

    /// Unit normal (zero for a point-like wall)
    pub fn normal(&self) -> DVec2 {
        let (start, end) = self.segment();
        segment_normal(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_wall_normal() {
        let wall = Wall::new(0, 0, 0, 720);
        let n = wall.normal();
        assert!((n.x.abs() - 1.0).abs() < 1e-12);
        assert!(n.y.abs() < 1e-12);
    }

    #[test]
    fn test_endpoints_preserved() {
        let wall = Wall::new(10, 20, 30, 40);
        assert_eq!(wall.start(), IVec2::new(10, 20));
        assert_eq!(wall.end(), IVec2::new(30, 40));
    }
}
