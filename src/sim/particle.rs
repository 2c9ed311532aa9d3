//! Point particles with sub-pixel motion
//!
//! Positions are integer pixels. Fractional travel is carried in a per-particle
//! accumulator and only applied once it reaches a whole unit on an axis, so
//! slow particles still move smoothly and no distance is lost to truncation.

use glam::{DVec2, IVec2};

use super::collision::{WorldBounds, reflect_off_bounds, reflect_velocity, segment_intersection};
use super::wall::Wall;
use crate::{degrees_from_direction, direction_from_degrees, normalize_degrees};

/// Extra look-ahead distance covering rounding between the tested path and
/// the position `advance` actually reaches
const LOOKAHEAD_SLOP: f64 = 1e-6;

/// A moving point particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pos: IVec2,
    /// Heading in degrees, always in [0, 360)
    angle: f64,
    /// Units per second; never changed by collisions
    speed: f64,
    /// Fractional travel not yet applied to `pos`
    carry: DVec2,
}

impl Particle {
    pub fn new(x: i32, y: i32, angle: f64, speed: f64) -> Self {
        Self {
            pos: IVec2::new(x, y),
            angle: normalize_degrees(angle),
            speed,
            carry: DVec2::ZERO,
        }
    }

    #[inline]
    pub fn position(&self) -> IVec2 {
        self.pos
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Pending sub-pixel travel
    #[inline]
    pub fn carry(&self) -> DVec2 {
        self.carry
    }

    /// Distance vector covered in `dt` seconds at the current heading
    #[inline]
    pub fn travel(&self, dt: f64) -> DVec2 {
        direction_from_degrees(self.angle) * self.speed * dt
    }

    /// Constant-velocity integration with sub-pixel accumulation
    pub fn advance(&mut self, dt: f64) {
        self.carry += self.travel(dt);

        if self.carry.x.abs() >= 1.0 {
            let step = self.carry.x.round();
            self.pos.x = self.pos.x.saturating_add(step as i32);
            self.carry.x -= step;
        }
        if self.carry.y.abs() >= 1.0 {
            let step = self.carry.y.round();
            self.pos.y = self.pos.y.saturating_add(step as i32);
            self.carry.y -= step;
        }
    }

    /// Exact position including the pending sub-pixel travel
    #[inline]
    pub fn true_position(&self) -> DVec2 {
        self.pos.as_dvec2() + self.carry
    }

    /// Boundary clamp followed by predictive wall reflection
    ///
    /// Only the heading and position change; speed is preserved. Walls are
    /// tested against the path the particle would travel over the next `dt`,
    /// starting from its exact sub-pixel position. A heading that already
    /// leads away from a wall, or a particle lying on the wall line, is left
    /// alone.
    pub fn resolve_collisions(&mut self, bounds: &WorldBounds, walls: &[Wall], dt: f64) {
        self.angle = reflect_off_bounds(&mut self.pos, self.angle, bounds);

        for wall in walls {
            let dir = direction_from_degrees(self.angle);
            let from = self.true_position();
            let to = from + dir * (self.speed * dt + LOOKAHEAD_SLOP);
            let (wall_start, wall_end) = wall.segment();

            if segment_intersection(from, to, wall_start, wall_end).is_none() {
                continue;
            }
            let normal = wall.normal();
            let approaching = (from - wall_start).dot(normal) * dir.dot(normal) < 0.0;
            if approaching {
                self.angle = degrees_from_direction(reflect_velocity(dir, normal));
            }
        }

        self.angle = normalize_degrees(self.angle);
    }

    /// One full per-tick update
    pub fn step(&mut self, dt: f64, bounds: &WorldBounds, walls: &[Wall]) {
        self.advance(dt);
        self.resolve_collisions(bounds, walls, dt);
    }
}
