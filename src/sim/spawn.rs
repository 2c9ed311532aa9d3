//! Particle batch construction
//!
//! Batches interpolate one parameter (position, angle or speed) linearly across
//! `n` particles. The first and last particle reproduce the endpoints exactly.
//! Random batches mirror the interactive "add random" controls and draw their
//! parameters from a seedable PCG stream.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::WorldBounds;
use super::particle::Particle;
use super::wall::Wall;
use crate::consts::*;
use crate::error::{Result, SimError};

/// A request to inject several particles at once
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    /// Positions spread evenly from `start` to `end`
    BetweenPoints {
        n: usize,
        start: IVec2,
        end: IVec2,
        angle: f64,
        speed: f64,
    },
    /// Headings spread evenly from `start_angle` to `end_angle`
    VaryingAngles {
        n: usize,
        point: IVec2,
        start_angle: f64,
        end_angle: f64,
        speed: f64,
    },
    /// Speeds spread evenly from `start_speed` to `end_speed`
    VaryingSpeeds {
        n: usize,
        point: IVec2,
        angle: f64,
        start_speed: f64,
        end_speed: f64,
    },
}

/// Value at index `i` of `n` evenly spaced samples from `start` to `end`
fn lerp_at(start: f64, end: f64, i: usize, n: usize) -> f64 {
    if i + 1 == n {
        end
    } else {
        start + (end - start) * (i as f64 / (n - 1) as f64)
    }
}

impl Batch {
    /// Check coordinates and motion parameters before anything is appended
    pub fn validate(&self, bounds: &WorldBounds) -> Result<()> {
        match *self {
            Batch::BetweenPoints {
                start,
                end,
                angle,
                speed,
                ..
            } => {
                validate_point(bounds, start)?;
                validate_point(bounds, end)?;
                validate_angle(angle)?;
                validate_speed(speed)
            }
            Batch::VaryingAngles {
                point,
                start_angle,
                end_angle,
                speed,
                ..
            } => {
                validate_point(bounds, point)?;
                validate_angle(start_angle)?;
                validate_angle(end_angle)?;
                validate_speed(speed)
            }
            Batch::VaryingSpeeds {
                point,
                angle,
                start_speed,
                end_speed,
                ..
            } => {
                validate_point(bounds, point)?;
                validate_angle(angle)?;
                validate_speed(start_speed)?;
                validate_speed(end_speed)
            }
        }
    }

    /// Build the particles for this batch
    ///
    /// Between-points batches with `n == 0` are empty; the varying batches
    /// always produce at least one particle at their start value.
    pub fn particles(&self) -> Vec<Particle> {
        match *self {
            Batch::BetweenPoints {
                n,
                start,
                end,
                angle,
                speed,
            } => {
                if n == 0 {
                    return Vec::new();
                }
                if n == 1 {
                    return vec![Particle::new(start.x, start.y, angle, speed)];
                }
                let delta = (end - start).as_dvec2();
                (0..n)
                    .map(|i| {
                        let ratio = i as f64 / (n - 1) as f64;
                        // Truncation toward zero, like an integer cast of the offset
                        let x = start.x + (delta.x * ratio) as i32;
                        let y = start.y + (delta.y * ratio) as i32;
                        Particle::new(x, y, angle, speed)
                    })
                    .collect()
            }
            Batch::VaryingAngles {
                n,
                point,
                start_angle,
                end_angle,
                speed,
            } => {
                let n = n.max(1);
                (0..n)
                    .map(|i| {
                        let angle = lerp_at(start_angle, end_angle, i, n);
                        Particle::new(point.x, point.y, angle, speed)
                    })
                    .collect()
            }
            Batch::VaryingSpeeds {
                n,
                point,
                angle,
                start_speed,
                end_speed,
            } => {
                let n = n.max(1);
                (0..n)
                    .map(|i| {
                        let speed = lerp_at(start_speed, end_speed, i, n);
                        Particle::new(point.x, point.y, angle, speed)
                    })
                    .collect()
            }
        }
    }
}

pub fn validate_point(bounds: &WorldBounds, point: IVec2) -> Result<()> {
    if bounds.contains(point.x, point.y) {
        Ok(())
    } else {
        Err(SimError::invalid(format!(
            "point ({}, {}) outside world: x must be between 0 and {}, y between 0 and {}",
            point.x, point.y, bounds.width, bounds.height
        )))
    }
}

fn validate_angle(angle: f64) -> Result<()> {
    if angle.is_finite() {
        Ok(())
    } else {
        Err(SimError::invalid(format!("angle must be finite, got {angle}")))
    }
}

fn validate_speed(speed: f64) -> Result<()> {
    if speed.is_finite() && speed >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(format!(
            "speed must be finite and >= 0, got {speed}"
        )))
    }
}

/// Source of randomly parameterised batches and walls
#[derive(Debug, Clone)]
pub struct RandomSpawner {
    rng: Pcg32,
}

impl RandomSpawner {
    /// Seeded for reproducible runs, or from OS entropy when `seed` is None
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        Self { rng }
    }

    fn point(&mut self, bounds: &WorldBounds) -> IVec2 {
        IVec2::new(
            self.rng.random_range(0..=bounds.width),
            self.rng.random_range(0..=bounds.height),
        )
    }

    fn count(&mut self) -> usize {
        self.rng.random_range(1..=RANDOM_BATCH_MAX)
    }

    fn angle(&mut self) -> f64 {
        self.rng.random_range(0.0..360.0)
    }

    pub fn between_points(&mut self, bounds: &WorldBounds) -> Batch {
        Batch::BetweenPoints {
            n: self.count(),
            start: self.point(bounds),
            end: self.point(bounds),
            angle: self.angle(),
            speed: self.rng.random_range(RANDOM_SPEED_MIN..RANDOM_SPEED_MAX),
        }
    }

    pub fn varying_angles(&mut self, bounds: &WorldBounds) -> Batch {
        Batch::VaryingAngles {
            n: self.count(),
            point: self.point(bounds),
            start_angle: self.angle(),
            end_angle: self.angle(),
            speed: self.rng.random_range(RANDOM_SPEED_MIN..RANDOM_SPEED_MAX),
        }
    }

    /// Start speed from the lower half of the range, end speed from the upper half
    pub fn varying_speeds(&mut self, bounds: &WorldBounds) -> Batch {
        Batch::VaryingSpeeds {
            n: self.count(),
            point: self.point(bounds),
            angle: self.angle(),
            start_speed: self.rng.random_range(RANDOM_SPEED_MIN..RANDOM_SPEED_MID),
            end_speed: self.rng.random_range(RANDOM_SPEED_MID..RANDOM_SPEED_MAX),
        }
    }

    pub fn wall(&mut self, bounds: &WorldBounds) -> Wall {
        let start = self.point(bounds);
        let end = self.point(bounds);
        Wall::new(start.x, start.y, end.x, end.y)
    }
}
