//! Particle Sim - real-time 2D particle motion simulator
//!
//! Core modules:
//! - `sim`: Particles, walls, collision geometry, the shared world store and one tick
//! - `scheduler`: Fixed-rate background loop with parallel fan-out
//! - `renderer`: CPU rasteriser producing a pixel frame from a snapshot
//! - `telemetry`: Achieved frame rate measurement
//! - `settings`: Data-driven world and loop configuration

pub mod error;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod telemetry;

pub use error::{Result, SimError};
pub use scheduler::{FrameListener, Simulation, TickStats};
pub use settings::Settings;

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Default world width (logical pixels)
    pub const WORLD_WIDTH: i32 = 1280;
    /// Default world height (logical pixels)
    pub const WORLD_HEIGHT: i32 = 720;

    /// Particle diameter used for boundary margins and drawing
    pub const PARTICLE_DIAMETER: i32 = 5;
    /// Gap kept between a reflected particle and the world edge
    pub const BOUNDARY_BUFFER: i32 = 1;

    /// Target tick rate
    pub const TARGET_FPS: u32 = 60;
    /// Fixed simulation timestep (seconds)
    pub const TIME_STEP: f64 = 1.0 / 60.0;

    /// Frame rate is recomputed at most this often
    pub const FPS_WINDOW_MS: u64 = 500;

    /// Explorer grid size in cells
    pub const EXPLORER_GRID_WIDTH: i32 = 33;
    pub const EXPLORER_GRID_HEIGHT: i32 = 19;

    /// Random batch limits
    pub const RANDOM_BATCH_MAX: usize = 500;
    pub const RANDOM_SPEED_MIN: f64 = 50.0;
    pub const RANDOM_SPEED_MID: f64 = 275.0;
    pub const RANDOM_SPEED_MAX: f64 = 500.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit direction vector for an angle in degrees
#[inline]
pub fn direction_from_degrees(angle: f64) -> DVec2 {
    let radians = angle.to_radians();
    DVec2::new(radians.cos(), radians.sin())
}

/// Angle in degrees of a direction vector, normalized to [0, 360)
#[inline]
pub fn degrees_from_direction(dir: DVec2) -> f64 {
    normalize_degrees(dir.y.atan2(dir.x).to_degrees())
}
