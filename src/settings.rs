//! World and loop settings
//!
//! Loaded from JSON; any missing field falls back to its default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};
use crate::sim::WorldBounds;

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// World width in logical pixels
    pub width: i32,
    /// World height in logical pixels
    pub height: i32,
    /// Particle diameter (collision margin and drawn size)
    pub particle_diameter: i32,
    /// Gap left between a reflected particle and the edge
    pub boundary_buffer: i32,

    // === Loop ===
    /// Ticks per second the loop aims for
    pub target_fps: u32,
    /// Fixed physics timestep in seconds
    pub time_step: f64,
    /// Worker threads for the per-particle fan-out (None = physical cores)
    pub worker_threads: Option<usize>,

    // === Telemetry ===
    /// Minimum window over which the frame rate is recomputed
    pub fps_window_ms: u64,

    // === Random injection ===
    /// Seed for random batches (None = OS entropy)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            particle_diameter: PARTICLE_DIAMETER,
            boundary_buffer: BOUNDARY_BUFFER,

            target_fps: TARGET_FPS,
            time_step: TIME_STEP,
            worker_threads: None,

            fps_window_ms: FPS_WINDOW_MS,

            seed: None,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.particle_diameter <= 0 || self.boundary_buffer < 0 {
            return Err(SimError::invalid(
                "particle_diameter must be > 0 and boundary_buffer >= 0",
            ));
        }
        let margin = self
            .boundary_buffer
            .checked_mul(2)
            .and_then(|buffers| buffers.checked_add(self.particle_diameter))
            .ok_or_else(|| SimError::invalid("particle_diameter + 2 * boundary_buffer overflows"))?;
        if self.width <= margin || self.height <= margin {
            return Err(SimError::invalid(format!(
                "world must be larger than {margin}x{margin}, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(SimError::invalid(format!(
                "world {}x{} has too many pixels",
                self.width, self.height
            )));
        }
        if self.target_fps == 0 {
            return Err(SimError::invalid("target_fps must be > 0"));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(SimError::invalid("time_step must be finite and > 0"));
        }
        if self.worker_threads == Some(0) {
            return Err(SimError::invalid("worker_threads must be > 0"));
        }
        Ok(())
    }

    /// Wall-clock budget for one tick
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }

    pub fn fps_window(&self) -> Duration {
        Duration::from_millis(self.fps_window_ms)
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            width: self.width,
            height: self.height,
            diameter: self.particle_diameter,
            buffer: self.boundary_buffer,
        }
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get_physical).max(1)
    }
}
