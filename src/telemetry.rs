//! Achieved frame rate measurement
//!
//! Counts frames and recomputes the rate once at least one window has passed.
//! Pure bookkeeping; nothing here feeds back into the simulation.

use std::time::{Duration, Instant};

/// Rolling frames-per-second tracker
#[derive(Debug, Clone)]
pub struct FrameRateTracker {
    /// Minimum time between recomputations
    window: Duration,
    /// Start of the current window
    window_start: Instant,
    /// Frames recorded in the current window
    frames: u32,
    /// Most recently computed rate
    fps: f64,
}

impl FrameRateTracker {
    pub fn new(window: Duration) -> Self {
        Self::starting_at(window, Instant::now())
    }

    pub fn starting_at(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count one frame finished at `now`
    ///
    /// Returns the new rate when the window closed on this frame.
    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window || elapsed.is_zero() {
            return None;
        }

        self.fps = self.frames as f64 / elapsed.as_secs_f64();
        self.frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    /// Last computed frames per second (0 until the first window closes)
    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}
