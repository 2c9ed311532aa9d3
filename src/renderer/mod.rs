//! CPU rendering
//!
//! Turns a `FrameSnapshot` into pixels. Simulation y grows upward and screen y
//! grows downward, so every world coordinate is flipped against the height.
//! Rendering only reads the snapshot, so it can overlap the next tick.

pub mod explorer;
pub mod frame;

pub use explorer::{Camera, CameraInput, render_explorer};
pub use frame::{Frame, Rgba};

use crate::sim::{FrameSnapshot, WorldBounds};

/// Colors for frame elements
pub mod colors {
    use super::Rgba;

    pub const BACKGROUND: Rgba = Rgba::rgb(238, 238, 238);
    pub const PARTICLE: Rgba = Rgba::rgb(0, 0, 0);
    pub const WALL: Rgba = Rgba::rgb(40, 60, 160);
    pub const OUT_OF_WORLD: Rgba = Rgba::rgb(0, 0, 0);
    pub const FOCUS: Rgba = Rgba::rgb(220, 0, 0);
}

/// Render a snapshot into a new frame the size of the world
pub fn render(snapshot: &FrameSnapshot, bounds: &WorldBounds, camera: Option<&Camera>) -> Frame {
    let mut frame = Frame::new(bounds.width, bounds.height, colors::BACKGROUND);
    render_into(&mut frame, snapshot, bounds, camera);
    frame
}

/// Render into an existing frame, reusing its buffer
pub fn render_into(
    frame: &mut Frame,
    snapshot: &FrameSnapshot,
    bounds: &WorldBounds,
    camera: Option<&Camera>,
) {
    frame.clear(colors::BACKGROUND);
    match camera {
        Some(camera) => render_explorer(frame, snapshot, bounds, camera),
        None => render_world(frame, snapshot, bounds),
    }
}

fn render_world(frame: &mut Frame, snapshot: &FrameSnapshot, bounds: &WorldBounds) {
    for wall in &snapshot.walls {
        let (start, end) = (wall.start(), wall.end());
        frame.draw_line(
            start.x,
            bounds.height - start.y,
            end.x,
            bounds.height - end.y,
            colors::WALL,
        );
    }

    for particle in &snapshot.particles {
        let pos = particle.position();
        let draw_y = bounds.height - pos.y - bounds.diameter;
        frame.fill_circle(pos.x, draw_y, bounds.diameter, colors::PARTICLE);
    }
}
