//! Explorer mode camera
//!
//! A coarse grid window centred on a focus point. Each grid cell stands for one
//! world unit and is drawn `width / 33` by `height / 19` pixels large. This is
//! purely presentational: the camera reads snapshots and never touches the world.

use glam::IVec2;

use super::colors;
use super::frame::Frame;
use crate::consts::{EXPLORER_GRID_HEIGHT, EXPLORER_GRID_WIDTH};
use crate::sim::{FrameSnapshot, WorldBounds};

/// Held movement keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl CameraInput {
    /// Map held W/A/S/D keys (case-insensitive) to movement flags
    pub fn from_keys(keys: impl IntoIterator<Item = char>) -> Self {
        let mut input = Self::default();
        for key in keys {
            match key.to_ascii_lowercase() {
                'w' => input.up = true,
                's' => input.down = true,
                'a' => input.left = true,
                'd' => input.right = true,
                _ => {}
            }
        }
        input
    }
}

/// Focus point in world coordinates (y up)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Camera {
    focus: IVec2,
}

impl Camera {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            focus: IVec2::new(x, y),
        }
    }

    #[inline]
    pub fn focus(&self) -> IVec2 {
        self.focus
    }

    /// Move one unit per held key, staying inside [0, width] x [0, height]
    pub fn apply_input(&mut self, input: &CameraInput, bounds: &WorldBounds) {
        const STEP: i32 = 1;
        if input.up {
            self.focus.y = (self.focus.y + STEP).min(bounds.height);
        }
        if input.down {
            self.focus.y = (self.focus.y - STEP).max(0);
        }
        if input.left {
            self.focus.x = (self.focus.x - STEP).max(0);
        }
        if input.right {
            self.focus.x = (self.focus.x + STEP).min(bounds.width);
        }
    }

    pub fn label(&self) -> String {
        format!("({}, {})", self.focus.x, self.focus.y)
    }

    /// Top-left grid cell in screen-space world units, before clamping
    pub fn viewport_origin(&self, bounds: &WorldBounds) -> IVec2 {
        IVec2::new(
            self.focus.x - EXPLORER_GRID_WIDTH / 2,
            bounds.height - self.focus.y - EXPLORER_GRID_HEIGHT / 2,
        )
    }

    /// Viewport origin clamped so the whole window lies inside the world
    pub fn clamped_viewport_origin(&self, bounds: &WorldBounds) -> IVec2 {
        let origin = self.viewport_origin(bounds);
        IVec2::new(
            origin.x.clamp(0, (bounds.width - EXPLORER_GRID_WIDTH).max(0)),
            origin.y.clamp(0, (bounds.height - EXPLORER_GRID_HEIGHT).max(0)),
        )
    }
}

/// Pixel size of one grid cell
pub fn cell_size(bounds: &WorldBounds) -> IVec2 {
    IVec2::new(
        bounds.width / EXPLORER_GRID_WIDTH,
        bounds.height / EXPLORER_GRID_HEIGHT,
    )
}

/// Draw the explorer grid for `snapshot` into a cleared frame
pub fn render_explorer(
    frame: &mut Frame,
    snapshot: &FrameSnapshot,
    bounds: &WorldBounds,
    camera: &Camera,
) {
    let cell = cell_size(bounds);

    // Cells past the world edge, measured from the unclamped window
    let origin = camera.viewport_origin(bounds);
    for row in 0..EXPLORER_GRID_HEIGHT {
        for col in 0..EXPLORER_GRID_WIDTH {
            let wx = origin.x + col;
            let wy = origin.y + row;
            if wx < 0 || wy < 0 || wx >= bounds.width || wy >= bounds.height {
                frame.fill_rect(col * cell.x, row * cell.y, cell.x, cell.y, colors::OUT_OF_WORLD);
            }
        }
    }

    let view = camera.clamped_viewport_origin(bounds);
    for particle in &snapshot.particles {
        let pos = particle.position();
        let rel_x = pos.x - view.x;
        let rel_y = bounds.height - pos.y - view.y;
        if (0..EXPLORER_GRID_WIDTH).contains(&rel_x) && (0..EXPLORER_GRID_HEIGHT).contains(&rel_y) {
            frame.fill_rect(rel_x * cell.x, rel_y * cell.y, cell.x, cell.y, colors::PARTICLE);
        }
    }

    frame.fill_rect(
        (EXPLORER_GRID_WIDTH / 2) * cell.x,
        (EXPLORER_GRID_HEIGHT / 2) * cell.y,
        cell.x,
        cell.y,
        colors::FOCUS,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Particle;

    fn bounds() -> WorldBounds {
        WorldBounds {
            width: 1280,
            height: 720,
            diameter: 5,
            buffer: 1,
        }
    }

    fn blank() -> Frame {
        Frame::new(1280, 720, colors::BACKGROUND)
    }

    #[test]
    fn test_input_moves_and_clamps() {
        let b = bounds();
        let mut camera = Camera::new(0, 720);
        camera.apply_input(&CameraInput::from_keys(['W', 'a']), &b);
        assert_eq!(camera.focus(), IVec2::new(0, 720));

        camera.apply_input(&CameraInput::from_keys(['s', 'd']), &b);
        assert_eq!(camera.focus(), IVec2::new(1, 719));
        assert_eq!(camera.label(), "(1, 719)");
    }

    #[test]
    fn test_viewport_clamped_to_world() {
        let b = bounds();
        let camera = Camera::new(3, 718);
        assert_eq!(camera.viewport_origin(&b), IVec2::new(-13, -7));
        assert_eq!(camera.clamped_viewport_origin(&b), IVec2::ZERO);

        let camera = Camera::new(1280, 0);
        assert_eq!(
            camera.clamped_viewport_origin(&b),
            IVec2::new(1280 - 33, 720 - 19)
        );
    }

    #[test]
    fn test_particle_in_window_fills_cell() {
        let b = bounds();
        let camera = Camera::new(640, 360);
        let snapshot = FrameSnapshot {
            // One unit right of the focus
            particles: vec![Particle::new(641, 360, 0.0, 0.0)],
            walls: Vec::new(),
        };
        let mut frame = blank();
        render_explorer(&mut frame, &snapshot, &b, &camera);

        let cell = cell_size(&b);
        assert_eq!(cell, IVec2::new(38, 37));
        // Focus cell at (16, 9), particle cell at (17, 9)
        assert_eq!(frame.pixel(16 * cell.x + 1, 9 * cell.y + 1), Some(colors::FOCUS));
        assert_eq!(
            frame.pixel(17 * cell.x + 1, 9 * cell.y + 1),
            Some(colors::PARTICLE)
        );
        assert_eq!(frame.pixel(0, 0), Some(colors::BACKGROUND));
    }

    #[test]
    fn test_particle_outside_window_not_drawn() {
        let b = bounds();
        let camera = Camera::new(640, 360);
        let snapshot = FrameSnapshot {
            particles: vec![Particle::new(100, 100, 0.0, 0.0)],
            walls: Vec::new(),
        };
        let mut frame = blank();
        render_explorer(&mut frame, &snapshot, &b, &camera);
        assert!(!frame.pixels().contains(&colors::PARTICLE));
    }

    #[test]
    fn test_edge_shading() {
        let b = bounds();
        let camera = Camera::new(0, 360);
        let mut frame = blank();
        render_explorer(&mut frame, &FrameSnapshot::default(), &b, &camera);
        // 16 columns left of x=0 are outside the world
        assert_eq!(frame.pixel(0, 0), Some(colors::OUT_OF_WORLD));
        assert_eq!(frame.pixel(16 * 38 - 1, 0), Some(colors::OUT_OF_WORLD));
        assert_eq!(frame.pixel(16 * 38, 0), Some(colors::BACKGROUND));
    }
}
