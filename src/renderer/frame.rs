//! CPU pixel buffer and 2D primitives
//!
//! Coordinates here are screen space: origin top-left, y grows downward.
//! Every primitive clips against the buffer, so callers never need to.

use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::Result;

/// One RGBA8 pixel
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: i32,
    height: i32,
    pixels: Vec<Rgba>,
}

impl Frame {
    pub fn new(width: i32, height: i32, background: Rgba) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA8 bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Fill the rectangle with top-left `(x, y)` and size `w` x `h`
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let stride = self.width as usize;
        for row in y0 as usize..y1 as usize {
            let start = row * stride + x0 as usize;
            let end = row * stride + x1 as usize;
            self.pixels[start..end].fill(color);
        }
    }

    /// Filled circle inscribed in the `diameter` square at top-left `(x, y)`
    pub fn fill_circle(&mut self, x: i32, y: i32, diameter: i32, color: Rgba) {
        if diameter <= 0 {
            return;
        }
        let radius = diameter as f64 / 2.0;
        let (cx, cy) = (x as f64 + radius, y as f64 + radius);
        let r2 = radius * radius;
        for py in y..y.saturating_add(diameter) {
            for px in x..x.saturating_add(diameter) {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(px, py, color);
                }
            }
        }
    }

    /// Bresenham line including both endpoints
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Write the frame as an image; format follows the file extension
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        image::save_buffer(
            path.as_ref(),
            self.as_bytes(),
            self.width as u32,
            self.height as u32,
            image::ColorType::Rgba8,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    fn count(frame: &Frame, color: Rgba) -> usize {
        frame.pixels().iter().filter(|&&p| p == color).count()
    }

    #[test]
    fn test_byte_view() {
        let frame = Frame::new(2, 3, Rgba::rgb(1, 2, 3));
        assert_eq!(frame.as_bytes().len(), 2 * 3 * 4);
        assert_eq!(&frame.as_bytes()[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = Frame::new(10, 10, WHITE);
        frame.fill_rect(-5, 8, 8, 8, BLACK);
        assert_eq!(count(&frame, BLACK), 3 * 2);
        assert_eq!(frame.pixel(0, 9), Some(BLACK));
        assert_eq!(frame.pixel(3, 9), Some(WHITE));
    }

    #[test]
    fn test_fill_circle_is_symmetric_and_bounded() {
        let mut frame = Frame::new(20, 20, WHITE);
        frame.fill_circle(5, 5, 5, BLACK);
        assert_eq!(frame.pixel(7, 7), Some(BLACK));
        assert_eq!(frame.pixel(5, 5), Some(WHITE));
        assert_eq!(frame.pixel(4, 7), Some(WHITE));
        assert_eq!(frame.pixel(10, 7), Some(WHITE));
        assert_eq!(frame.pixel(5, 7), frame.pixel(9, 7));
        assert!(count(&frame, BLACK) > 12);
    }

    #[test]
    fn test_draw_line_endpoints() {
        let mut frame = Frame::new(10, 10, WHITE);
        frame.draw_line(0, 0, 9, 4, BLACK);
        assert_eq!(frame.pixel(0, 0), Some(BLACK));
        assert_eq!(frame.pixel(9, 4), Some(BLACK));
        assert_eq!(count(&frame, BLACK), 10);
    }

    #[test]
    fn test_offscreen_drawing_is_ignored() {
        let mut frame = Frame::new(4, 4, WHITE);
        frame.set_pixel(-1, 2, BLACK);
        frame.fill_circle(100, 100, 5, BLACK);
        frame.fill_circle(i32::MAX - 2, i32::MAX - 2, 5, BLACK);
        frame.fill_rect(i32::MAX - 1, i32::MAX - 1, 10, 10, BLACK);
        frame.draw_line(-10, -10, -2, -3, BLACK);
        assert_eq!(count(&frame, BLACK), 0);
    }
}
