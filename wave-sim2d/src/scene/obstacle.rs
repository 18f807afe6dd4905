use super::{put_pixel, SceneUnit};
use crate::fields::FieldSet;
use ndarray::{s, Array3};
use tracing::debug;

/// Rectangular region with its own wave speed (and optionally damping).
///
/// A speed below 1.0 behaves like a medium with higher refractive index;
/// a speed of 0.0 makes a wall. The rectangle is clipped to the grid.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub speed: f32,
    pub damping: Option<f32>,
}

impl Obstacle {
    pub fn new(x: usize, y: usize, width: usize, height: usize, speed: f32) -> Self {
        debug!(x, y, width, height, speed, "obstacle");
        Self {
            x,
            y,
            width,
            height,
            speed,
            damping: None,
        }
    }

    /// Obstacle defined by refractive index `n` (speed `1 / n`).
    pub fn with_refractive_index(x: usize, y: usize, width: usize, height: usize, n: f32) -> Self {
        Self::new(x, y, width, height, 1.0 / n)
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = Some(damping);
        self
    }

    /// Row and column ranges of the rectangle inside a `rows x cols` grid.
    fn clipped(&self, rows: usize, cols: usize) -> (usize, usize, usize, usize) {
        let r0 = self.y.min(rows);
        let c0 = self.x.min(cols);
        let r1 = self.y.saturating_add(self.height).min(rows);
        let c1 = self.x.saturating_add(self.width).min(cols);
        (r0, r1, c0, c1)
    }
}

impl SceneUnit for Obstacle {
    fn render_to_fields(&mut self, fields: &mut FieldSet) {
        let (rows, cols) = fields.c.dim();
        let (r0, r1, c0, c1) = self.clipped(rows, cols);
        fields.c.slice_mut(s![r0..r1, c0..c1]).fill(self.speed);
        if let Some(damping) = self.damping {
            fields.d.slice_mut(s![r0..r1, c0..c1]).fill(damping);
        }
    }

    fn draw_visualization(&self, image: &mut Array3<u8>) {
        let (rows, cols, _) = image.dim();
        let (r0, r1, c0, c1) = self.clipped(rows, cols);
        for row in r0..r1 {
            for col in c0..c1 {
                put_pixel(image, row, col, [60, 60, 140]);
            }
        }
    }
}
