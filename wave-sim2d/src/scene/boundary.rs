use super::{put_pixel, SceneUnit};
use crate::fields::FieldSet;
use ndarray::{Array2, Array3};
use tracing::debug;

/// Damping layer along all four grid edges.
///
/// Inside `thickness` cells of an edge the damping factor falls off as
/// `1 - strength * (1 - dist / thickness)^2`; it is multiplied into `d`, so it
/// composes with other damping units.
#[derive(Debug, Clone)]
pub struct AbsorbingBoundary {
    thickness: usize,
    strength: f32,
    profile: Array2<f32>,
}

impl AbsorbingBoundary {
    pub fn new(width: usize, height: usize, thickness: usize, strength: f32) -> Self {
        let strength = strength.clamp(0.0, 1.0);
        let profile = Array2::from_shape_fn((height, width), |(row, col)| {
            let dist = row
                .min(col)
                .min(height - 1 - row)
                .min(width - 1 - col);
            if dist >= thickness {
                1.0
            } else {
                let ramp = 1.0 - dist as f32 / thickness as f32;
                1.0 - strength * ramp * ramp
            }
        });
        debug!(width, height, thickness, strength, "absorbing boundary");
        Self {
            thickness,
            strength,
            profile,
        }
    }

    pub fn thickness(&self) -> usize {
        self.thickness
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Damping factor the layer applies at each cell.
    pub fn profile(&self) -> &Array2<f32> {
        &self.profile
    }
}

impl SceneUnit for AbsorbingBoundary {
    fn render_to_fields(&mut self, fields: &mut FieldSet) {
        fields.d *= &self.profile;
    }

    fn draw_visualization(&self, image: &mut Array3<u8>) {
        let (h, w) = self.profile.dim();
        for row in 0..h {
            for col in 0..w {
                let p = self.profile[[row, col]];
                if p < 1.0 {
                    let shade = (40.0 * (1.0 - p)).round() as u8;
                    put_pixel(image, row, col, [shade, shade, shade]);
                }
            }
        }
    }
}
