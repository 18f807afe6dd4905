use ndarray::{Array2, Array3, Axis, Zip};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Map a displacement field to RGB with a diverging colour scale.
///
/// `-amplitude` and `+amplitude` land on the two ends of the gradient, zero
/// in the middle; values beyond are clamped.
pub fn colorize_field(
    field: &Array2<f32>,
    amplitude: f32,
    gradient: &dyn colorgrad::Gradient,
) -> Array3<u8> {
    let (h, w) = field.dim();
    let mut image = Array3::<u8>::zeros((h, w, 3));
    Zip::from(image.lanes_mut(Axis(2)))
        .and(field)
        .for_each(|mut px, &v| {
            let normalized = if amplitude > 0.0 {
                (v / amplitude * 0.5 + 0.5).clamp(0.0, 1.0)
            } else {
                0.5
            };
            let rgba = gradient.at(normalized).to_rgba8();
            px[0] = rgba[0];
            px[1] = rgba[1];
            px[2] = rgba[2];
        });
    image
}

/// Copy every non-black pixel of `scene` over `image`.
pub fn overlay(image: &mut Array3<u8>, scene: &Array3<u8>) {
    Zip::from(image.lanes_mut(Axis(2)))
        .and(scene.lanes(Axis(2)))
        .for_each(|mut dst, src| {
            if src.iter().any(|&v| v != 0) {
                dst.assign(&src);
            }
        });
}

/// Writes simulation frames as PNG files.
pub struct FrameWriter {
    output_dir: PathBuf,
    scale: u32,
    amplitude: f32,
    gradient: Box<dyn colorgrad::Gradient>,
}

impl FrameWriter {
    pub fn new(output_dir: &str, scale: u32, amplitude: f32) -> std::io::Result<Self> {
        std::fs::create_dir_all(output_dir)?;

        let gradient = Box::new(colorgrad::preset::rd_yl_bu());

        Ok(Self {
            output_dir: PathBuf::from(output_dir),
            scale: scale.max(1),
            amplitude,
            gradient,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `field` with the scene overlay on top; returns the file path.
    pub fn write_frame(
        &self,
        field: &Array2<f32>,
        scene: &Array3<u8>,
        step: usize,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let mut image = colorize_field(field, self.amplitude, self.gradient.as_ref());
        if scene.dim() == image.dim() {
            overlay(&mut image, scene);
        }

        let filename = self.output_dir.join(format!("field_{:06}.png", step));
        let (h, w, _) = image.dim();
        let s = self.scale;
        let root =
            BitMapBackend::new(&filename, (w as u32 * s, h as u32 * s)).into_drawing_area();
        root.fill(&BLACK)?;

        for row in 0..h {
            for col in 0..w {
                let color = RGBColor(image[[row, col, 0]], image[[row, col, 1]], image[[row, col, 2]]);
                let x0 = (col as u32 * s) as i32;
                let y0 = (row as u32 * s) as i32;
                root.draw(&Rectangle::new(
                    [(x0, y0), (x0 + s as i32 - 1, y0 + s as i32 - 1)],
                    color.filled(),
                ))?;
            }
        }

        root.present()?;
        drop(root);
        debug!(path = %filename.display(), "saved frame");
        Ok(filename)
    }
}
