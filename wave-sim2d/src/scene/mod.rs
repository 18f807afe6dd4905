//! Scene units: pluggable contributors of material properties, sources and
//! visual overlays.

mod boundary;
mod obstacle;
mod source;

pub use boundary::AbsorbingBoundary;
pub use obstacle::Obstacle;
pub use source::{PointSource, SourceMode, Waveform};

use crate::fields::FieldSet;
use ndarray::Array3;

/// A component that authors part of the scene each tick.
///
/// The simulator calls `render_to_fields` on every unit (in order), then
/// `update_field` on every unit (in order). `draw_visualization` only runs
/// when a visualisation is requested and never touches simulation state.
pub trait SceneUnit: Send {
    /// Write wave speed `c` and/or damping `d`. Both are reset to 1.0 before
    /// the first unit runs.
    fn render_to_fields(&mut self, _fields: &mut FieldSet) {}

    /// Inject sources into the displacement `u` at simulation time `t`.
    fn update_field(&mut self, _fields: &mut FieldSet, _t: f64) {}

    /// Draw onto a `(height, width, 3)` RGB image.
    fn draw_visualization(&self, _image: &mut Array3<u8>) {}
}

/// Set one RGB pixel if it lies inside the image.
pub(crate) fn put_pixel(image: &mut Array3<u8>, row: usize, col: usize, rgb: [u8; 3]) {
    let (h, w, _) = image.dim();
    if row < h && col < w {
        for (ch, &v) in rgb.iter().enumerate() {
            image[[row, col, ch]] = v;
        }
    }
}
