use crate::backend::ArrayBackend;
use crate::error::{incompatible_shape, Result};
use ndarray::Array2;

/// Per-cell state of one simulation grid.
///
/// All arrays are `(height, width)`, row-major, and keep that shape for the
/// lifetime of the set.
#[derive(Debug, Clone)]
pub struct FieldSet {
    width: usize,
    height: usize,
    /// Current displacement.
    pub u: Array2<f32>,
    /// Displacement one timestep ago.
    pub u_prev: Array2<f32>,
    /// Wave speed, 1.0 by default.
    pub c: Array2<f32>,
    /// Damping coefficient, 1.0 by default (no damping).
    pub d: Array2<f32>,
    pub global_dampening: f32,
}

impl FieldSet {
    pub fn new<B: ArrayBackend>(width: usize, height: usize, backend: &B) -> Self {
        let shape = (height, width);
        Self {
            width,
            height,
            u: backend.zeros(shape),
            u_prev: backend.zeros(shape),
            c: backend.ones(shape),
            d: backend.ones(shape),
            global_dampening: 1.0,
        }
    }

    /// Field set seeded with an initial displacement (zero initial velocity).
    pub fn with_initial<B: ArrayBackend>(
        width: usize,
        height: usize,
        backend: &B,
        initial: &Array2<f32>,
    ) -> Result<Self> {
        let mut fields = Self::new(width, height, backend);
        fields.set_displacement(initial)?;
        Ok(fields)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(height, width)`, the dimension of every array in the set.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Copy `field` into both time levels. Fails without touching state if
    /// the shape differs from the grid.
    pub fn set_displacement(&mut self, field: &Array2<f32>) -> Result<()> {
        if field.dim() != self.shape() {
            return Err(incompatible_shape());
        }
        self.u.assign(field);
        self.u_prev.assign(field);
        Ok(())
    }
}
