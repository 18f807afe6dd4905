//! Discrete Laplacian operators.

use crate::backend::ArrayBackend;
use crate::error::Result;
use ndarray::Array2;

/// Isotropic nine-point stencil. Weights sum to zero.
pub const NINE_POINT_KERNEL: [[f32; 3]; 3] = [
    [0.066, 0.184, 0.066],
    [0.184, -1.0, 0.184],
    [0.066, 0.184, 0.066],
];

/// Classic five-point stencil, usable as a custom kernel.
pub const FIVE_POINT_KERNEL: [[f32; 3]; 3] = [
    [0.0, 1.0, 0.0],
    [1.0, -4.0, 1.0],
    [0.0, 1.0, 0.0],
];

/// Second-derivative approximation of a field.
pub trait SpatialOperator: Send + Sync {
    /// Write the Laplacian of `field` into `out` (same shape as `field`).
    fn apply_into(&self, field: &Array2<f32>, out: &mut Array2<f32>) -> Result<()>;

    fn apply(&self, field: &Array2<f32>) -> Result<Array2<f32>> {
        let mut out = Array2::zeros(field.raw_dim());
        self.apply_into(field, &mut out)?;
        Ok(out)
    }
}

/// Laplacian computed as a convolution with a fixed 3x3 kernel.
#[derive(Debug, Clone)]
pub struct NinePointLaplacian<B: ArrayBackend> {
    backend: B,
    kernel: Array2<f32>,
}

impl<B: ArrayBackend> NinePointLaplacian<B> {
    /// Operator using [`NINE_POINT_KERNEL`].
    pub fn new(backend: B) -> Result<Self> {
        Self::with_kernel(backend, NINE_POINT_KERNEL)
    }

    /// Operator with an injected 3x3 kernel.
    pub fn with_kernel(backend: B, kernel: [[f32; 3]; 3]) -> Result<Self> {
        let data = kernel.iter().flatten().copied().collect();
        let kernel = backend.array(data, (3, 3))?;
        Ok(Self { backend, kernel })
    }

    pub fn kernel(&self) -> &Array2<f32> {
        &self.kernel
    }
}

impl<B: ArrayBackend> SpatialOperator for NinePointLaplacian<B> {
    fn apply_into(&self, field: &Array2<f32>, out: &mut Array2<f32>) -> Result<()> {
        self.backend.convolve2d_into(field, &self.kernel, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CpuBackend, ParallelBackend};

    fn max_abs(a: &Array2<f32>) -> f32 {
        a.iter().fold(0.0f32, |m, &v| m.max(v.abs()))
    }

    #[test]
    fn test_default_kernel_sums_to_zero() {
        let sum: f32 = NINE_POINT_KERNEL.iter().flatten().sum();
        assert!(sum.abs() < 1e-6);
        let sum: f32 = FIVE_POINT_KERNEL.iter().flatten().sum();
        assert_eq!(sum, 0.0);
    }

    #[test]
    fn test_constant_field_interior_is_zero() {
        // Zero padding makes the border non-zero; interior cells must vanish.
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let field = Array2::from_elem((8, 8), 7.0f32);
        let out = lap.apply(&field).unwrap();
        let interior = out.slice(ndarray::s![1..7, 1..7]).to_owned();
        assert!(max_abs(&interior) < 1e-5);
    }

    #[test]
    fn test_impulse_response_is_kernel() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut field = Array2::<f32>::zeros((5, 5));
        field[[2, 2]] = 1.0;
        let out = lap.apply(&field).unwrap();

        assert_eq!(out[[2, 2]], -1.0);
        assert_eq!(out[[1, 2]], 0.184);
        assert_eq!(out[[1, 1]], 0.066);
        assert_eq!(out[[0, 0]], 0.0);
    }

    #[test]
    fn test_custom_kernel() {
        let backend = ParallelBackend::new(Some(1)).unwrap();
        let lap = NinePointLaplacian::with_kernel(backend, FIVE_POINT_KERNEL).unwrap();
        assert_eq!(lap.kernel()[[1, 1]], -4.0);

        let mut field = Array2::<f32>::zeros((3, 3));
        field[[1, 1]] = 2.0;
        let out = lap.apply(&field).unwrap();
        assert_eq!(out[[1, 1]], -8.0);
        assert_eq!(out[[0, 1]], 2.0);
        assert_eq!(out[[0, 0]], 0.0);
    }
}
