//! Array construction and convolution backends.
//!
//! Every array a simulator touches is created through one backend. The CPU
//! backend is the portable reference; the parallel backend runs the
//! convolution on a dedicated rayon pool.

use crate::error::{incompatible_shape, Result, WaveError};
use ndarray::{Array2, ArrayView2, Zip};
use num_traits::{One, Zero};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use tracing::debug;

/// Capability set of an array runtime.
pub trait ArrayBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Build an array from row-major literal data.
    fn array<A: Clone>(&self, data: Vec<A>, shape: (usize, usize)) -> Result<Array2<A>> {
        Ok(Array2::from_shape_vec(shape, data)?)
    }

    fn zeros<A: Clone + Zero>(&self, shape: (usize, usize)) -> Array2<A> {
        Array2::zeros(shape)
    }

    fn ones<A: Clone + One>(&self, shape: (usize, usize)) -> Array2<A> {
        Array2::ones(shape)
    }

    /// "Same"-mode, zero-padded 2D convolution of `x` with `kernel`, written
    /// into `out`, which must have the shape of `x`.
    fn convolve2d_into(
        &self,
        x: &Array2<f32>,
        kernel: &Array2<f32>,
        out: &mut Array2<f32>,
    ) -> Result<()>;

    /// Allocating variant of [`ArrayBackend::convolve2d_into`].
    fn convolve2d(&self, x: &Array2<f32>, kernel: &Array2<f32>) -> Result<Array2<f32>> {
        let mut out = self.zeros(x.dim());
        self.convolve2d_into(x, kernel, &mut out)?;
        Ok(out)
    }
}

/// Convolution sum for output cell `(i, j)`.
///
/// The kernel is flipped and anchored at `((kh - 1) / 2, (kw - 1) / 2)`;
/// samples falling outside `x` count as zero.
#[inline]
fn convolve_at(x: &ArrayView2<f32>, kernel: &ArrayView2<f32>, i: usize, j: usize) -> f32 {
    let (h, w) = x.dim();
    let (kh, kw) = kernel.dim();
    let oi = i + (kh - 1) / 2;
    let oj = j + (kw - 1) / 2;

    let mut acc = 0.0f32;
    for m in 0..kh {
        // source row = oi - m, skipped when negative or past the edge
        let Some(si) = oi.checked_sub(m).filter(|&si| si < h) else {
            continue;
        };
        for n in 0..kw {
            let Some(sj) = oj.checked_sub(n).filter(|&sj| sj < w) else {
                continue;
            };
            acc += kernel[[m, n]] * x[[si, sj]];
        }
    }
    acc
}

/// Common argument checks. Returns `false` when the kernel is empty and the
/// result is all zeros.
fn check_convolution(x: &Array2<f32>, kernel: &Array2<f32>, out: &mut Array2<f32>) -> Result<bool> {
    if out.dim() != x.dim() {
        return Err(incompatible_shape());
    }
    if kernel.is_empty() {
        out.fill(0.0);
        return Ok(false);
    }
    Ok(true)
}

/// Single-threaded reference backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        debug!("cpu backend ready");
        Self
    }
}

impl ArrayBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn convolve2d_into(
        &self,
        x: &Array2<f32>,
        kernel: &Array2<f32>,
        out: &mut Array2<f32>,
    ) -> Result<()> {
        if !check_convolution(x, kernel, out)? {
            return Ok(());
        }
        let xv = x.view();
        let kv = kernel.view();
        Zip::indexed(out).for_each(|(i, j), o| *o = convolve_at(&xv, &kv, i, j));
        Ok(())
    }
}

/// Accelerated backend running the convolution cell-parallel on its own
/// rayon thread pool.
#[derive(Clone)]
pub struct ParallelBackend {
    pool: Arc<ThreadPool>,
}

impl ParallelBackend {
    /// Build the backend's thread pool. `None` (or `Some(0)`) lets rayon pick
    /// the thread count.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|idx| format!("wave-sim2d-{}", idx));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| WaveError::BackendUnavailable {
                backend: "parallel",
                reason: e.to_string(),
            })?;

        debug!(threads = pool.current_num_threads(), "parallel backend ready");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for ParallelBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelBackend")
            .field("threads", &self.num_threads())
            .finish()
    }
}

impl ArrayBackend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn convolve2d_into(
        &self,
        x: &Array2<f32>,
        kernel: &Array2<f32>,
        out: &mut Array2<f32>,
    ) -> Result<()> {
        if !check_convolution(x, kernel, out)? {
            return Ok(());
        }
        let xv = x.view();
        let kv = kernel.view();
        self.pool.install(|| {
            Zip::indexed(out).par_for_each(|(i, j), o| *o = convolve_at(&xv, &kv, i, j));
        });
        Ok(())
    }
}
