//! # wave-sim2d
//!
//! Explicit finite-difference simulation of a scalar wave field on a fixed
//! 2D grid.
//!
//! The engine is assembled from swappable parts:
//!
//! - an [`ArrayBackend`] that builds arrays and runs the convolution
//!   ([`CpuBackend`] reference, [`ParallelBackend`] on a rayon pool),
//! - a [`SpatialOperator`] computing the discrete Laplacian,
//! - a [`TimeIntegrator`] advancing the [`FieldSet`] one step,
//! - [`SceneUnit`]s that author wave speed, damping and sources each tick.
//!
//! ```no_run
//! use wave_sim2d::{CpuBackend, PointSource, WaveSimulator};
//!
//! let mut sim = WaveSimulator::with_defaults(200, 200, CpuBackend::new())?;
//! sim.add_scene_unit(PointSource::new(100, 100, 0.05, 1.0));
//! for _ in 0..500 {
//!     sim.update_scene();
//!     sim.update_field()?;
//! }
//! let u = sim.get_field();
//! # Ok::<(), wave_sim2d::WaveError>(())
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod fields;
pub mod integrator;
pub mod laplacian;
pub mod scene;
pub mod simulator;
pub mod visualisation;

pub use backend::{ArrayBackend, CpuBackend, ParallelBackend};
pub use error::{Result, WaveError};
pub use fields::FieldSet;
pub use integrator::{AmplitudeDampedIntegrator, StandardWaveIntegrator, TimeIntegrator};
pub use laplacian::{NinePointLaplacian, SpatialOperator, FIVE_POINT_KERNEL, NINE_POINT_KERNEL};
pub use scene::{AbsorbingBoundary, Obstacle, PointSource, SceneUnit, SourceMode, Waveform};
pub use simulator::WaveSimulator;
