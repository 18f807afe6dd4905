//! Explicit time integration schemes.

use crate::error::{incompatible_shape, Result};
use crate::fields::FieldSet;
use crate::laplacian::SpatialOperator;
use ndarray::{Array2, Zip};

/// Advances a [`FieldSet`] by one timestep.
pub trait TimeIntegrator: Send {
    fn step(&mut self, fields: &mut FieldSet, laplacian: &dyn SpatialOperator, dt: f32)
        -> Result<()>;
}

/// Resize `buf` to `shape` if needed. Only allocates when the shape changes.
fn scratch(buf: &mut Array2<f32>, shape: (usize, usize)) -> &mut Array2<f32> {
    if buf.dim() != shape {
        *buf = Array2::zeros(shape);
    }
    buf
}

fn check_shapes(fields: &FieldSet) -> Result<()> {
    let shape = fields.u.dim();
    if [&fields.u_prev, &fields.c, &fields.d]
        .iter()
        .any(|arr| arr.dim() != shape)
    {
        return Err(incompatible_shape());
    }
    Ok(())
}

/// Leapfrog scheme with spatially varying speed and velocity damping:
///
/// ```text
/// v      = (u - u_prev) * d * global_dampening
/// next_u = u + v + lap(u) * (c * dt)^2
/// ```
///
/// The Laplacian goes into a reused scratch buffer and `u`/`u_prev` are
/// updated in place, so steady-state steps do not allocate.
#[derive(Debug, Clone, Default)]
pub struct StandardWaveIntegrator {
    lap: Array2<f32>,
}

impl StandardWaveIntegrator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeIntegrator for StandardWaveIntegrator {
    fn step(
        &mut self,
        fields: &mut FieldSet,
        laplacian: &dyn SpatialOperator,
        dt: f32,
    ) -> Result<()> {
        check_shapes(fields)?;
        let gd = fields.global_dampening;
        let lap = scratch(&mut self.lap, fields.u.dim());
        laplacian.apply_into(&fields.u, lap)?;

        Zip::from(&mut fields.u)
            .and(&mut fields.u_prev)
            .and(&fields.c)
            .and(&fields.d)
            .and(&*lap)
            .for_each(|u, u_prev, &c, &d, &l| {
                let v = (*u - *u_prev) * d * gd;
                let next = *u + v + l * (c * dt).powi(2);
                *u_prev = *u;
                *u = next;
            });
        Ok(())
    }
}

/// Leapfrog scheme that damps the whole next displacement instead of the
/// velocity term:
///
/// ```text
/// next_u = (2u - u_prev + lap(u) * (c * dt)^2) * d * global_dampening
/// ```
#[derive(Debug, Clone, Default)]
pub struct AmplitudeDampedIntegrator {
    lap: Array2<f32>,
}

impl AmplitudeDampedIntegrator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeIntegrator for AmplitudeDampedIntegrator {
    fn step(
        &mut self,
        fields: &mut FieldSet,
        laplacian: &dyn SpatialOperator,
        dt: f32,
    ) -> Result<()> {
        check_shapes(fields)?;
        let gd = fields.global_dampening;
        let lap = scratch(&mut self.lap, fields.u.dim());
        laplacian.apply_into(&fields.u, lap)?;

        Zip::from(&mut fields.u)
            .and(&mut fields.u_prev)
            .and(&fields.c)
            .and(&fields.d)
            .and(&*lap)
            .for_each(|u, u_prev, &c, &d, &l| {
                let next = (2.0 * *u - *u_prev + l * (c * dt).powi(2)) * d * gd;
                *u_prev = *u;
                *u = next;
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::laplacian::NinePointLaplacian;

    fn impulse_fields(n: usize) -> FieldSet {
        let mut initial = Array2::<f32>::zeros((n, n));
        initial[[n / 2, n / 2]] = 1.0;
        FieldSet::with_initial(n, n, &CpuBackend::new(), &initial).unwrap()
    }

    #[test]
    fn test_standard_step_from_rest() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut fields = impulse_fields(5);
        let before = fields.u.clone();

        StandardWaveIntegrator::new()
            .step(&mut fields, &lap, 1.0)
            .unwrap();

        assert_eq!(fields.u_prev, before);
        assert_eq!(fields.u[[2, 2]], 0.0);
        assert_eq!(fields.u[[1, 2]], 0.184);
        assert_eq!(fields.u[[2, 3]], 0.184);
        assert_eq!(fields.u[[1, 1]], 0.066);
        assert_eq!(fields.u[[3, 3]], 0.066);
        assert_eq!(fields.u[[0, 0]], 0.0);
        assert_eq!(fields.u[[4, 2]], 0.0);
    }

    #[test]
    fn test_speed_scales_laplacian() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut fields = impulse_fields(5);
        fields.c.fill(0.5);

        StandardWaveIntegrator::new()
            .step(&mut fields, &lap, 1.0)
            .unwrap();

        // (c * dt)^2 = 0.25
        assert!((fields.u[[2, 2]] - 0.75).abs() < 1e-6);
        assert!((fields.u[[1, 2]] - 0.046).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_damping() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut fields = FieldSet::new(3, 3, &CpuBackend::new());
        fields.u.fill(1.0);
        fields.c.fill(0.0);
        fields.d.fill(0.5);
        fields.global_dampening = 0.5;

        StandardWaveIntegrator::new()
            .step(&mut fields, &lap, 1.0)
            .unwrap();

        // v = (1 - 0) * 0.5 * 0.5
        assert!(fields.u.iter().all(|&v| (v - 1.25).abs() < 1e-6));
        assert!(fields.u_prev.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_scratch_buffer_is_reused() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut fields = impulse_fields(9);
        let mut integrator = StandardWaveIntegrator::new();
        integrator.step(&mut fields, &lap, 0.5).unwrap();
        let scratch = integrator.lap.as_ptr();
        let u = fields.u.as_ptr();

        for _ in 0..20 {
            integrator.step(&mut fields, &lap, 0.5).unwrap();
        }
        assert_eq!(integrator.lap.as_ptr(), scratch);
        assert_eq!(fields.u.as_ptr(), u);
    }

    #[test]
    fn test_mismatched_material_shape_fails_before_mutation() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut fields = impulse_fields(5);
        fields.c = Array2::ones((4, 5));
        let before = fields.u.clone();

        assert!(StandardWaveIntegrator::new()
            .step(&mut fields, &lap, 1.0)
            .is_err());
        assert_eq!(fields.u, before);
    }

    #[test]
    fn test_amplitude_damped_matches_standard_without_damping() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut a = impulse_fields(7);
        let mut b = impulse_fields(7);
        let mut standard = StandardWaveIntegrator::new();
        let mut damped = AmplitudeDampedIntegrator::new();

        for _ in 0..5 {
            standard.step(&mut a, &lap, 0.7).unwrap();
            damped.step(&mut b, &lap, 0.7).unwrap();
        }
        let max_diff = Zip::from(&a.u)
            .and(&b.u)
            .fold(0.0f32, |m, &x, &y| m.max((x - y).abs()));
        assert!(max_diff < 1e-5);
    }

    #[test]
    fn test_amplitude_damping_shrinks_field() {
        let lap = NinePointLaplacian::new(CpuBackend::new()).unwrap();
        let mut fields = FieldSet::new(3, 3, &CpuBackend::new());
        fields.u.fill(2.0);
        fields.u_prev.fill(2.0);
        fields.c.fill(0.0);
        fields.d.fill(0.9);

        AmplitudeDampedIntegrator::new()
            .step(&mut fields, &lap, 1.0)
            .unwrap();
        assert!(fields.u.iter().all(|&v| (v - 1.8).abs() < 1e-6));
    }
}
