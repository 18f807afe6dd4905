use crate::backend::ArrayBackend;
use crate::error::{Result, WaveError};
use crate::fields::FieldSet;
use crate::integrator::{StandardWaveIntegrator, TimeIntegrator};
use crate::laplacian::{NinePointLaplacian, SpatialOperator};
use crate::scene::SceneUnit;
use ndarray::{Array2, Array3};
use tracing::{debug, trace};

/// Orchestrates one grid: scene authoring, then time integration.
///
/// A tick is `update_scene()` followed by `update_field()`, once per
/// timestep. The two phases stay separately callable; [`WaveSimulator::tick`]
/// runs both in the right order.
pub struct WaveSimulator<B: ArrayBackend> {
    backend: B,
    laplacian: Box<dyn SpatialOperator>,
    integrator: Box<dyn TimeIntegrator>,
    fields: FieldSet,
    scene: Vec<Box<dyn SceneUnit>>,
    /// Simulation time, advanced by `dt` on every `update_field()`.
    pub t: f64,
    pub dt: f64,
}

impl<B: ArrayBackend> WaveSimulator<B> {
    pub fn new<L, I>(
        width: usize,
        height: usize,
        backend: B,
        laplacian: L,
        integrator: I,
    ) -> Result<Self>
    where
        L: SpatialOperator + 'static,
        I: TimeIntegrator + 'static,
    {
        if width == 0 || height == 0 {
            return Err(WaveError::InvalidDimensions { width, height });
        }
        let fields = FieldSet::new(width, height, &backend);
        debug!(width, height, backend = backend.name(), "simulator created");

        Ok(Self {
            backend,
            laplacian: Box::new(laplacian),
            integrator: Box::new(integrator),
            fields,
            scene: Vec::new(),
            t: 0.0,
            dt: 1.0,
        })
    }

    /// Seed `u` and `u_prev` with the same field (zero initial velocity).
    pub fn with_initial_field(mut self, initial: &Array2<f32>) -> Result<Self> {
        self.fields.set_displacement(initial)?;
        Ok(self)
    }

    pub fn with_scene_units(mut self, units: Vec<Box<dyn SceneUnit>>) -> Self {
        self.scene = units;
        self
    }

    /// Append a unit; it runs after every unit already present.
    pub fn add_scene_unit<U: SceneUnit + 'static>(&mut self, unit: U) {
        self.scene.push(Box::new(unit));
    }

    /// Reset materials, let every unit render them, then let every unit
    /// inject its sources at the current time.
    pub fn update_scene(&mut self) {
        let fields = &mut self.fields;
        fields.c.fill(1.0);
        fields.d.fill(1.0);

        for unit in self.scene.iter_mut() {
            unit.render_to_fields(fields);
        }
        for unit in self.scene.iter_mut() {
            unit.update_field(fields, self.t);
        }
    }

    /// Advance the field by one timestep and move `t` forward by `dt`.
    pub fn update_field(&mut self) -> Result<()> {
        self.integrator
            .step(&mut self.fields, self.laplacian.as_ref(), self.dt as f32)?;
        self.t += self.dt;
        trace!(t = self.t, "field updated");
        Ok(())
    }

    /// One full tick: scene phase, then field phase.
    pub fn tick(&mut self) -> Result<()> {
        self.update_scene();
        self.update_field()
    }

    pub fn run(&mut self, steps: usize) -> Result<()> {
        for _ in 0..steps {
            self.tick()?;
        }
        Ok(())
    }

    /// The live displacement field `u` (not a copy).
    pub fn get_field(&self) -> &Array2<f32> {
        &self.fields.u
    }

    /// Fresh black `(height, width, 3)` image with every unit's overlay.
    pub fn visualize_scene(&self) -> Array3<u8> {
        let mut image = Array3::<u8>::zeros((self.fields.height(), self.fields.width(), 3));
        for unit in self.scene.iter() {
            unit.draw_visualization(&mut image);
        }
        image
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn scene_units(&self) -> &[Box<dyn SceneUnit>] {
        &self.scene
    }

    pub fn width(&self) -> usize {
        self.fields.width()
    }

    pub fn height(&self) -> usize {
        self.fields.height()
    }
}

impl<B: ArrayBackend + Clone + 'static> WaveSimulator<B> {
    /// Simulator with the nine-point Laplacian and the standard integrator.
    pub fn with_defaults(width: usize, height: usize, backend: B) -> Result<Self> {
        let laplacian = NinePointLaplacian::new(backend.clone())?;
        Self::new(width, height, backend, laplacian, StandardWaveIntegrator::new())
    }
}
