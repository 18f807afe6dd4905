use crate::backend::ArrayBackend;
use crate::integrator::{AmplitudeDampedIntegrator, StandardWaveIntegrator};
use crate::laplacian::{NinePointLaplacian, NINE_POINT_KERNEL};
use crate::scene::{AbsorbingBoundary, Obstacle, PointSource, SceneUnit, SourceMode, Waveform};
use crate::simulator::WaveSimulator;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!(
                "Grid dimensions must be positive (width={}, height={})",
                self.width,
                self.height
            ));
        }
        Ok(())
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }
}

/// Which array backend runs the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Cpu,
    Parallel,
}

/// Which time integration scheme advances the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    #[default]
    Standard,
    AmplitudeDamped,
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_dt")]
    pub dt: f64,
    pub steps: usize,
    #[serde(default = "default_global_dampening")]
    pub global_dampening: f32,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(default)]
    pub integrator: IntegratorKind,
    #[serde(default = "default_report_period")]
    pub report_period: usize,
    /// Custom 3x3 Laplacian kernel; the nine-point stencil when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<Vec<Vec<f32>>>,
}

fn default_dt() -> f64 {
    1.0
}

fn default_global_dampening() -> f32 {
    1.0
}

fn default_report_period() -> usize {
    100
}

impl SimulationConfig {
    fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(anyhow!("dt must be positive and finite, got {}", self.dt));
        }
        if self.steps == 0 {
            return Err(anyhow!("steps must be positive"));
        }
        if !self.global_dampening.is_finite() || self.global_dampening < 0.0 {
            return Err(anyhow!(
                "global_dampening must be non-negative, got {}",
                self.global_dampening
            ));
        }
        if self.report_period == 0 {
            return Err(anyhow!("report_period must be positive"));
        }
        if let Some(kernel) = &self.kernel {
            if kernel.len() != 3 || kernel.iter().any(|row| row.len() != 3) {
                return Err(anyhow!("kernel must be 3x3, got {:?}", kernel));
            }
        }
        Ok(())
    }

    /// Laplacian kernel to use.
    pub fn kernel(&self) -> [[f32; 3]; 3] {
        match &self.kernel {
            Some(rows) => {
                let mut kernel = [[0.0; 3]; 3];
                for (dst, src) in kernel.iter_mut().zip(rows) {
                    for (d, s) in dst.iter_mut().zip(src) {
                        *d = *s;
                    }
                }
                kernel
            }
            None => NINE_POINT_KERNEL,
        }
    }

    /// Largest `c * dt` for which the leapfrog update stays bounded with the
    /// configured kernel.
    ///
    /// The kernel's Fourier symbol is evaluated at the Nyquist frequencies;
    /// the scheme is stable while `(c dt)^2 * |symbol| <= 4`.
    pub fn courant_limit(&self) -> f64 {
        let kernel = self.kernel();
        let symbol = |sx: f32, sy: f32| -> f32 {
            let mut s = 0.0;
            for (m, row) in kernel.iter().enumerate() {
                for (n, &k) in row.iter().enumerate() {
                    let fx = if m == 1 { 1.0 } else { sx };
                    let fy = if n == 1 { 1.0 } else { sy };
                    s += k * fx * fy;
                }
            }
            s
        };
        let worst = [symbol(-1.0, 1.0), symbol(1.0, -1.0), symbol(-1.0, -1.0)]
            .into_iter()
            .fold(0.0f32, |m, s| m.max(-s));
        if worst <= 0.0 {
            f64::INFINITY
        } else {
            2.0 / (worst as f64).sqrt()
        }
    }
}

/// Time signal of a configured source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformKind {
    #[default]
    Sine,
    Ricker,
}

/// Source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub x: usize,
    pub y: usize,
    pub frequency: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    #[serde(default)]
    pub phase: f64,
    #[serde(default)]
    pub waveform: WaveformKind,
    /// Ricker centre time; `1.2 / frequency` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    /// Add to the field instead of overwriting it.
    #[serde(default)]
    pub soft: bool,
}

fn default_amplitude() -> f64 {
    1.0
}

impl SourceConfig {
    fn validate(&self, grid: &GridConfig) -> Result<()> {
        if !grid.contains(self.x, self.y) {
            return Err(anyhow!(
                "Source position ({}, {}) is outside grid bounds ({}, {})",
                self.x,
                self.y,
                grid.width,
                grid.height
            ));
        }
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(anyhow!("Source frequency must be positive, got {}", self.frequency));
        }
        if let Some(delay) = self.delay {
            if !delay.is_finite() || delay < 0.0 {
                return Err(anyhow!("Source delay must be non-negative, got {}", delay));
            }
        }
        Ok(())
    }

    pub fn to_source(&self) -> PointSource {
        let waveform = match self.waveform {
            WaveformKind::Sine => Waveform::Sine,
            WaveformKind::Ricker => Waveform::Ricker {
                delay: self.delay.unwrap_or(1.2 / self.frequency),
            },
        };
        let mode = if self.soft {
            SourceMode::Soft
        } else {
            SourceMode::Hard
        };
        PointSource::new(self.x, self.y, self.frequency, self.amplitude)
            .with_phase(self.phase)
            .with_waveform(waveform)
            .with_mode(mode)
    }
}

/// Absorbing boundary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    #[serde(default = "default_boundary_thickness")]
    pub thickness: usize,
    #[serde(default = "default_boundary_strength")]
    pub strength: f32,
}

fn default_boundary_thickness() -> usize {
    16
}

fn default_boundary_strength() -> f32 {
    0.5
}

impl BoundaryConfig {
    fn validate(&self) -> Result<()> {
        if self.thickness == 0 {
            return Err(anyhow!("Boundary thickness must be positive"));
        }
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(anyhow!(
                "Boundary strength must be in [0, 1], got {}",
                self.strength
            ));
        }
        Ok(())
    }
}

/// Obstacle configuration. Exactly one of `speed` or `refractive_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refractive_index: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping: Option<f32>,
}

impl ObstacleConfig {
    fn validate(&self, grid: &GridConfig) -> Result<()> {
        if !grid.contains(self.x, self.y) {
            return Err(anyhow!(
                "Obstacle origin ({}, {}) is outside grid bounds ({}, {})",
                self.x,
                self.y,
                grid.width,
                grid.height
            ));
        }
        match (self.speed, self.refractive_index) {
            (Some(speed), None) if !speed.is_finite() || speed < 0.0 => {
                Err(anyhow!("Obstacle speed must be non-negative, got {}", speed))
            }
            (None, Some(n)) if !n.is_finite() || n <= 0.0 => {
                Err(anyhow!("Obstacle refractive_index must be positive, got {}", n))
            }
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(anyhow!(
                "Obstacle at ({}, {}) needs exactly one of speed or refractive_index",
                self.x,
                self.y
            )),
        }
    }

    pub fn to_obstacle(&self) -> Obstacle {
        let obstacle = match (self.speed, self.refractive_index) {
            (_, Some(n)) => {
                Obstacle::with_refractive_index(self.x, self.y, self.width, self.height, n)
            }
            (speed, None) => {
                Obstacle::new(self.x, self.y, self.width, self.height, speed.unwrap_or(1.0))
            }
        };
        match self.damping {
            Some(d) => obstacle.with_damping(d),
            None => obstacle,
        }
    }
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_frame_every")]
    pub frame_every: usize,
    /// Displacement mapped to the ends of the colour scale.
    #[serde(default = "default_amplitude_f32")]
    pub amplitude: f32,
    /// Output pixels per grid cell.
    #[serde(default = "default_scale")]
    pub scale: u32,
    #[serde(default = "default_save_frames")]
    pub save_frames: bool,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_frame_every() -> usize {
    10
}

fn default_amplitude_f32() -> f32 {
    1.0
}

fn default_scale() -> u32 {
    2
}

fn default_save_frames() -> bool {
    true
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            frame_every: default_frame_every(),
            amplitude: default_amplitude_f32(),
            scale: default_scale(),
            save_frames: default_save_frames(),
        }
    }
}

impl VisualizationConfig {
    fn validate(&self) -> Result<()> {
        if self.frame_every == 0 {
            return Err(anyhow!("frame_every must be positive"));
        }
        if self.amplitude <= 0.0 {
            return Err(anyhow!("amplitude must be positive, got {}", self.amplitude));
        }
        if self.scale == 0 {
            return Err(anyhow!("scale must be positive"));
        }
        Ok(())
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryConfig>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.simulation.validate()?;
        self.visualization.validate()?;
        if let Some(boundary) = &self.boundary {
            boundary.validate()?;
        }
        for source in &self.sources {
            source.validate(&self.grid)?;
        }
        for obstacle in &self.obstacles {
            obstacle.validate(&self.grid)?;
        }

        let limit = self.simulation.courant_limit();
        let max_speed = self
            .obstacles
            .iter()
            .filter_map(|o| o.speed.or(o.refractive_index.map(|n| 1.0 / n)))
            .fold(1.0f32, f32::max) as f64;
        if max_speed * self.simulation.dt > limit {
            warn!(
                dt = self.simulation.dt,
                max_speed, limit, "c * dt exceeds the stability limit, the field will blow up"
            );
        }
        if self.sources.is_empty() {
            warn!("no sources configured, the field stays at rest");
        }
        Ok(())
    }

    /// Scene units in evaluation order: boundary, obstacles, sources.
    pub fn scene_units(&self) -> Vec<Box<dyn SceneUnit>> {
        let mut units: Vec<Box<dyn SceneUnit>> = Vec::new();
        if let Some(b) = &self.boundary {
            units.push(Box::new(AbsorbingBoundary::new(
                self.grid.width,
                self.grid.height,
                b.thickness,
                b.strength,
            )));
        }
        for obstacle in &self.obstacles {
            units.push(Box::new(obstacle.to_obstacle()));
        }
        for source in &self.sources {
            units.push(Box::new(source.to_source()));
        }
        units
    }

    /// Assemble a simulator on `backend` with the configured operator,
    /// integrator, scene units, timestep and global dampening.
    pub fn build_simulator<B>(&self, backend: B) -> Result<WaveSimulator<B>>
    where
        B: ArrayBackend + Clone + 'static,
    {
        let laplacian = NinePointLaplacian::with_kernel(backend.clone(), self.simulation.kernel())?;
        let (width, height) = (self.grid.width, self.grid.height);
        let mut sim = match self.simulation.integrator {
            IntegratorKind::Standard => {
                WaveSimulator::new(width, height, backend, laplacian, StandardWaveIntegrator::new())?
            }
            IntegratorKind::AmplitudeDamped => WaveSimulator::new(
                width,
                height,
                backend,
                laplacian,
                AmplitudeDampedIntegrator::new(),
            )?,
        }
        .with_scene_units(self.scene_units());
        sim.dt = self.simulation.dt;
        sim.fields_mut().global_dampening = self.simulation.global_dampening;
        Ok(sim)
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        info!("=== Simulation Configuration ===");
        info!("Grid: {}x{}", self.grid.width, self.grid.height);
        info!(
            "Simulation: dt={}, steps={}, backend={:?}, integrator={:?}, global_dampening={}",
            self.simulation.dt,
            self.simulation.steps,
            self.simulation.backend,
            self.simulation.integrator,
            self.simulation.global_dampening
        );
        info!("Sources: {} source(s)", self.sources.len());
        for (i, src) in self.sources.iter().enumerate() {
            info!(
                "  Source {}: position ({}, {}), freq={}, amp={}, waveform={:?}",
                i, src.x, src.y, src.frequency, src.amplitude, src.waveform
            );
        }
        if let Some(b) = &self.boundary {
            info!("Boundary: thickness={}, strength={}", b.thickness, b.strength);
        }
        info!("Obstacles: {}", self.obstacles.len());
        info!(
            "Visualization: every {} steps into '{}' (save_frames={})",
            self.visualization.frame_every,
            self.visualization.output_dir,
            self.visualization.save_frames
        );
        info!("================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[grid]
width = 64
height = 48

[simulation]
steps = 10
"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.simulation.dt, 1.0);
        assert_eq!(config.simulation.global_dampening, 1.0);
        assert_eq!(config.simulation.backend, BackendKind::Cpu);
        assert_eq!(config.simulation.integrator, IntegratorKind::Standard);
        assert_eq!(config.simulation.kernel(), NINE_POINT_KERNEL);
        assert_eq!(config.visualization.frame_every, 10);
        assert!(config.sources.is_empty());
        assert!(config.scene_units().is_empty());
    }

    #[test]
    fn test_full_config() {
        let text = r#"
[grid]
width = 100
height = 80

[simulation]
dt = 0.5
steps = 200
backend = "parallel"
threads = 2
integrator = "amplitude_damped"
kernel = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]]

[[sources]]
x = 50
y = 40
frequency = 0.05
waveform = "ricker"

[[sources]]
x = 10
y = 10
frequency = 0.1
soft = true

[boundary]
thickness = 8

[[obstacles]]
x = 60
y = 0
width = 5
height = 80
refractive_index = 1.5

[visualization]
output_dir = "frames"
save_frames = false
"#;
        let config = Config::from_toml_str(text).unwrap();
        assert_eq!(config.simulation.backend, BackendKind::Parallel);
        assert_eq!(config.simulation.threads, Some(2));
        assert_eq!(config.simulation.integrator, IntegratorKind::AmplitudeDamped);
        assert_eq!(config.simulation.kernel()[1][1], -4.0);
        assert_eq!(config.boundary.as_ref().unwrap().strength, 0.5);
        assert_eq!(config.scene_units().len(), 4);

        let ricker = config.sources[0].to_source();
        assert_eq!(ricker.waveform, Waveform::Ricker { delay: 1.2 / 0.05 });
        assert_eq!(config.sources[1].to_source().mode, SourceMode::Soft);
        assert!((config.obstacles[0].to_obstacle().speed - 1.0 / 1.5).abs() < 1e-6);
        assert!(!config.visualization.save_frames);
    }

    #[test]
    fn test_rejects_invalid() {
        let cases = [
            MINIMAL.replace("width = 64", "width = 0"),
            MINIMAL.replace("steps = 10", "steps = 0"),
            format!("{}dt = -1.0\n", MINIMAL),
            format!("{}kernel = [[1.0, 2.0], [3.0, 4.0]]\n", MINIMAL),
            format!("{}\n[[sources]]\nx = 64\ny = 0\nfrequency = 1.0\n", MINIMAL),
            format!("{}\n[[sources]]\nx = 1\ny = 1\nfrequency = 0.0\n", MINIMAL),
            format!("{}\n[[sources]]\nx = 1\ny = 1\nfrequency = nan\n", MINIMAL),
            format!(
                "{}\n[[sources]]\nx = 1\ny = 1\nfrequency = 1.0\nwaveform = \"ricker\"\ndelay = nan\n",
                MINIMAL
            ),
            format!("{}\n[boundary]\nthickness = 0\n", MINIMAL),
            format!("{}\n[boundary]\nstrength = 1.5\n", MINIMAL),
            format!("{}\n[[obstacles]]\nx = 1\ny = 1\nwidth = 2\nheight = 2\n", MINIMAL),
            format!(
                "{}\n[[obstacles]]\nx = 1\ny = 1\nwidth = 2\nheight = 2\nspeed = 0.5\nrefractive_index = 2.0\n",
                MINIMAL
            ),
            format!(
                "{}\n[[obstacles]]\nx = 1\ny = 1\nwidth = 2\nheight = 2\nspeed = nan\n",
                MINIMAL
            ),
            format!(
                "{}\n[[obstacles]]\nx = 1\ny = 1\nwidth = 2\nheight = 2\nrefractive_index = nan\n",
                MINIMAL
            ),
            format!(
                "{}\n[[obstacles]]\nx = 1\ny = 1\nwidth = 2\nheight = 2\nrefractive_index = 0.0\n",
                MINIMAL
            ),
            format!("{}\n[visualization]\nframe_every = 0\n", MINIMAL),
        ];
        for text in cases.iter() {
            assert!(Config::from_toml_str(text).is_err(), "accepted:\n{}", text);
        }
    }

    #[test]
    fn test_courant_limit() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        // nine-point symbol at (pi, pi) is -1.472
        let expected = 2.0 / 1.472f64.sqrt();
        assert!((config.simulation.courant_limit() - expected).abs() < 1e-4);

        let mut five = config.simulation.clone();
        five.kernel = Some(vec![vec![0.0, 1.0, 0.0], vec![1.0, -4.0, 1.0], vec![0.0, 1.0, 0.0]]);
        // |symbol| = 8 at (pi, pi)
        assert!((five.courant_limit() - 2.0 / 8.0f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.grid.width, 64);

        assert!(Config::from_file("/definitely/not/here.toml").is_err());
    }
}
