use super::{put_pixel, SceneUnit};
use crate::fields::FieldSet;
use ndarray::Array3;
use std::f64::consts::PI;
use tracing::debug;

/// Time signal emitted by a [`PointSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// `sin(phase + 2π f t)`
    Sine,
    /// Ricker wavelet centred at `delay` seconds.
    Ricker { delay: f64 },
}

/// How the source value reaches the displacement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Overwrite the cell.
    #[default]
    Hard,
    /// Add to the cell.
    Soft,
}

/// Single-cell oscillating source.
#[derive(Debug, Clone)]
pub struct PointSource {
    pub x: usize,
    pub y: usize,
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
    pub waveform: Waveform,
    pub mode: SourceMode,
}

impl PointSource {
    /// Hard sine source with zero phase.
    pub fn new(x: usize, y: usize, frequency: f64, amplitude: f64) -> Self {
        debug!(x, y, frequency, amplitude, "point source");
        Self {
            x,
            y,
            frequency,
            amplitude,
            phase: 0.0,
            waveform: Waveform::Sine,
            mode: SourceMode::Hard,
        }
    }

    /// Ricker source. The default delay `1.2 / f` starts the wavelet near zero.
    pub fn ricker(x: usize, y: usize, frequency: f64, amplitude: f64) -> Self {
        Self::new(x, y, frequency, amplitude).with_waveform(Waveform::Ricker {
            delay: 1.2 / frequency,
        })
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_mode(mut self, mode: SourceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Source value at time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let unit = match self.waveform {
            Waveform::Sine => (self.phase + 2.0 * PI * self.frequency * t).sin(),
            Waveform::Ricker { delay } => {
                let arg = (PI * self.frequency * (t - delay)).powi(2);
                (1.0 - 2.0 * arg) * (-arg).exp()
            }
        };
        self.amplitude * unit
    }
}

impl SceneUnit for PointSource {
    fn update_field(&mut self, fields: &mut FieldSet, t: f64) {
        let value = self.value_at(t) as f32;
        if let Some(cell) = fields.u.get_mut([self.y, self.x]) {
            match self.mode {
                SourceMode::Hard => *cell = value,
                SourceMode::Soft => *cell += value,
            }
        }
    }

    fn draw_visualization(&self, image: &mut Array3<u8>) {
        put_pixel(image, self.y, self.x, [0, 255, 0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    #[test]
    fn test_sine_value() {
        let src = PointSource::new(0, 0, 0.25, 2.0);
        assert!(src.value_at(0.0).abs() < 1e-12);
        // quarter period -> peak
        assert!((src.value_at(1.0) - 2.0).abs() < 1e-12);

        let shifted = src.clone().with_phase(PI / 2.0);
        assert!((shifted.value_at(0.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ricker_peak_at_delay() {
        let src = PointSource::ricker(0, 0, 10.0, 3.0);
        assert!((src.value_at(0.12) - 3.0).abs() < 1e-12);
        assert!(src.value_at(0.0).abs() < 0.01);
    }

    #[test]
    fn test_hard_and_soft_injection() {
        let mut fields = FieldSet::new(4, 3, &CpuBackend::new());
        fields.u[[1, 2]] = 5.0;

        let mut hard = PointSource::new(2, 1, 0.25, 1.0);
        hard.update_field(&mut fields, 1.0);
        assert!((fields.u[[1, 2]] - 1.0).abs() < 1e-6);

        let mut soft = PointSource::new(2, 1, 0.25, 1.0).with_mode(SourceMode::Soft);
        soft.update_field(&mut fields, 1.0);
        assert!((fields.u[[1, 2]] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_grid_source_is_ignored() {
        let mut fields = FieldSet::new(4, 3, &CpuBackend::new());
        let mut src = PointSource::new(10, 10, 0.25, 1.0);
        src.update_field(&mut fields, 1.0);
        assert!(fields.u.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_draws_marker() {
        let mut image = Array3::<u8>::zeros((3, 4, 3));
        PointSource::new(1, 2, 1.0, 1.0).draw_visualization(&mut image);
        assert_eq!(image[[2, 1, 1]], 255);
        assert_eq!(image.iter().filter(|&&v| v != 0).count(), 1);
    }
}
