//! Runs a wave simulation described by a TOML file.
//!
//! ```bash
//! cargo run -p wave-sim2d --release -- config.toml
//! ffmpeg -framerate 30 -pattern_type glob -i 'output/field_*.png' -c:v libx264 -pix_fmt yuv420p out.mp4
//! ```

use anyhow::{anyhow, Result};
use std::time::Instant;
use tracing::info;
use wave_sim2d::config::{BackendKind, Config};
use wave_sim2d::visualisation::FrameWriter;
use wave_sim2d::{ArrayBackend, CpuBackend, ParallelBackend};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wave_sim2d=info".parse()?),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = Config::from_file(&path)?;
    config.log_summary();

    match config.simulation.backend {
        BackendKind::Cpu => run(&config, CpuBackend::new()),
        BackendKind::Parallel => run(&config, ParallelBackend::new(config.simulation.threads)?),
    }
}

fn run<B: ArrayBackend + Clone + 'static>(config: &Config, backend: B) -> Result<()> {
    let mut sim = config.build_simulator(backend)?;

    let vis = &config.visualization;
    let writer = if vis.save_frames {
        Some(FrameWriter::new(&vis.output_dir, vis.scale, vis.amplitude)?)
    } else {
        None
    };

    info!("Starting simulation on the {} backend...", sim.backend().name());
    let start = Instant::now();
    let steps = config.simulation.steps;
    for step in 0..steps {
        if let Some(writer) = &writer {
            if step % vis.frame_every == 0 {
                writer
                    .write_frame(sim.get_field(), &sim.visualize_scene(), step)
                    .map_err(|e| anyhow!("Failed to write frame {}: {}", step, e))?;
            }
        }

        sim.update_scene();
        sim.update_field()?;

        if (step + 1) % config.simulation.report_period == 0 {
            let peak = sim.get_field().iter().fold(0.0f32, |m, &v| m.max(v.abs()));
            info!("Step {}/{} (t={:.2}, max |u|={:.4})", step + 1, steps, sim.t, peak);
        }
    }

    info!(
        "Simulation complete in {:.2?} ({:.1} steps/s)",
        start.elapsed(),
        steps as f64 / start.elapsed().as_secs_f64().max(1e-9)
    );
    if let Some(writer) = &writer {
        info!("Frames saved to {}", writer.output_dir().display());
    }
    Ok(())
}
