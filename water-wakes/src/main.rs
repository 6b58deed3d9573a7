use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use water_wakes::config::Config;
use water_wakes::simulation::Simulation;
use water_wakes::surface::SurfaceMesh;
use water_wakes::visualisation::SurfaceVisualiser;

/// Headless water-wake session: drops scripted disturbances onto the
/// surface and writes colour-mapped frames of the resulting waves.
#[derive(Parser, Debug)]
#[command(name = "water-wakes", version, about)]
struct Cli {
    /// TOML session configuration
    #[arg(short, long, default_value = "config/wakes.toml")]
    config: PathBuf,

    /// Override the frame output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip writing PNG frames
    #[arg(long)]
    no_frames: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_file(&cli.config)?;
    if let Some(dir) = cli.output {
        config.visualization.output_dir = dir.display().to_string();
    }
    if cli.no_frames {
        config.visualization.enabled = false;
    }
    config.log_summary();

    let mut sim = Simulation::initialize(&config).context("Failed to initialise simulation")?;
    let mut mesh = SurfaceMesh::new(&sim.grid);
    let collider = mesh.collision_box();
    tracing::info!(
        "Collider centre {:?}, size {:?}, surface offset {:?}",
        collider.center,
        collider.size,
        mesh.origin_offset()
    );

    let visualiser = if config.visualization.enabled {
        Some(
            SurfaceVisualiser::new(
                &config.visualization.output_dir,
                config.visualization.image_width as u32,
                config.visualization.image_height as u32,
            )
            .with_context(|| {
                format!(
                    "Failed to create output directory '{}'",
                    config.visualization.output_dir
                )
            })?,
        )
    } else {
        None
    };

    let frame_time = 1.0 / config.simulation.frame_rate;
    let frames = config.simulation.frame_count();
    let report_period = config.simulation.report_period as u64;
    let frame_interval = config.visualization.frame_interval as u64;

    tracing::info!("Starting session: {} frames of {:.4} s", frames, frame_time);

    // Save initial state
    if let Some(vis) = &visualiser {
        vis.plot_heights(sim.height_difference(), 0, 0.0)
            .map_err(|e| anyhow!("Failed to write frame: {}", e))?;
    }

    for _ in 0..frames {
        if !sim.advance(frame_time)? {
            continue;
        }

        mesh.apply_heights(sim.height_difference())?;

        let tick = sim.current_tick();
        if let Some(vis) = &visualiser {
            if tick % frame_interval == 0 {
                if let Err(e) = vis.plot_heights(sim.height_difference(), tick, sim.current_time())
                {
                    tracing::warn!("Failed to visualise tick {}: {}", tick, e);
                }
            }
        }

        if tick % report_period == 0 {
            let bounds = mesh.bounds();
            tracing::info!(
                "Tick {} (t={:.2}s) peak={:.4e} energy={:.4e} surface y in [{:.4}, {:.4}]",
                tick,
                sim.current_time(),
                sim.field.peak_amplitude(),
                sim.field.energy(),
                bounds.min.y,
                bounds.max.y
            );
        }
    }

    tracing::info!(
        "Session complete: {} ticks over {} frames",
        sim.current_tick(),
        frames
    );
    if visualiser.is_some() {
        tracing::info!("Frames saved to {}/", config.visualization.output_dir);
    }
    Ok(())
}
