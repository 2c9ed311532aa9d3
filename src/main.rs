//! Particle Sim entry point
//!
//! Headless runner: loads settings, seeds the world with random batches and
//! walls, runs the tick loop for a while and optionally writes the last frame.
//!
//! # Usage
//!
//! ```bash
//! # Five seconds with the defaults
//! particle-sim
//!
//! # Reproducible run with a saved frame
//! particle-sim --seed 42 --seconds 10 --snapshot frame.png
//!
//! # Explorer view around (640, 360)
//! particle-sim --explore 640,360 --snapshot explorer.png
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::IVec2;

use particle_sim::{Result, SimError, Settings, Simulation};

/// Real-time 2D particle simulator (headless)
#[derive(Parser, Debug)]
#[command(name = "particle-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// How long to run the loop
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Random particle batches of each kind to inject
    #[arg(long, default_value_t = 1)]
    random_batches: usize,

    /// Random walls to inject
    #[arg(long, default_value_t = 2)]
    walls: usize,

    /// Seed for random injection (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Render through the explorer camera focused on X,Y
    #[arg(long, value_parser = parse_point)]
    explore: Option<IVec2>,

    /// Write the final frame to this PNG file
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn parse_point(s: &str) -> std::result::Result<IVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let x = x.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(IVec2::new(x, y))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.seconds.is_finite() || cli.seconds < 0.0 {
        return Err(SimError::InvalidInput(format!(
            "--seconds must be a non-negative number, got {}",
            cli.seconds
        )));
    }

    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }

    let sim = Simulation::new(settings)?;
    for _ in 0..cli.walls {
        sim.inject_random_wall()?;
    }
    for _ in 0..cli.random_batches {
        sim.inject_random_particles_between_points()?;
        sim.inject_random_particles_varying_angles()?;
        sim.inject_random_particles_varying_speeds()?;
    }
    if let Some(focus) = cli.explore {
        sim.enter_explorer_mode(focus.x, focus.y)?;
    }
    log::info!(
        "World {}x{}: {} particles, {} walls",
        sim.bounds().width,
        sim.bounds().height,
        sim.particle_count(),
        sim.wall_count()
    );

    sim.start()?;
    let run_for = Duration::from_secs_f64(cli.seconds);
    let started = Instant::now();
    while let Some(remaining) = run_for.checked_sub(started.elapsed()) {
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(Duration::from_secs(1)));
        log::info!(
            "FPS: {:.2}  Particles: {}",
            sim.achieved_frame_rate(),
            sim.particle_count()
        );
    }
    sim.stop();

    let stats = sim.stats();
    log::info!(
        "Ran {} ticks ({} overruns, {} faults)",
        stats.ticks(),
        stats.overruns(),
        stats.faults()
    );

    if let Some(path) = &cli.snapshot {
        sim.render_frame().save_png(path)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}
