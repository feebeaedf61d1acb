#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Anchorfall waves headlessly.

mod simulation;
mod tuning_file;

use std::{path::PathBuf, time::Duration};

use anchorfall_core::{DifficultyRating, DifficultySetting};
use anchorfall_system_movement::PatternSynthesizer;
use anchorfall_system_spawning::Config as SchedulerConfig;
use anchorfall_system_wave_generation::WaveTuning;
use anchorfall_world::{World, WorldConfig};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::simulation::Plan;

/// Runs generated waves through the spawn scheduler without rendering.
#[derive(Debug, Parser)]
#[command(name = "anchorfall", version)]
struct Args {
    /// Difficulty rating of the first wave.
    #[arg(long, default_value_t = 100.002)]
    rating: f32,
    /// Difficulty tier from 1 (easy) to 3 (hard).
    #[arg(long, default_value_t = 1)]
    setting: u32,
    /// Maximum number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u32,
    /// Duration of a single frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Seed every wave and the eccentricity stream derive from.
    #[arg(long, default_value_t = 0x4d59_5df4_d0f3_3173)]
    seed: u64,
    /// TOML file overriding the wave generation tuning.
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Seconds an anchor stays alive before it is retired.
    #[arg(long, default_value_t = 4.0)]
    anchor_lifetime: f32,
    /// Number of waves to run back to back.
    #[arg(long, default_value_t = 1)]
    waves: u32,
    /// Factor applied to the rating before each subsequent wave.
    #[arg(long, default_value_t = 2.0)]
    rating_growth: f32,
    /// Seconds between eccentricity resamples; zero disables resampling.
    #[arg(long, default_value_t = 10.0)]
    eccentricity_interval: f32,
    /// Hard limit on pooled anchor instances.
    #[arg(long)]
    pool_limit: Option<usize>,
    /// Log filter, overriding `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,
}

/// Entry point for the Anchorfall command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    let tuning = match args.tuning.as_deref() {
        Some(path) => tuning_file::load(path)?,
        None => WaveTuning::default(),
    };
    let config = WorldConfig {
        tuning,
        scheduler: SchedulerConfig::new(
            seconds(args.eccentricity_interval, "--eccentricity-interval")?,
            args.seed.rotate_left(32),
        ),
        synthesizer: PatternSynthesizer::default(),
        global_seed: args.seed,
        pool_limit: args.pool_limit,
    };
    let plan = Plan {
        rating: DifficultyRating::new(args.rating).context("invalid --rating")?,
        setting: DifficultySetting::new(args.setting).context("invalid --setting")?,
        waves: args.waves.max(1),
        rating_growth: args.rating_growth,
        frames: args.frames,
        frame: Duration::from_millis(args.frame_ms),
        anchor_lifetime: seconds(args.anchor_lifetime, "--anchor-lifetime")?,
    };

    let mut world = World::with_config(config).context("invalid tuning")?;
    info!(seed = args.seed, waves = plan.waves, "running headless simulation");
    let summary = simulation::run(&mut world, &plan).context("simulation aborted")?;
    println!("{summary}");
    Ok(())
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn seconds(value: f32, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f32(value).with_context(|| format!("invalid {flag}: {value}"))
}
