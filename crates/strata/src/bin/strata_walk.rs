//! # STRATA Walk
//!
//! Headless observer walk over a streamed world.
//!
//! Loads (or defaults) a world config, walks an observer in a straight line
//! and reports what the cache did. Useful for profiling generation and for
//! checking a config file before shipping it.
//!
//! ```bash
//! # Default world, 64 steps east
//! strata_walk
//!
//! # Custom world, diagonal walk, debug logs
//! strata_walk --config world.toml --heading 45 --steps 200 -v
//!
//! # Print the effective config and exit
//! strata_walk --seed 7 --dump-config
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use strata::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strata_walk", about = "Walk an observer through a streamed STRATA world")]
struct Cli {
    /// World config file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the world seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of observer steps
    #[arg(long, default_value = "64")]
    steps: u32,

    /// World units moved per step
    #[arg(long, default_value = "8.0")]
    step_size: f32,

    /// Walk direction in degrees, 0 = +X, 90 = +Z
    #[arg(long, default_value = "0.0")]
    heading: f32,

    /// Override the view radius (unload radius grows to match)
    #[arg(long)]
    view_radius: Option<u32>,

    /// Pause between steps in milliseconds
    #[arg(long, default_value = "16")]
    frame_ms: u64,

    /// How long to wait for the queue to drain after the walk
    #[arg(long, default_value = "5000")]
    settle_ms: u64,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(&cli)?;

    if cli.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    tracing::info!(
        version = strata::crate_info(),
        seed = config.seed,
        chunk_size = config.streaming.chunk_size,
        view_radius = config.streaming.view_radius,
        unload_radius = config.streaming.unload_radius,
        "starting walk"
    );

    let mut streamer =
        ChunkStreamer::from_config(&config).context("failed to start chunk streaming")?;
    walk(&mut streamer, &cli);
    settle(&streamer, Duration::from_millis(cli.settle_ms));
    report(&streamer);

    streamer.cache().shutdown();
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<WorldConfig> {
    let mut config = match &cli.config {
        Some(path) => WorldConfig::from_file(path)
            .with_context(|| format!("failed to load world config {}", path.display()))?,
        None => WorldConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(view) = cli.view_radius {
        config.streaming.view_radius = view;
        config.streaming.unload_radius = config.streaming.unload_radius.max(view.saturating_add(2));
    }

    config.validate().context("invalid world config")?;
    Ok(config)
}

fn walk(streamer: &mut ChunkStreamer, cli: &Cli) {
    let heading = cli.heading.to_radians();
    let (dir_x, dir_z) = (heading.cos(), heading.sin());
    let frame = Duration::from_millis(cli.frame_ms);

    let (mut x, mut z) = (0.0_f32, 0.0_f32);
    for step in 0..=cli.steps {
        if let Some(update) = streamer.update(x, z) {
            tracing::info!(
                step,
                center = %update.center,
                requested = update.requested.len(),
                unloaded = update.unloaded.len(),
                loaded = streamer.cache().loaded_count(),
                pending = streamer.cache().pending_count(),
                "entered chunk"
            );
        }

        match streamer.ground_height(x, z) {
            Some(height) => tracing::debug!(step, x, z, height, "ground"),
            None => tracing::debug!(step, x, z, "ground not loaded yet"),
        }

        x += dir_x * cli.step_size;
        z += dir_z * cli.step_size;
        thread::sleep(frame);
    }
}

fn settle(streamer: &ChunkStreamer, timeout: Duration) {
    let start = Instant::now();
    while streamer.cache().pending_count() > 0 {
        if start.elapsed() >= timeout {
            tracing::warn!(
                pending = streamer.cache().pending_count(),
                "queue did not drain before the settle timeout"
            );
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "queue drained");
}

fn report(streamer: &ChunkStreamer) {
    let cache = streamer.cache();
    let stats = cache.stats();
    let attempts = stats.generated + stats.failed + stats.discarded;
    let mean_ms = if attempts == 0 {
        0.0
    } else {
        stats.generation_time.as_secs_f64() * 1000.0 / attempts as f64
    };

    let sprites: usize = cache
        .tracked_coords()
        .into_iter()
        .filter_map(|coord| cache.get_loaded(coord))
        .map(|chunk| chunk.sprites().len())
        .sum();

    tracing::info!(
        generated = stats.generated,
        failed = stats.failed,
        discarded = stats.discarded,
        mean_generation_ms = mean_ms,
        loaded = cache.loaded_count(),
        sprites,
        materials = cache.materials().len(),
        "walk finished"
    );
}
