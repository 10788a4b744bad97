//! # VISTA
//!
//! Voxel-space terrain flythrough.
//!
//! ```text
//! vista --frames 120 --output flight.png --fly
//! vista --config vista.toml --seed 7 -W 1280 -H 720
//! vista --window                      (built with --features window)
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

mod config;
mod export;
mod input;
#[cfg(feature = "window")]
mod window;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use vista_core::{SyncError, TripleBuffer};
use vista_procedural::{ChunkCache, ChunkPrefetcher, WorldSeed};
use vista_rendering::{FramePipeline, RenderError, RenderLoop, SampleLog, SharedIntent};

use crate::config::{ConfigError, VistaConfig};
use crate::input::{intent_from_keys, HostKey};

/// Simulated frame time for headless runs.
const HEADLESS_FRAME_MS: f64 = 16.0;

/// Everything that can end the host early.
#[derive(Error, Debug)]
pub enum HostError {
    /// Config file problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rendering failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Frame buffer problem outside the pipeline.
    #[error("surface error: {0}")]
    Surface(#[from] SyncError),

    /// Thread or filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Window backend failure.
    #[cfg_attr(not(feature = "window"), allow(dead_code))]
    #[error("window error: {0}")]
    Window(String),
}

#[derive(Parser, Debug)]
#[command(name = "vista", version, about = "Voxel-space terrain flythrough")]
struct Cli {
    /// TOML config with [terrain], [camera] and [render] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Surface width in pixels
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Surface height in pixels
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Frames to render headless
    #[arg(short = 'n', long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    frames: u64,

    /// PNG written after the last headless frame
    #[arg(short, long, default_value = "vista.png")]
    output: PathBuf,

    /// Render worker threads
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// World seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fly forward during the headless run
    #[arg(long)]
    fly: bool,

    /// Open an interactive window instead of writing a PNG
    #[cfg(feature = "window")]
    #[arg(long)]
    window: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<VistaConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => VistaConfig::load(path)?,
            None => VistaConfig::default(),
        };
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }
        if let Some(workers) = self.workers {
            config.render.workers = workers;
        }
        if let Some(seed) = self.seed {
            config.terrain.seed = WorldSeed::new(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), HostError> {
    let config = cli.resolve_config()?;
    tracing::info!(
        "VISTA starting: seed {}, {}x{}, {} workers",
        config.terrain.seed.value(),
        config.render.width,
        config.render.height,
        config.render.workers
    );

    let map = Arc::new(ChunkCache::new(&config.terrain));
    let frames = TripleBuffer::new(config.render.width, config.render.height)?;
    let consumer = frames.consumer()?;
    let intent = Arc::new(SharedIntent::new());
    let log = Arc::new(SampleLog::new());

    let pipeline = FramePipeline::new(Arc::clone(&map), &frames, &config.render)?;
    let prefetcher = ChunkPrefetcher::spawn(Arc::clone(&map), config.render.prefetch_radius)?;
    let render_loop = RenderLoop::new(
        pipeline,
        &config.camera,
        &config.render,
        Arc::clone(&intent),
        Arc::clone(&log) as Arc<dyn vista_rendering::MetricsSink>,
    )
    .with_prefetcher(prefetcher);

    #[cfg(feature = "window")]
    {
        if cli.window {
            let rendered = window::run(render_loop, &intent, &frames, consumer)?;
            report(rendered, &log, &map);
            return Ok(());
        }
    }

    headless(cli, render_loop, &intent, consumer)?;
    report(cli.frames, &log, &map);
    Ok(())
}

fn headless(
    cli: &Cli,
    mut render_loop: RenderLoop,
    intent: &SharedIntent,
    mut consumer: vista_core::FrameConsumer,
) -> Result<(), HostError> {
    if cli.fly {
        intent.set(intent_from_keys(&[HostKey::W], None));
    }

    let mut last = None;
    for _ in 0..cli.frames {
        match render_loop.step(HEADLESS_FRAME_MS) {
            Ok(frame) => last = Some(frame),
            Err(err) => {
                render_loop.shutdown();
                return Err(err.into());
            }
        }
    }

    let camera = *render_loop.camera();
    let over_budget = render_loop.frames_over_budget();
    render_loop.shutdown();

    if let Some(frame) = last {
        let march = frame.march_totals();
        tracing::info!(
            "Frame {}: {:.2}ms ({:.1} fps), {} slices, {} samples, {} spans",
            frame.frame_number,
            frame.render_ms,
            frame.fps(),
            march.slices,
            march.samples,
            march.spans
        );
    }
    tracing::info!("{} of {} frames over budget", over_budget, cli.frames);
    tracing::info!(
        "Camera at ({:.1}, {:.1}), height {:.1}, heading {:.2}",
        camera.x,
        camera.y,
        camera.height,
        camera.heading
    );

    let view = consumer.take_frame();
    export::save_png(&view, &cli.output)?;
    Ok(())
}

fn report(frames: u64, log: &SampleLog, map: &ChunkCache) {
    let summary = log.summary();
    let cache = map.stats();
    tracing::info!(
        "{} frames: avg {:.2}ms, worst {:.2}ms, last {:.2}ms",
        frames,
        summary.average_ms,
        summary.worst_ms,
        summary.last_ms
    );
    tracing::info!(
        "Chunk cache: {} generated, {} hits, {} misses",
        cache.generated,
        cache.hits,
        cache.misses
    );
}
