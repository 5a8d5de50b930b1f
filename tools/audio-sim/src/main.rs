//! Audio simulator
//!
//! Walks a listener along a scripted path through a scene of sounds and
//! reverb regions, printing which sounds win a voice on every pass.

mod cli;
mod scene;
mod sim;

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use plasma_audio_core::config;

use cli::Cli;
use sim::Simulation;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => config::load_from_path(path)?,
        None => config::load(),
    };
    let scene = scene::load(&cli.scene)?;
    let mut sim = Simulation::new(scene, settings, cli.voices)?;

    let start = Instant::now();
    let last = cli.frames.saturating_sub(1).max(1) as f32;
    for frame in 0..cli.frames {
        let now = start + Duration::from_millis(cli.step_ms * u64::from(frame));
        let Some(report) = sim.step(frame, frame as f32 / last, now) else {
            continue;
        };
        println!("{report}");
        if cli.verbose {
            for row in &report.rows {
                println!("    {row}");
            }
        }
    }

    println!();
    for stat in sim.finish() {
        println!("{stat}");
    }
    Ok(())
}
