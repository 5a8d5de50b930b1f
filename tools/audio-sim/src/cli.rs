//! CLI definitions using clap

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audio-sim")]
#[command(about = "Walk a listener through a scene and report voice admission and reverb")]
pub struct Cli {
    /// Scene file (TOML)
    pub scene: PathBuf,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 60)]
    pub frames: u32,

    /// Simulated frame time in milliseconds
    #[arg(long, default_value_t = 50)]
    pub step_ms: u64,

    /// Voices the simulated device reports
    #[arg(long, default_value_t = 32)]
    pub voices: u32,

    /// Audio settings file; defaults to the user's settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Print every ranked sound on each pass
    #[arg(long, short)]
    pub verbose: bool,
}
