use clap::Parser;
use std::path::PathBuf;

use crate::config::{OutputFormat, WindowShape};

#[derive(Parser, Debug)]
#[command(name = "onsetscan", about = "Detect spectral onsets in a 16-bit PCM WAV file")]
pub struct Cli {
    /// Input WAV file (16-bit PCM)
    pub input: PathBuf,

    /// Config file (TOML). Defaults to ./onsetscan.toml or the user config dir.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scalar change that must be exceeded to count as an onset
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// Minimum milliseconds between onsets
    #[arg(long)]
    pub min_gap_ms: Option<u64>,

    /// Weight of the previous frame in spectral smoothing (0.0-1.0)
    #[arg(long)]
    pub smoothing: Option<f64>,

    /// Frame window
    #[arg(long, value_enum)]
    pub window: Option<WindowShape>,

    /// Time frames with the file's sample rate instead of the fixed 44100 Hz
    #[arg(long)]
    pub header_rate: bool,

    /// Disable the parallel transform pass
    #[arg(long)]
    pub sequential: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also print the per-frame scalars (text format)
    #[arg(long)]
    pub scalars: bool,
}
