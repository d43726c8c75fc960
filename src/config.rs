use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AnalysisError;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Window applied to each frame before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WindowShape {
    /// Both correction terms use the same cosine phase. Matches the
    /// reference onset timings.
    #[default]
    SharedPhase,
    /// Canonical three-term Blackman (second term at twice the phase).
    Blackman,
}

/// Tunables for the onset pipeline. Echoed in the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Samples per frame and transform length (default: 1024).
    /// Bins kept per frame are `frame_size / 2`.
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Weight of the previous frame in the magnitude smoothing (default: 0.2).
    /// 0.0 disables smoothing, values near 1.0 make the spectrum sluggish.
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,

    /// Floor of the decibel range, maps to byte 0 (default: -80.0)
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f64,

    /// Ceiling of the decibel range, maps to byte 255 (default: -20.0)
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f64,

    /// Frame-to-frame scalar change that must be exceeded to count as an
    /// onset (default: 14). Strict inequality.
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Debounce interval: an onset is only emitted when more than this many
    /// milliseconds have passed since the previous one (default: 80)
    #[serde(default = "default_min_gap_ms")]
    pub min_gap_ms: u64,

    /// Sample rate used to convert frame indices to milliseconds
    /// (default: 44100). Ignored when `use_header_sample_rate` is set.
    #[serde(default = "default_timing_sample_rate")]
    pub timing_sample_rate: u32,

    /// Time frames with the container's own sample rate instead of
    /// `timing_sample_rate` (default: false)
    #[serde(default)]
    pub use_header_sample_rate: bool,

    #[serde(default)]
    pub window: WindowShape,

    /// Blackman alpha (default: 0.16)
    #[serde(default = "default_window_alpha")]
    pub window_alpha: f64,

    /// Run the per-frame transform on the rayon pool (default: true).
    /// Smoothing and detection stay sequential either way.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub show_scalars: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            smoothing: default_smoothing(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
            threshold: default_threshold(),
            min_gap_ms: default_min_gap_ms(),
            timing_sample_rate: default_timing_sample_rate(),
            use_header_sample_rate: false,
            window: WindowShape::default(),
            window_alpha: default_window_alpha(),
            parallel: default_parallel(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.frame_size < 2 || self.frame_size % 2 != 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "frame_size must be an even number >= 2, got {}",
                self.frame_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(AnalysisError::InvalidConfig(format!(
                "smoothing must be in [0.0, 1.0), got {}",
                self.smoothing
            )));
        }
        if !self.min_decibels.is_finite() || !self.max_decibels.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!(
                "decibel bounds must be finite, got {} and {}",
                self.min_decibels, self.max_decibels
            )));
        }
        if self.max_decibels <= self.min_decibels {
            return Err(AnalysisError::InvalidConfig(format!(
                "max_decibels ({}) must be above min_decibels ({})",
                self.max_decibels, self.min_decibels
            )));
        }
        if !self.window_alpha.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!(
                "window_alpha must be finite, got {}",
                self.window_alpha
            )));
        }
        if self.timing_sample_rate == 0 {
            return Err(AnalysisError::InvalidConfig(
                "timing_sample_rate must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Rate used to place frames on the millisecond clock.
    pub fn clock_rate(&self, header_rate: u32) -> u32 {
        if self.use_header_sample_rate && header_rate > 0 {
            header_rate
        } else {
            self.timing_sample_rate
        }
    }
}

fn default_frame_size() -> usize { 1024 }
fn default_smoothing() -> f64 { 0.2 }
fn default_min_decibels() -> f64 { -80.0 }
fn default_max_decibels() -> f64 { -20.0 }
fn default_threshold() -> u32 { 14 }
fn default_min_gap_ms() -> u64 { 80 }
fn default_timing_sample_rate() -> u32 { 44100 }
fn default_window_alpha() -> f64 { 0.16 }
fn default_parallel() -> bool { true }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Config parse error in {}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path first, then `onsetscan.toml` in the working directory,
/// then the user config locations.
pub fn find_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from("onsetscan.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("onsetscan").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("onsetscan").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}
