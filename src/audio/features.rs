use serde::Serialize;

use super::quantize::ClampStats;
use crate::config::AnalysisConfig;

/// Result of one analysis run
#[derive(Clone, Debug, Serialize)]
pub struct OnsetReport {
    /// Sample rate declared by the input
    pub sample_rate: u32,
    /// Rate used to convert frame indices to milliseconds
    pub timing_sample_rate: u32,
    /// Whole frames analysed (a trailing partial frame is dropped)
    pub frame_count: usize,
    /// Gap in ms from the previous onset (or 0) to each onset, followed by
    /// the gap from the last onset to the last frame
    pub gaps_ms: Vec<u64>,
    /// Absolute time of each emitted onset
    pub onset_times_ms: Vec<u64>,
    /// Mean quantized level per frame
    pub scalars: Vec<u8>,
    pub clamp: ClampStats,
    /// Settings the run used
    pub config: AnalysisConfig,
}

impl OnsetReport {
    pub fn empty(sample_rate: u32, timing_sample_rate: u32, config: &AnalysisConfig) -> Self {
        Self {
            sample_rate,
            timing_sample_rate,
            frame_count: 0,
            gaps_ms: Vec::new(),
            onset_times_ms: Vec::new(),
            scalars: Vec::new(),
            clamp: ClampStats::default(),
            config: config.clone(),
        }
    }

    pub fn onset_count(&self) -> usize {
        self.onset_times_ms.len()
    }
}

/// Collapse a quantized frame to its truncating integer mean.
pub fn frame_scalar(bytes: &[u8]) -> u8 {
    if bytes.is_empty() {
        return 0;
    }
    let total: usize = bytes.iter().map(|&b| b as usize).sum();
    (total / bytes.len()) as u8
}
