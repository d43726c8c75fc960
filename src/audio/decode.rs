use anyhow::{Context, Result};
use std::path::Path;

use super::container::{parse_container, WaveformHeader};
use crate::error::AnalysisError;

pub struct AudioData {
    pub header: WaveformHeader,
    /// Mono i16 samples after downmix
    pub samples: Vec<i16>,
}

impl AudioData {
    pub fn duration_secs(&self) -> f32 {
        if self.header.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.header.sample_rate as f32
    }
}

pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    decode_bytes(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

/// Parse and downmix an in-memory container. A data chunk with no complete
/// stride decodes to an empty stream rather than failing.
pub fn decode_bytes(bytes: &[u8]) -> Result<AudioData> {
    let container = parse_container(bytes)?;
    let samples = match downmix(container.data, container.header.channels) {
        Ok(samples) => samples,
        Err(AnalysisError::EmptyInput) => {
            log::warn!(
                "Data chunk holds no complete sample frame ({} bytes)",
                container.data.len()
            );
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    log::info!(
        "Decoded audio: {} samples, {}Hz, {} channel(s)",
        samples.len(),
        container.header.sample_rate,
        container.header.channels
    );

    Ok(AudioData {
        header: container.header,
        samples,
    })
}

/// Average each interleaved stride of 16-bit LE samples into one mono
/// sample, truncating toward zero. Trailing bytes short of a full stride are
/// dropped.
pub fn downmix(data: &[u8], channels: u16) -> Result<Vec<i16>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::format("channel count is 0"));
    }
    let stride = channels as usize * 2;
    if data.len() < stride {
        return Err(AnalysisError::EmptyInput);
    }

    let mono = data
        .chunks_exact(stride)
        .map(|frame| {
            let sum: i32 = frame
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as i32)
                .sum();
            (sum / channels as i32) as i16
        })
        .collect();
    Ok(mono)
}
