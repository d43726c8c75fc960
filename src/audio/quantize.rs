//! Decibel quantization of linear magnitudes into 0-255 bytes.

use serde::Serialize;

const BYTE_MAX: f64 = 255.0;

/// How many quantized values landed inside the byte range versus on
/// either clamp. Useful for calibrating the decibel bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClampStats {
    pub inside: usize,
    pub floor: usize,
    pub ceiling: usize,
}

impl ClampStats {
    pub fn clamped(&self) -> usize {
        self.floor + self.ceiling
    }

    pub fn merge(&mut self, other: ClampStats) {
        self.inside += other.inside;
        self.floor += other.floor;
        self.ceiling += other.ceiling;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Quantizer {
    min_db: f64,
    range_db: f64,
}

impl Quantizer {
    pub fn new(min_db: f64, max_db: f64) -> Self {
        Self {
            min_db,
            range_db: max_db - min_db,
        }
    }

    /// Position of one linear magnitude on the 0..=255 scale, before
    /// clamping. Exact zero is treated as the floor instead of going
    /// through the log.
    fn scaled(&self, linear: f64) -> f64 {
        let db = if linear == 0.0 {
            self.min_db
        } else {
            20.0 * linear.log10()
        };
        BYTE_MAX * (db - self.min_db) / self.range_db
    }

    /// Map one linear magnitude onto the byte range.
    pub fn quantize(&self, linear: f64) -> u8 {
        // `as u8` truncates; NaN falls to 0
        self.scaled(linear).clamp(0.0, BYTE_MAX) as u8
    }

    /// Quantize a frame and count where each value landed. Counting uses
    /// the scaled value, so 0.4 is inside the range even though its byte
    /// is 0.
    pub fn quantize_frame(&self, magnitudes: &[f64]) -> (Vec<u8>, ClampStats) {
        let mut stats = ClampStats::default();
        let bytes = magnitudes
            .iter()
            .map(|&m| {
                let scaled = self.scaled(m);
                if scaled > 0.0 && scaled < BYTE_MAX {
                    stats.inside += 1;
                } else if scaled >= BYTE_MAX {
                    stats.ceiling += 1;
                } else {
                    stats.floor += 1;
                }
                scaled.clamp(0.0, BYTE_MAX) as u8
            })
            .collect();
        (bytes, stats)
    }
}
