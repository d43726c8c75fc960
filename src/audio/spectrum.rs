use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Forward transform of one windowed frame into normalized lower-half
/// magnitudes.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    buffer: Vec<Complex<f64>>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            fft,
            size,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// `|X[k]| / N` for `k` in `0..N/2`, with the DC bin's imaginary part
    /// dropped before taking the magnitude.
    pub fn magnitudes(&mut self, frame: &[f64]) -> Vec<f64> {
        debug_assert_eq!(frame.len(), self.size);
        for (slot, &s) in self.buffer.iter_mut().zip(frame) {
            *slot = Complex::new(s, 0.0);
        }
        self.fft.process(&mut self.buffer);
        self.buffer[0].im = 0.0;

        let norm = self.size as f64;
        self.buffer[..self.size / 2].iter().map(|c| c.norm() / norm).collect()
    }
}

/// Exponential smoothing of magnitudes across consecutive frames.
///
/// `smoothed = c * prev + (1 - c) * current`, carry starting at zero.
pub struct Smoother {
    constant: f64,
    carry: Vec<f64>,
}

impl Smoother {
    pub fn new(bins: usize, constant: f64) -> Self {
        Self {
            constant,
            carry: vec![0.0; bins],
        }
    }

    /// Fold one frame into the carry and return the smoothed spectrum.
    pub fn smooth(&mut self, magnitudes: &[f64]) -> &[f64] {
        debug_assert_eq!(magnitudes.len(), self.carry.len());
        let c = self.constant;
        for (prev, &cur) in self.carry.iter_mut().zip(magnitudes) {
            *prev = c * *prev + (1.0 - c) * cur;
        }
        &self.carry
    }
}
