use std::f64::consts::PI;

use crate::config::WindowShape;

/// Precomputed window coefficients for one frame length.
pub struct Window {
    coeffs: Vec<f64>,
}

impl Window {
    pub fn new(shape: WindowShape, alpha: f64, size: usize) -> Self {
        let a0 = 0.5 * (1.0 - alpha);
        let a1 = 0.5;
        let a2 = 0.5 * alpha;

        let coeffs = (0..size)
            .map(|i| {
                let phase = 2.0 * PI * i as f64 / size as f64;
                match shape {
                    // Second correction term deliberately shares the first
                    // term's phase; onset timings are calibrated on it.
                    WindowShape::SharedPhase => a0 - a1 * phase.cos() + a2 * phase.cos(),
                    WindowShape::Blackman => a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos(),
                }
            })
            .collect();

        Self { coeffs }
    }

    /// Multiply `frame` in place. `frame` must match the window length.
    pub fn apply(&self, frame: &mut [f64]) {
        debug_assert_eq!(frame.len(), self.coeffs.len());
        for (sample, w) in frame.iter_mut().zip(&self.coeffs) {
            *sample *= w;
        }
    }
}
