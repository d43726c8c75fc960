use rayon::prelude::*;

use super::decode::AudioData;
use super::features::{frame_scalar, OnsetReport};
use super::onset::{onset_times, OnsetDetector};
use super::quantize::{ClampStats, Quantizer};
use super::spectrum::{Smoother, SpectrumAnalyzer};
use super::window::Window;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

pub fn analyze(audio: &AudioData, config: &AnalysisConfig) -> Result<OnsetReport, AnalysisError> {
    analyze_samples(&audio.samples, audio.header.sample_rate, config)
}

/// Run the onset pipeline over a mono stream. Fewer samples than one frame
/// is not an error: the report simply has no frames and no gaps.
pub fn analyze_samples(
    samples: &[i16],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<OnsetReport, AnalysisError> {
    config.validate()?;
    let clock_rate = config.clock_rate(sample_rate);
    if clock_rate != sample_rate {
        log::debug!(
            "Timing frames at {}Hz while the stream is {}Hz",
            clock_rate,
            sample_rate
        );
    }

    let frame_count = samples.len() / config.frame_size;
    if frame_count == 0 {
        log::warn!(
            "{} samples is less than one {}-sample frame, no onsets",
            samples.len(),
            config.frame_size
        );
        return Ok(OnsetReport::empty(sample_rate, clock_rate, config));
    }

    log::info!("Pass 1: Windowed FFT ({} frames)...", frame_count);
    let spectra = pass1_spectra(samples, config);

    log::info!("Pass 2: Smoothing & quantization (smoothing={:.2})...", config.smoothing);
    let (scalars, clamp) = pass2_scalars(&spectra, config);

    log::info!(
        "Pass 3: Onset detection (threshold={}, min_gap={}ms)...",
        config.threshold,
        config.min_gap_ms
    );
    let detector = OnsetDetector::new(
        config.threshold,
        config.min_gap_ms,
        config.frame_size,
        clock_rate,
    );
    let gaps_ms = detector.detect(&scalars);
    let onset_times_ms = onset_times(&gaps_ms);

    log::info!(
        "Onsets: {} over {} frames ({} of {} bins clamped: {} floor, {} ceiling)",
        onset_times_ms.len(),
        frame_count,
        clamp.clamped(),
        clamp.clamped() + clamp.inside,
        clamp.floor,
        clamp.ceiling
    );

    Ok(OnsetReport {
        sample_rate,
        timing_sample_rate: clock_rate,
        frame_count,
        gaps_ms,
        onset_times_ms,
        scalars,
        clamp,
        config: config.clone(),
    })
}

/// Normalized lower-half magnitudes per whole frame, in frame order. The
/// trailing partial frame is never produced by `chunks_exact`.
fn pass1_spectra(samples: &[i16], config: &AnalysisConfig) -> Vec<Vec<f64>> {
    let size = config.frame_size;
    let window = Window::new(config.window, config.window_alpha, size);

    let transform = |analyzer: &mut SpectrumAnalyzer, chunk: &[i16]| {
        let mut frame: Vec<f64> = chunk.iter().map(|&s| s as f64).collect();
        window.apply(&mut frame);
        analyzer.magnitudes(&frame)
    };

    if config.parallel {
        // One planner per worker; indexed collect keeps frame order for the
        // sequential smoothing pass.
        samples
            .par_chunks_exact(size)
            .map_init(|| SpectrumAnalyzer::new(size), transform)
            .collect()
    } else {
        let mut analyzer = SpectrumAnalyzer::new(size);
        samples
            .chunks_exact(size)
            .map(|chunk| transform(&mut analyzer, chunk))
            .collect()
    }
}

/// Smoothing is a recurrence over frames, so this pass stays in order.
fn pass2_scalars(spectra: &[Vec<f64>], config: &AnalysisConfig) -> (Vec<u8>, ClampStats) {
    let quantizer = Quantizer::new(config.min_decibels, config.max_decibels);
    let mut smoother = Smoother::new(config.frame_size / 2, config.smoothing);
    let mut clamp = ClampStats::default();

    let scalars = spectra
        .iter()
        .map(|magnitudes| {
            let (bytes, stats) = quantizer.quantize_frame(smoother.smooth(magnitudes));
            clamp.merge(stats);
            frame_scalar(&bytes)
        })
        .collect();

    (scalars, clamp)
}

#[cfg(test)]
mod tests {
    use super::super::onset::frame_time_ms;
    use super::*;
    use crate::config::WindowShape;

    /// Sine whose frequency falls between two bins, so leakage spreads
    /// energy across most of the spectrum.
    fn tone(len: usize, sample_rate: f64, amplitude: f64) -> Vec<i16> {
        let freq = 256.5 * sample_rate / 1024.0;
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate;
                (amplitude * (2.0 * std::f64::consts::PI * freq * t).sin()) as i16
            })
            .collect()
    }

    fn silence_then_tone(sample_rate: usize) -> Vec<i16> {
        let mut samples = vec![0i16; sample_rate];
        samples.extend(tone(sample_rate, sample_rate as f64, 16000.0));
        samples
    }

    #[test]
    fn discards_trailing_partial_frame() {
        let samples = tone(1024 * 3 + 500, 44100.0, 8000.0);
        let report = analyze_samples(&samples, 44100, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.frame_count, 3);
        assert_eq!(report.scalars.len(), 3);
        assert_eq!(report.clamp.floor + report.clamp.ceiling + report.clamp.inside, 3 * 512);
    }

    #[test]
    fn short_input_gives_empty_report() {
        let report = analyze_samples(&[100; 1000], 44100, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.frame_count, 0);
        assert!(report.gaps_ms.is_empty());
        assert!(report.scalars.is_empty());
    }

    #[test]
    fn silence_has_no_onsets() {
        let report =
            analyze_samples(&vec![0i16; 44100], 44100, &AnalysisConfig::default()).unwrap();
        assert!(report.scalars.iter().all(|&s| s == 0));
        assert_eq!(report.onset_count(), 0);
        assert_eq!(report.gaps_ms, vec![frame_time_ms(42, 1024, 44100)]);
    }

    #[test]
    fn silence_then_tone_onset_near_one_second() {
        let samples = silence_then_tone(44100);
        let report = analyze_samples(&samples, 44100, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.frame_count, 86);
        assert!(report.gaps_ms.len() >= 2, "gaps: {:?}", report.gaps_ms);
        let first = report.gaps_ms[0];
        assert!(
            (950..=1050).contains(&first),
            "first onset gap should be near 1000 ms, got {}",
            first
        );
        // Gaps add up to the time of the last frame
        let total: u64 = report.gaps_ms.iter().sum();
        assert_eq!(total, frame_time_ms(85, 1024, 44100));
        assert!(*report.gaps_ms.last().unwrap() > 900);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let samples = silence_then_tone(44100);
        let parallel = analyze_samples(&samples, 44100, &AnalysisConfig::default()).unwrap();
        let sequential = analyze_samples(
            &samples,
            44100,
            &AnalysisConfig {
                parallel: false,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();
        assert_eq!(parallel.scalars, sequential.scalars);
        assert_eq!(parallel.gaps_ms, sequential.gaps_ms);
    }

    #[test]
    fn header_rate_changes_timing_only() {
        let samples = silence_then_tone(48000);
        let fixed = analyze_samples(&samples, 48000, &AnalysisConfig::default()).unwrap();
        let from_header = analyze_samples(
            &samples,
            48000,
            &AnalysisConfig {
                use_header_sample_rate: true,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();

        assert_eq!(fixed.timing_sample_rate, 44100);
        assert_eq!(from_header.timing_sample_rate, 48000);
        assert_eq!(fixed.scalars, from_header.scalars);
        // Same onset frame, placed on different clocks
        assert!(fixed.gaps_ms[0] > from_header.gaps_ms[0]);
        assert!((950..=1050).contains(&from_header.gaps_ms[0]));
    }

    #[test]
    fn raising_threshold_suppresses_onsets() {
        let samples = silence_then_tone(44100);
        let report = analyze_samples(
            &samples,
            44100,
            &AnalysisConfig {
                threshold: 255,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();
        assert_eq!(report.onset_count(), 0);
        assert_eq!(report.gaps_ms.len(), 1);
    }

    #[test]
    fn blackman_window_still_finds_onset() {
        let samples = silence_then_tone(44100);
        let report = analyze_samples(
            &samples,
            44100,
            &AnalysisConfig {
                window: WindowShape::Blackman,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();
        assert!(report.onset_count() >= 1);
        assert!((950..=1050).contains(&report.gaps_ms[0]));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = analyze_samples(
            &[0; 4096],
            44100,
            &AnalysisConfig {
                frame_size: 0,
                ..AnalysisConfig::default()
            },
        );
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn nan_window_alpha_is_rejected_not_silent() {
        let samples = tone(44100, 44100.0, 16000.0);
        let result = analyze_samples(
            &samples,
            44100,
            &AnalysisConfig {
                window_alpha: f64::NAN,
                ..AnalysisConfig::default()
            },
        );
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn json_report_echoes_config() {
        let cfg = AnalysisConfig {
            window: WindowShape::Blackman,
            threshold: 20,
            ..AnalysisConfig::default()
        };
        let report = analyze_samples(&silence_then_tone(44100), 44100, &cfg).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["config"]["window"], "blackman");
        assert_eq!(json["config"]["threshold"], 20);
        assert_eq!(json["frame_count"], 86);

        let empty = analyze_samples(&[0; 10], 44100, &cfg).unwrap();
        assert_eq!(empty.config.threshold, 20);
    }
}
