//! Threshold + debounce onset detection over per-frame scalars.
//!
//! A frame is an onset when its scalar differs from the previous frame's by
//! more than `threshold` and more than `min_gap_ms` have passed since the
//! last onset. The comparison baseline is always the immediately preceding
//! frame, not the last onset.

/// Frame index to milliseconds, truncated.
pub fn frame_time_ms(index: usize, frame_size: usize, sample_rate: u32) -> u64 {
    (index as u64 * frame_size as u64 * 1000) / sample_rate as u64
}

#[derive(Clone, Debug)]
pub struct OnsetDetector {
    threshold: u32,
    min_gap_ms: u64,
    frame_size: usize,
    sample_rate: u32,
}

/// Carried between frames
#[derive(Clone, Copy, Debug)]
struct ScanState {
    previous: u8,
    last_onset_ms: u64,
    current_ms: u64,
}

impl OnsetDetector {
    pub fn new(threshold: u32, min_gap_ms: u64, frame_size: usize, sample_rate: u32) -> Self {
        Self {
            threshold,
            min_gap_ms,
            frame_size,
            sample_rate,
        }
    }

    /// Gaps between successive onsets plus a trailing gap to the last frame.
    /// No frames gives no gaps.
    pub fn detect(&self, scalars: &[u8]) -> Vec<u64> {
        let Some(&first) = scalars.first() else {
            return Vec::new();
        };

        let mut gaps = Vec::new();
        let init = ScanState {
            previous: first,
            last_onset_ms: 0,
            current_ms: 0,
        };

        let end = scalars.iter().enumerate().fold(init, |state, (i, &scalar)| {
            let current_ms = frame_time_ms(i, self.frame_size, self.sample_rate);
            let delta = (scalar as i32 - state.previous as i32).unsigned_abs();
            let elapsed = current_ms - state.last_onset_ms;

            let last_onset_ms = if elapsed > self.min_gap_ms && delta > self.threshold {
                log::trace!("Onset at frame {} ({} ms), delta {}", i, current_ms, delta);
                gaps.push(elapsed);
                current_ms
            } else {
                state.last_onset_ms
            };

            ScanState {
                previous: scalar,
                last_onset_ms,
                current_ms,
            }
        });

        gaps.push(end.current_ms - end.last_onset_ms);
        gaps
    }
}

/// Absolute onset times from a gap sequence (the trailing gap is not an
/// onset).
pub fn onset_times(gaps: &[u64]) -> Vec<u64> {
    let Some((_, onsets)) = gaps.split_last() else {
        return Vec::new();
    };
    onsets
        .iter()
        .scan(0u64, |t, &gap| {
            *t += gap;
            Some(*t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> OnsetDetector {
        OnsetDetector::new(14, 80, 1024, 44100)
    }

    #[test]
    fn frame_times() {
        assert_eq!(frame_time_ms(0, 1024, 44100), 0);
        assert_eq!(frame_time_ms(1, 1024, 44100), 23);
        assert_eq!(frame_time_ms(4, 1024, 44100), 92);
        assert_eq!(frame_time_ms(43, 1024, 44100), 998);
        assert_eq!(frame_time_ms(43, 1024, 48000), 917);
    }

    #[test]
    fn empty_has_no_gaps() {
        assert!(detector().detect(&[]).is_empty());
    }

    #[test]
    fn flat_input_only_trailing_gap() {
        let gaps = detector().detect(&[30; 10]);
        // frame 9 = 208 ms
        assert_eq!(gaps, vec![208]);
    }

    #[test]
    fn threshold_is_strict() {
        let mut scalars = vec![10u8; 8];
        scalars[5] = 24; // delta exactly 14
        assert_eq!(detector().detect(&scalars), vec![162]);

        scalars[5] = 25; // delta 15
        // frame 5 = 116 ms, frame 7 = 162 ms
        assert_eq!(detector().detect(&scalars), vec![116, 46]);
    }

    #[test]
    fn debounces_close_jumps() {
        // Jumps at frames 5 (116 ms) and 7 (162 ms): 46 ms apart
        let scalars = [0, 0, 0, 0, 0, 50, 50, 0, 0, 0];
        let gaps = detector().detect(&scalars);
        assert_eq!(gaps, vec![116, 92]);
        assert_eq!(onset_times(&gaps), vec![116]);
    }

    #[test]
    fn debounce_measured_from_last_onset() {
        // Jumps at frames 5, 7 and 10 (232 ms): the third is 116 ms after
        // the first emitted onset
        let scalars = [0, 0, 0, 0, 0, 50, 50, 0, 0, 0, 60, 60];
        let gaps = detector().detect(&scalars);
        assert_eq!(gaps, vec![116, 116, 23]);
        assert_eq!(onset_times(&gaps), vec![116, 232]);
    }

    #[test]
    fn needs_more_than_min_gap_from_start() {
        // Frame 3 = 69 ms is inside the first 80 ms, frame 4 = 92 ms is not
        let scalars = [0, 0, 0, 40, 0, 0];
        assert_eq!(detector().detect(&scalars), vec![92, 24]);
    }

    #[test]
    fn downward_jumps_count() {
        let scalars = [100, 100, 100, 100, 100, 20, 20];
        assert_eq!(detector().detect(&scalars), vec![116, 23]);
    }

    #[test]
    fn onset_times_accumulate() {
        assert_eq!(onset_times(&[100, 50, 7]), vec![100, 150]);
        assert!(onset_times(&[42]).is_empty());
        assert!(onset_times(&[]).is_empty());
    }
}
