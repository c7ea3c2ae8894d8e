//! Frame-wise spectral features over a [`Spectrogram`].

use super::Spectrogram;

/// Energy-weighted mean frequency per frame, in Hz. Silent frames give 0.
pub fn spectral_centroid(spec: &Spectrogram) -> Vec<f32> {
    spec.frames()
        .iter()
        .map(|frame| {
            let mut weighted_sum = 0.0f64;
            let mut magnitude_sum = 0.0f64;

            for (k, &magnitude) in frame.iter().enumerate() {
                weighted_sum += spec.bin_frequency(k) as f64 * magnitude as f64;
                magnitude_sum += magnitude as f64;
            }

            if magnitude_sum > 0.0 {
                (weighted_sum / magnitude_sum) as f32
            } else {
                0.0
            }
        })
        .collect()
}

/// Frequency below which `roll_percent` of each frame's magnitude lies, in Hz.
pub fn spectral_rolloff(spec: &Spectrogram, roll_percent: f32) -> Vec<f32> {
    spec.frames()
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().map(|&m| m as f64).sum();
            if total <= 0.0 {
                return 0.0;
            }

            let threshold = total * roll_percent as f64;
            let mut cumulative = 0.0f64;
            for (k, &magnitude) in frame.iter().enumerate() {
                cumulative += magnitude as f64;
                if cumulative >= threshold {
                    return spec.bin_frequency(k);
                }
            }
            spec.bin_frequency(frame.len() - 1)
        })
        .collect()
}

/// Settings for [`track_pitch`].
#[derive(Debug, Clone, Copy)]
pub struct PitchTrackerParams {
    pub fmin: f32,
    pub fmax: f32,
    /// Peaks below `threshold * frame max` are ignored.
    pub threshold: f32,
}

/// Dominant pitch per frame in Hz, 0 where no peak qualifies.
///
/// Candidates are local maxima of the thresholded magnitude inside
/// `[fmin, fmax)`; their position is refined by parabolic interpolation and
/// the strongest candidate of the frame wins.
pub fn track_pitch(spec: &Spectrogram, params: PitchTrackerParams) -> Vec<f32> {
    let bins = spec.bin_count();
    let bin_hz = spec.sample_rate() / spec.n_fft() as f32;

    spec.frames()
        .iter()
        .map(|frame| {
            if bins < 3 {
                return 0.0;
            }

            let frame_max = frame.iter().cloned().fold(0.0f32, f32::max);
            let reference = params.threshold * frame_max;
            let masked = |k: usize| if frame[k] > reference { frame[k] } else { 0.0 };

            let mut best_pitch = 0.0f32;
            let mut best_magnitude = 0.0f32;

            for k in 1..bins - 1 {
                let freq = k as f32 * bin_hz;
                if freq < params.fmin || freq >= params.fmax {
                    continue;
                }

                let here = masked(k);
                if !(here > masked(k - 1) && here >= masked(k + 1)) {
                    continue;
                }

                let (left, right) = (frame[k - 1], frame[k + 1]);
                let avg = 0.5 * (right - left);
                let curvature = 2.0 * frame[k] - right - left;
                let shift = if curvature.abs() < f32::MIN_POSITIVE {
                    avg
                } else {
                    avg / curvature
                };

                let magnitude = frame[k] + 0.5 * avg * shift;
                if magnitude > best_magnitude {
                    best_magnitude = magnitude;
                    best_pitch = (k as f32 + shift) * bin_hz;
                }
            }

            best_pitch
        })
        .collect()
}

pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

/// Population standard deviation.
pub fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values) as f64;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt() as f32
}
