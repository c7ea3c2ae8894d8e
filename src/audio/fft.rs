use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Magnitude spectrogram: one row of `n_fft / 2 + 1` bins per frame.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    frames: Vec<Vec<f32>>,
    sample_rate: f32,
    n_fft: usize,
    hop_length: usize,
}

impl Spectrogram {
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn bin_count(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Center frequency of bin `k` in Hz.
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate / self.n_fft as f32
    }

    /// Frames per second of the frame grid.
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate / self.hop_length as f32
    }
}

/// Short-time Fourier transform over a whole buffer.
///
/// Frames are centered: the signal is zero padded by `n_fft / 2` on both
/// sides, so a buffer of `n` samples always yields `1 + n / hop` frames,
/// even when it is shorter than one window.
pub struct SpectrumAnalyzer {
    sample_rate: f32,
    n_fft: usize,
    hop_length: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f32, n_fft: usize, hop_length: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);

        Self {
            sample_rate,
            n_fft,
            hop_length,
            fft,
            window: hann_window(n_fft),
        }
    }

    pub fn spectrogram(&self, samples: &[f32]) -> Spectrogram {
        let pad = self.n_fft / 2;
        let frame_count = 1 + samples.len() / self.hop_length;

        let mut frames = Vec::with_capacity(frame_count);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];

        for frame in 0..frame_count {
            // Position of the window start in unpadded sample coordinates.
            let start = (frame * self.hop_length) as isize - pad as isize;

            for (i, slot) in buffer.iter_mut().enumerate() {
                let idx = start + i as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process(&mut buffer);

            frames.push(
                buffer[..=self.n_fft / 2]
                    .iter()
                    .map(|c| c.norm())
                    .collect(),
            );
        }

        Spectrogram {
            frames,
            sample_rate: self.sample_rate,
            n_fft: self.n_fft,
            hop_length: self.hop_length,
        }
    }
}

/// Periodic Hann window, the usual choice for spectral analysis.
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Frame-wise RMS energy with centered, zero-padded frames.
pub fn frame_rms(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let pad = frame_length / 2;
    let frame_count = 1 + samples.len() / hop_length;

    (0..frame_count)
        .map(|frame| {
            let start = (frame * hop_length) as isize - pad as isize;
            let lo = start.max(0) as usize;
            let hi = ((start + frame_length as isize).max(0) as usize).min(samples.len());

            let energy: f32 = if lo < hi {
                samples[lo..hi].iter().map(|x| x * x).sum()
            } else {
                0.0
            };

            // Padding counts toward the window length.
            (energy / frame_length as f32).sqrt()
        })
        .collect()
}
