pub mod beat_detector;
pub mod features;
pub mod fft;
pub mod ingest;

pub use beat_detector::TempoEstimator;
pub use fft::{Spectrogram, SpectrumAnalyzer};
pub use ingest::AudioIngest;

/// Mono PCM ready for analysis.
///
/// Produced by [`AudioIngest`], immutable afterwards and dropped when the
/// analysis call returns.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
