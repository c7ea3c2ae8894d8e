use crate::error::{AnalysisError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable constants of the analysis pipeline.
///
/// The defaults are the production scoring constants; overriding them is
/// meant for experiments, not for normal use. Every field has a default so a
/// partial JSON file only needs to name what it changes.
///
/// ```rust
/// use voice_analyzer::AnalysisConfig;
///
/// let config: AnalysisConfig = serde_json::from_str(r#"{ "max_duration_secs": 15.0 }"#).unwrap();
/// assert_eq!(config.max_duration_secs, 15.0);
/// assert_eq!(config.sample_rate, 22050);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Ingest
    pub sample_rate: u32,
    pub max_duration_secs: f64,
    pub min_duration_secs: f64,

    // Spectral framing (centroid, rolloff, pitch, onset envelope)
    pub n_fft: usize,
    pub hop_length: usize,

    // Volume
    pub silence_threshold: f32,
    pub volume_gain: f32,

    // Clarity / resonance
    pub clarity_scale_hz: f32,
    pub rolloff_percent: f32,
    pub resonance_scale_hz: f32,

    // Pitch tracker
    pub pitch_fmin_hz: f32,
    pub pitch_fmax_hz: f32,
    pub pitch_threshold: f32,

    // Expression
    pub energy_frame_length: usize,
    pub energy_hop_length: usize,
    pub energy_silence_ratio: f32,
    pub expression_gain: f32,

    // Tempo
    pub tempo_min_bpm: f32,
    pub tempo_max_bpm: f32,
    pub tempo_prior_bpm: f32,
    pub speaking_target_bpm: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            max_duration_secs: 30.0,
            min_duration_secs: 1.0,

            n_fft: 2048,
            hop_length: 512,

            silence_threshold: 0.01,
            volume_gain: 500.0,

            clarity_scale_hz: 40.0,
            rolloff_percent: 0.85,
            resonance_scale_hz: 50.0,

            pitch_fmin_hz: 150.0,
            pitch_fmax_hz: 4000.0,
            pitch_threshold: 0.1,

            energy_frame_length: 1024,
            energy_hop_length: 256,
            energy_silence_ratio: 0.1,
            expression_gain: 650.0,

            tempo_min_bpm: 30.0,
            tempo_max_bpm: 300.0,
            tempo_prior_bpm: 120.0,
            speaking_target_bpm: 120.0,
        }
    }
}

impl AnalysisConfig {
    /// Load a config from a JSON file, filling unspecified fields with defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded analysis config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AnalysisError::Config("sample_rate must be positive".into()));
        }
        if self.n_fft < 4 || self.hop_length == 0 {
            return Err(AnalysisError::Config("n_fft must be >= 4 and hop_length positive".into()));
        }
        if self.energy_frame_length == 0 || self.energy_hop_length == 0 {
            return Err(AnalysisError::Config("energy frame and hop lengths must be positive".into()));
        }
        if !(self.max_duration_secs > 0.0) || self.min_duration_secs > self.max_duration_secs {
            return Err(AnalysisError::Config(
                "max_duration_secs must be positive and not below min_duration_secs".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rolloff_percent) {
            return Err(AnalysisError::Config("rolloff_percent must be within 0..=1".into()));
        }
        if self.tempo_min_bpm <= 0.0 || self.tempo_min_bpm >= self.tempo_max_bpm {
            return Err(AnalysisError::Config("tempo range is empty".into()));
        }
        Ok(())
    }

    /// Largest number of samples an ingested buffer may hold.
    pub fn max_samples(&self) -> usize {
        (self.max_duration_secs * self.sample_rate as f64) as usize
    }
}
