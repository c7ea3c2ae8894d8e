use crate::audio::features::{self, PitchTrackerParams};
use crate::audio::fft::frame_rms;
use crate::audio::{AudioBuffer, SpectrumAnalyzer, TempoEstimator};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use log::debug;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const SCORE_MIN: u32 = 10;
pub const SCORE_MAX: u32 = 99;
pub const EXPRESSION_MIN: u32 = 30;
pub const EXPRESSION_MAX: u32 = 95;

const SILENT_VOLUME_SCORE: u32 = 10;
const NEUTRAL_PITCH_SCORE: u32 = 50;
const DEFAULT_EXPRESSION_SCORE: u32 = 40;
const MIN_EXPRESSION_FRAMES: usize = 10;

/// What the speaker was doing; shifts which metrics are emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Singing,
    Speaking,
    Presentation,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Singing, Purpose::Speaking, Purpose::Presentation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Singing => "singing",
            Purpose::Speaking => "speaking",
            Purpose::Presentation => "presentation",
        }
    }

    /// `(metric, percent)` multipliers applied after scoring.
    pub fn multipliers(&self) -> [(MetricKey, u32); 2] {
        match self {
            Purpose::Singing => [(MetricKey::PitchStability, 120), (MetricKey::Expression, 110)],
            Purpose::Speaking => [(MetricKey::Clarity, 120), (MetricKey::Rhythm, 110)],
            Purpose::Presentation => [(MetricKey::Volume, 110), (MetricKey::Clarity, 110)],
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Purpose::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| AnalysisError::Validation(format!("unknown purpose: {:?}", s)))
    }
}

/// The six scored metrics, declared in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Volume,
    Clarity,
    PitchStability,
    Rhythm,
    Expression,
    Resonance,
}

impl MetricKey {
    pub const ALL: [MetricKey; 6] = [
        MetricKey::Volume,
        MetricKey::Clarity,
        MetricKey::PitchStability,
        MetricKey::Rhythm,
        MetricKey::Expression,
        MetricKey::Resonance,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Volume => "volume",
            MetricKey::Clarity => "clarity",
            MetricKey::PitchStability => "pitch_stability",
            MetricKey::Rhythm => "rhythm",
            MetricKey::Expression => "expression",
            MetricKey::Resonance => "resonance",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        crate::tables::metric_label(*self)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One integer score per metric. All six keys are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSet {
    scores: [u32; 6],
}

impl MetricSet {
    pub fn new(
        volume: u32,
        clarity: u32,
        pitch_stability: u32,
        rhythm: u32,
        expression: u32,
        resonance: u32,
    ) -> Self {
        Self {
            scores: [volume, clarity, pitch_stability, rhythm, expression, resonance],
        }
    }

    pub fn get(&self, key: MetricKey) -> u32 {
        self.scores[key.index()]
    }

    /// Scores in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, u32)> + '_ {
        MetricKey::ALL.iter().map(move |&key| (key, self.get(key)))
    }

    pub fn total(&self) -> u32 {
        self.scores.iter().sum()
    }

    /// Apply the purpose multipliers to already-clamped scores, capping at 99.
    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        for (key, percent) in purpose.multipliers() {
            let score = &mut self.scores[key.index()];
            // Integer math equals truncating the float product for in-range scores.
            *score = (*score * percent / 100).min(SCORE_MAX);
        }
        self
    }
}

impl Serialize for MetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scores.len()))?;
        for (key, score) in self.iter() {
            map.serialize_entry(key.as_str(), &score)?;
        }
        map.end()
    }
}

/// Computes a [`MetricSet`] from decoded audio.
///
/// Pure: the same buffer and purpose always give the same scores.
pub struct MetricExtractor {
    config: AnalysisConfig,
}

impl MetricExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, buffer: &AudioBuffer, purpose: Purpose) -> MetricSet {
        let samples = buffer.samples();
        let sample_rate = buffer.sample_rate() as f32;

        let analyzer = SpectrumAnalyzer::new(sample_rate, self.config.n_fft, self.config.hop_length);
        let spectrogram = analyzer.spectrogram(samples);

        let volume = self.volume_score(samples);
        let clarity = self.clarity_score(&features::spectral_centroid(&spectrogram));
        let pitch_stability = self.pitch_score(&features::track_pitch(
            &spectrogram,
            PitchTrackerParams {
                fmin: self.config.pitch_fmin_hz,
                fmax: self.config.pitch_fmax_hz,
                threshold: self.config.pitch_threshold,
            },
        ));
        let tempo = TempoEstimator::new(
            self.config.tempo_min_bpm,
            self.config.tempo_max_bpm,
            self.config.tempo_prior_bpm,
        )
        .estimate(&spectrogram);
        let rhythm = self.rhythm_score(tempo, purpose);
        let expression = self.expression_score(&frame_rms(
            samples,
            self.config.energy_frame_length,
            self.config.energy_hop_length,
        ));
        let resonance = self.resonance_score(&features::spectral_rolloff(
            &spectrogram,
            self.config.rolloff_percent,
        ));

        let raw = MetricSet::new(volume, clarity, pitch_stability, rhythm, expression, resonance);
        let adjusted = raw.with_purpose(purpose);

        debug!(
            "Metrics for {} ({} frames, tempo {:.1}): raw {:?} -> adjusted {:?}",
            purpose,
            spectrogram.frame_count(),
            tempo,
            raw,
            adjusted
        );
        adjusted
    }

    /// RMS of the non-silent samples scaled by the volume gain.
    pub fn volume_score(&self, samples: &[f32]) -> u32 {
        let loud: Vec<f32> = samples
            .iter()
            .copied()
            .filter(|s| s.abs() > self.config.silence_threshold)
            .collect();

        if loud.is_empty() {
            return SILENT_VOLUME_SCORE;
        }

        let rms = (loud.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / loud.len() as f64).sqrt();
        clamp_score(rms * self.config.volume_gain as f64, SCORE_MIN, SCORE_MAX)
    }

    pub fn clarity_score(&self, centroids: &[f32]) -> u32 {
        let mean = features::mean(centroids) as f64;
        clamp_score(mean / self.config.clarity_scale_hz as f64, SCORE_MIN, SCORE_MAX)
    }

    pub fn pitch_score(&self, pitches: &[f32]) -> u32 {
        let voiced: Vec<f32> = pitches.iter().copied().filter(|&p| p > 0.0).collect();
        if voiced.is_empty() {
            return NEUTRAL_PITCH_SCORE;
        }

        let spread = features::std_dev(&voiced) as f64;
        clamp_score(99.0 - spread / 10.0, SCORE_MIN, SCORE_MAX)
    }

    pub fn rhythm_score(&self, tempo: f32, purpose: Purpose) -> u32 {
        let tempo = tempo as f64;
        let raw = match purpose {
            Purpose::Speaking => 50.0 + (self.config.speaking_target_bpm as f64 - tempo).abs() / 2.0,
            Purpose::Singing | Purpose::Presentation => tempo / 2.0,
        };
        clamp_score(raw, SCORE_MIN, SCORE_MAX)
    }

    /// Coefficient of variation of the non-silent frame energies.
    pub fn expression_score(&self, frame_energies: &[f32]) -> u32 {
        let peak = frame_energies.iter().cloned().fold(0.0f32, f32::max);
        let gate = peak * self.config.energy_silence_ratio;
        let active: Vec<f32> = frame_energies.iter().copied().filter(|&e| e > gate).collect();

        if active.len() <= MIN_EXPRESSION_FRAMES {
            return DEFAULT_EXPRESSION_SCORE;
        }

        let mean = features::mean(&active) as f64;
        if mean <= 0.0 {
            return DEFAULT_EXPRESSION_SCORE;
        }
        let variation = features::std_dev(&active) as f64 / mean;
        clamp_score(
            30.0 + variation * self.config.expression_gain as f64,
            EXPRESSION_MIN,
            EXPRESSION_MAX,
        )
    }

    pub fn resonance_score(&self, rolloffs: &[f32]) -> u32 {
        let mean = features::mean(rolloffs) as f64;
        clamp_score(mean / self.config.resonance_scale_hz as f64, SCORE_MIN, SCORE_MAX)
    }
}

impl Default for MetricExtractor {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

/// Truncate toward zero, then clamp. Non-finite input lands on `min`.
fn clamp_score(raw: f64, min: u32, max: u32) -> u32 {
    if !raw.is_finite() {
        return min;
    }
    raw.trunc().clamp(min as f64, max as f64) as u32
}
