use super::Spectrogram;
use log::debug;

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// Global tempo estimate from the onset-strength autocorrelation.
///
/// The onset envelope is the mean positive change of the dB spectrum between
/// consecutive frames. Its autocorrelation is searched over the lags covering
/// `[min_bpm, max_bpm]`, each lag weighted by a log-normal prior centered on
/// `prior_bpm` with a one-octave spread, which keeps the estimate from locking
/// onto half or double tempo.
pub struct TempoEstimator {
    min_bpm: f32,
    max_bpm: f32,
    prior_bpm: f32,
}

impl TempoEstimator {
    pub fn new(min_bpm: f32, max_bpm: f32, prior_bpm: f32) -> Self {
        Self {
            min_bpm,
            max_bpm,
            prior_bpm,
        }
    }

    /// Tempo in BPM, or 0 when the envelope has no onsets at all.
    pub fn estimate(&self, spec: &Spectrogram) -> f32 {
        let envelope = onset_envelope(spec);
        let frame_rate = spec.frame_rate();

        let mean = envelope.iter().sum::<f32>() / envelope.len().max(1) as f32;
        let centered: Vec<f32> = envelope.iter().map(|&v| v - mean).collect();

        let energy = autocorrelation(&centered, 0);
        if energy <= 0.0 {
            debug!("Flat onset envelope over {} frames, tempo 0", envelope.len());
            return 0.0;
        }

        let min_lag = ((60.0 * frame_rate / self.max_bpm).ceil() as usize).max(1);
        let max_lag = ((60.0 * frame_rate / self.min_bpm).floor() as usize).min(centered.len() - 1);

        let mut best: Option<(usize, f32)> = None;
        for lag in min_lag..=max_lag {
            let ac = (autocorrelation(&centered, lag) / energy).max(0.0);
            let bpm = 60.0 * frame_rate / lag as f32;
            let score = (1.0 + 1e6 * ac).ln() + self.log_prior(bpm);

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((lag, score));
            }
        }

        match best {
            Some((lag, _)) => {
                let tempo = 60.0 * frame_rate / lag as f32;
                debug!("Tempo estimate {:.1} BPM (lag {} frames)", tempo, lag);
                tempo
            }
            None => 0.0,
        }
    }

    fn log_prior(&self, bpm: f32) -> f32 {
        -0.5 * (bpm.log2() - self.prior_bpm.log2()).powi(2)
    }
}

/// Mean positive dB increase per frame, aligned with the spectrogram frames.
pub fn onset_envelope(spec: &Spectrogram) -> Vec<f32> {
    let db_frames: Vec<Vec<f32>> = spec
        .frames()
        .iter()
        .map(|frame| frame.iter().map(|&m| 10.0 * (m * m).max(AMIN).log10()).collect())
        .collect();

    let peak_db = db_frames
        .iter()
        .flat_map(|frame| frame.iter().cloned())
        .fold(f32::NEG_INFINITY, f32::max);
    let floor_db = peak_db - TOP_DB;

    let mut envelope = Vec::with_capacity(db_frames.len());
    envelope.push(0.0);

    for pair in db_frames.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let flux: f32 = current
            .iter()
            .zip(previous.iter())
            .map(|(&c, &p)| (c.max(floor_db) - p.max(floor_db)).max(0.0))
            .sum();
        envelope.push(flux / current.len() as f32);
    }

    envelope
}

fn autocorrelation(signal: &[f32], lag: usize) -> f32 {
    if lag >= signal.len() {
        return 0.0;
    }
    signal[..signal.len() - lag]
        .iter()
        .zip(signal[lag..].iter())
        .map(|(&a, &b)| a * b)
        .sum()
}
