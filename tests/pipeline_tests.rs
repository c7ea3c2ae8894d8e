//! End-to-end analysis of in-memory recordings.

use std::f32::consts::PI;
use std::io::Cursor;

use rand::rngs::StdRng;
use rand::SeedableRng;
use voice_analyzer::metrics::{EXPRESSION_MIN, SCORE_MAX, SCORE_MIN};
use voice_analyzer::{
    AnalysisError, AnalysisRequest, FixedSelector, Level, MetricKey, Purpose, ShareCard, VoiceAnalyzer,
};

const SAMPLE_RATE: u32 = 22050;

/// A sung-ish phrase: vibrato around 260 Hz with a slow loudness swell.
fn phrase_wav(seconds: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let mut phase = 0.0f32;
        for i in 0..(SAMPLE_RATE as f32 * seconds) as usize {
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = 260.0 + 5.0 * (2.0 * PI * 5.5 * t).sin();
            phase += 2.0 * PI * freq / SAMPLE_RATE as f32;
            let envelope = 0.55 + 0.45 * (2.0 * PI * 0.7 * t).sin();
            let value = 0.4 * envelope * phase.sin();
            writer.write_sample((value * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// MPEG-2 Layer III frames (8 kbit/s, 22050 Hz mono) with zeroed side
/// info; each decodes to 576 silent samples.
fn silent_mp3(seconds: f32) -> Vec<u8> {
    const HEADER: [u8; 4] = [0xFF, 0xF3, 0x10, 0xC0];
    const FRAME_BYTES: usize = 26;

    let frames = (SAMPLE_RATE as f32 * seconds / 576.0).ceil() as usize;
    let mut bytes = Vec::with_capacity(frames * FRAME_BYTES);
    for _ in 0..frames {
        bytes.extend_from_slice(&HEADER);
        bytes.extend_from_slice(&[0u8; FRAME_BYTES - 4]);
    }
    bytes
}

fn request(bytes: Vec<u8>, filename: &str, purpose: Purpose) -> AnalysisRequest {
    AnalysisRequest {
        bytes,
        filename: filename.into(),
        purpose: Some(purpose),
        name: "Alex".into(),
    }
}

#[test]
fn test_scores_stay_in_bounds() {
    let analyzer = VoiceAnalyzer::default();
    let bytes = phrase_wav(6.0);

    for purpose in Purpose::ALL {
        let report = analyzer
            .analyze(&request(bytes.clone(), "phrase.wav", purpose), &mut FixedSelector(0))
            .unwrap();

        for (key, score) in report.metrics.iter() {
            // Multipliers can lift any metric up to the shared cap.
            let min = match key {
                MetricKey::Expression => EXPRESSION_MIN,
                _ => SCORE_MIN,
            };
            assert!((min..=SCORE_MAX).contains(&score), "{} = {} for {}", key, score, purpose);
        }

        let total = report.metrics.total();
        assert!((60..=594).contains(&total));
        assert_eq!(report.diagnosis.total_score, total);
        assert_eq!(report.diagnosis.level, Level::from_total(total));
        assert!(report.diagnosis.text.contains("Alex"));
    }
}

#[test]
fn test_purpose_multipliers_shift_scores() {
    let analyzer = VoiceAnalyzer::default();
    let bytes = phrase_wav(6.0);

    let singing = analyzer
        .analyze(&request(bytes.clone(), "phrase.wav", Purpose::Singing), &mut FixedSelector(0))
        .unwrap();
    let presentation = analyzer
        .analyze(&request(bytes, "phrase.wav", Purpose::Presentation), &mut FixedSelector(0))
        .unwrap();

    assert!(singing.metrics.get(MetricKey::PitchStability) >= presentation.metrics.get(MetricKey::PitchStability));
    assert!(singing.metrics.get(MetricKey::Expression) >= presentation.metrics.get(MetricKey::Expression));
    assert!(presentation.metrics.get(MetricKey::Volume) >= singing.metrics.get(MetricKey::Volume));
    assert_eq!(singing.metrics.get(MetricKey::Rhythm), presentation.metrics.get(MetricKey::Rhythm));
    assert_eq!(singing.metrics.get(MetricKey::Resonance), presentation.metrics.get(MetricKey::Resonance));
}

#[test]
fn test_long_recording_uses_first_thirty_seconds() {
    let report = VoiceAnalyzer::default()
        .analyze(&request(phrase_wav(45.0), "long.wav", Purpose::Speaking), &mut FixedSelector(0))
        .unwrap();
    assert!((report.duration_secs - 30.0).abs() < 1e-9);
}

#[test]
fn test_long_mp3_uses_first_thirty_seconds() {
    let report = VoiceAnalyzer::default()
        .analyze(&request(silent_mp3(45.0), "long.mp3", Purpose::Presentation), &mut FixedSelector(0))
        .unwrap();
    assert!((report.duration_secs - 30.0).abs() < 1e-9);
    // Silence scores the floor values.
    assert_eq!(report.metrics.get(MetricKey::PitchStability), 50);
    assert_eq!(report.metrics.get(MetricKey::Expression), 40);
}

#[test]
fn test_one_second_clip_accepted_at_44k() {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..44100 {
            let value = 0.3 * (2.0 * PI * 330.0 * i as f32 / 44100.0).sin();
            writer.write_sample((value * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    let report = VoiceAnalyzer::default()
        .analyze(&request(cursor.into_inner(), "short.wav", Purpose::Singing), &mut FixedSelector(0))
        .unwrap();
    assert_eq!(report.duration_secs, 1.0);
}

#[test]
fn test_unsupported_extension_rejected() {
    let err = VoiceAnalyzer::default()
        .analyze(&request(phrase_wav(2.0), "clip.flac", Purpose::Singing), &mut FixedSelector(0))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UnsupportedFormat { ref extension } if extension == "flac"));
}

#[test]
fn test_corrupt_wav_rejected() {
    let mut bytes = phrase_wav(2.0);
    bytes.truncate(20);
    let err = VoiceAnalyzer::default()
        .analyze(&request(bytes, "broken.wav", Purpose::Singing), &mut FixedSelector(0))
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Decode(_) | AnalysisError::UnsupportedFormat { .. } | AnalysisError::TooShort { .. }
    ));
}

#[test]
fn test_same_input_and_seed_reproduce_report() {
    let analyzer = VoiceAnalyzer::default();
    let req = request(phrase_wav(4.0), "phrase.wav", Purpose::Singing);

    let first = analyzer.analyze(&req, &mut StdRng::seed_from_u64(42)).unwrap();
    let second = analyzer.analyze(&req, &mut StdRng::seed_from_u64(42)).unwrap();

    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.diagnosis.text, second.diagnosis.text);
}

#[test]
fn test_report_and_share_card_serialize() {
    let report = VoiceAnalyzer::default()
        .analyze(&request(phrase_wav(3.0), "phrase.wav", Purpose::Speaking), &mut FixedSelector(2))
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["purpose"], "speaking");
    let metrics = json["metrics"].as_object().unwrap();
    assert_eq!(metrics.len(), 6);
    assert!(metrics.contains_key("pitch_stability"));

    let card = ShareCard::from_report(&report, chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert_eq!(card.subtitle, "Alex - 2024-01-02");
    assert_eq!(card.total_label, format!("Total score: {}/594", report.diagnosis.total_score));
}
