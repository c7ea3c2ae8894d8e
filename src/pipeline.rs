use crate::audio::AudioIngest;
use crate::config::AnalysisConfig;
use crate::diagnosis::{Diagnosis, DiagnosisClassifier, TemplateSelector};
use crate::error::{AnalysisError, Result};
use crate::metrics::{MetricExtractor, MetricSet, Purpose};
use log::info;
use serde::Serialize;

/// Everything the presentation layer collects before an analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub purpose: Option<Purpose>,
    pub name: String,
}

/// Result of one analysis, ready for display or serialisation.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub name: String,
    pub purpose: Purpose,
    pub duration_secs: f64,
    pub metrics: MetricSet,
    pub diagnosis: Diagnosis,
}

/// Ingest, extract, classify.
///
/// Holds only immutable configuration, so one instance can serve any number
/// of requests; each call works on its own buffers.
pub struct VoiceAnalyzer {
    ingest: AudioIngest,
    extractor: MetricExtractor,
}

impl VoiceAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: AnalysisConfig) -> Self {
        Self {
            ingest: AudioIngest::new(&config),
            extractor: MetricExtractor::new(config),
        }
    }

    pub fn analyze<S: TemplateSelector>(
        &self,
        request: &AnalysisRequest,
        selector: &mut S,
    ) -> Result<AnalysisReport> {
        let (purpose, name) = validate(request)?;

        let buffer = self.ingest.load(&request.bytes, &request.filename)?;
        let metrics = self.extractor.extract(&buffer, purpose);
        let diagnosis = DiagnosisClassifier::classify(&metrics, purpose, name, selector);

        info!(
            "Analyzed {} for {}: total {}/594, level {}",
            request.filename, name, diagnosis.total_score, diagnosis.level
        );

        Ok(AnalysisReport {
            name: name.to_string(),
            purpose,
            duration_secs: buffer.duration_secs(),
            metrics,
            diagnosis,
        })
    }
}

impl Default for VoiceAnalyzer {
    /// The default configuration always passes validation.
    fn default() -> Self {
        Self::with_valid_config(AnalysisConfig::default())
    }
}

fn validate(request: &AnalysisRequest) -> Result<(Purpose, &str)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AnalysisError::Validation("name is required".into()));
    }
    let purpose = request
        .purpose
        .ok_or_else(|| AnalysisError::Validation("purpose is required".into()))?;
    if request.bytes.is_empty() {
        return Err(AnalysisError::Validation("audio file is required".into()));
    }
    Ok((purpose, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::FixedSelector;

    fn request(name: &str, purpose: Option<Purpose>, bytes: Vec<u8>) -> AnalysisRequest {
        AnalysisRequest {
            bytes,
            filename: "voice.wav".into(),
            purpose,
            name: name.into(),
        }
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = VoiceAnalyzer::default()
            .analyze(&request("   ", Some(Purpose::Singing), vec![1, 2, 3]), &mut FixedSelector(0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn test_missing_purpose_rejected() {
        let err = VoiceAnalyzer::default()
            .analyze(&request("Alex", None, vec![1, 2, 3]), &mut FixedSelector(0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = VoiceAnalyzer::default()
            .analyze(&request("Alex", Some(Purpose::Speaking), Vec::new()), &mut FixedSelector(0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn test_default_uses_default_config() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert!(VoiceAnalyzer::new(config).is_ok());

        // Validation still runs before decoding on the default analyzer.
        let err = VoiceAnalyzer::default()
            .analyze(&request("Alex", None, vec![1]), &mut FixedSelector(0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            n_fft: 0,
            ..Default::default()
        };
        assert!(matches!(VoiceAnalyzer::new(config), Err(AnalysisError::Config(_))));
    }
}
