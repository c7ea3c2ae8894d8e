//! Scores a short voice recording on six acoustic metrics and writes a
//! graded, personalised diagnosis.
//!
//! ```no_run
//! use voice_analyzer::{AnalysisRequest, Purpose, VoiceAnalyzer};
//!
//! # fn main() -> voice_analyzer::Result<()> {
//! let analyzer = VoiceAnalyzer::default();
//! let request = AnalysisRequest {
//!     bytes: std::fs::read("take.wav").unwrap_or_default(),
//!     filename: "take.wav".into(),
//!     purpose: Some(Purpose::Singing),
//!     name: "Alex".into(),
//! };
//! let report = analyzer.analyze(&request, &mut rand::thread_rng())?;
//! println!("{}", report.diagnosis.text);
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod share;
pub mod tables;

pub use config::AnalysisConfig;
pub use diagnosis::{Diagnosis, DiagnosisClassifier, FixedSelector, Level, TemplateSelector};
pub use error::{AnalysisError, Result};
pub use metrics::{MetricExtractor, MetricKey, MetricSet, Purpose};
pub use pipeline::{AnalysisReport, AnalysisRequest, VoiceAnalyzer};
pub use share::ShareCard;
