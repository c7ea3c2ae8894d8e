use thiserror::Error;

/// Everything that can stop an analysis request.
///
/// All variants are terminal for the request: there is no partial result and
/// nothing worth retrying, since the pipeline never talks to the network.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Extension or container outside the supported set (wav, mp3).
    #[error("unsupported audio format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The file claimed a supported format but could not be decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// A required input was missing at the boundary.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Decoded audio is shorter than one usable analysis window.
    #[error("audio too short: {duration_secs:.2}s")]
    TooShort { duration_secs: f64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Fixed message shown to the end user. Never carries internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::UnsupportedFormat { .. } => {
                "This file format is not supported. Please use a WAV or MP3 file."
            }
            AnalysisError::Decode(_) => {
                "The audio file is damaged or could not be read. Please try a different file."
            }
            AnalysisError::Validation(_) => {
                "Please provide a name, an analysis purpose and an audio file."
            }
            AnalysisError::TooShort { .. } => {
                "There is a problem with the audio file. Please try a different file."
            }
            AnalysisError::Config(_) => {
                "An error occurred while processing the audio. Please check the file format and content."
            }
        }
    }
}

/// Message for failures that are not an [`AnalysisError`].
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred while processing the audio. Please check the file format and content.";

pub type Result<T> = std::result::Result<T, AnalysisError>;
