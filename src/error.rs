use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed or truncated container, unexpected chunk marker, or a
    /// fixed-width integer read that ran off the buffer.
    #[error("Invalid WAV container: {0}")]
    Format(String),

    /// No complete sample stride after downmix.
    #[error("No usable audio samples")]
    EmptyInput,

    #[error("Invalid analysis config: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    pub fn format(msg: impl Into<String>) -> Self {
        AnalysisError::Format(msg.into())
    }
}
