use crate::error::AppError;

/// Failures of a single synthesis round trip.
///
/// Cloneable so one inflight fetch result can be observed by several waiters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid voice name: '{0}'")]
    InvalidVoice(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        SynthesisError::Transport(err.to_string())
    }
}

impl From<SynthesisError> for AppError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::InvalidVoice(_) => AppError::BadRequest(err.to_string()),
            _ => AppError::ExternalService(err.to_string()),
        }
    }
}
