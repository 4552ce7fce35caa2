use crate::domain::synthesis::SynthesisError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings storage error: {0}")]
    Storage(String),
    #[error("malformed settings: {0}")]
    Malformed(String),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Malformed(err.to_string())
    }
}

impl From<SynthesisError> for SettingsError {
    fn from(err: SynthesisError) -> Self {
        SettingsError::Invalid(err.to_string())
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Invalid(msg) => AppError::BadRequest(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}
