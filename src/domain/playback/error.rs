use crate::domain::settings::SettingsError;
use crate::domain::synthesis::SynthesisError;
use crate::error::AppError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error("audio output error: {0}")]
    Output(String),
    #[error("settings error: {0}")]
    Settings(String),
    #[error("API key not set")]
    MissingApiKey,
}

impl From<SettingsError> for PlaybackError {
    fn from(err: SettingsError) -> Self {
        PlaybackError::Settings(err.to_string())
    }
}

impl From<PlaybackError> for AppError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Synthesis(e) => e.into(),
            PlaybackError::MissingApiKey => AppError::BadRequest(err.to_string()),
            PlaybackError::Output(_) | PlaybackError::Settings(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
