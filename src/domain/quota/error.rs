use crate::domain::settings::SettingsError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl From<QuotaError> for AppError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::Database(e) => AppError::Database(e),
            QuotaError::Settings(e) => e.into(),
        }
    }
}
