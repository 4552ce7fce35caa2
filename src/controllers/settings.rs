use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    domain::settings::{SetApiKeyRequest, SettingsResponse, UpdateSettingsRequest},
    error::{AppError, AppResult},
    infrastructure::repositories::ConfigStore,
};

pub struct SettingsController {
    config: Arc<dyn ConfigStore>,
}

impl SettingsController {
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self { config }
    }

    async fn current(&self) -> AppResult<SettingsResponse> {
        let settings = self.config.load().await?;
        let api_key_set = self.config.api_key().await?.is_some();
        let install_id = self.config.install_id().await?;

        Ok(SettingsResponse {
            settings,
            api_key_set,
            install_id,
        })
    }

    /// GET /api/settings - Current settings, without the api key itself
    pub async fn get_settings(
        State(controller): State<Arc<SettingsController>>,
    ) -> AppResult<Json<SettingsResponse>> {
        Ok(Json(controller.current().await?))
    }

    /// PUT /api/settings - Update the provided fields
    pub async fn update_settings(
        State(controller): State<Arc<SettingsController>>,
        Json(request): Json<UpdateSettingsRequest>,
    ) -> AppResult<Json<SettingsResponse>> {
        let current = controller.config.load().await?;
        let updated = request.apply(current)?;
        controller.config.save(&updated).await?;

        tracing::info!(voice = %updated.voice.voice_name, "Settings updated");
        Ok(Json(controller.current().await?))
    }

    /// PUT /api/settings/api-key - Replace the synthesis api key
    pub async fn set_api_key(
        State(controller): State<Arc<SettingsController>>,
        Json(request): Json<SetApiKeyRequest>,
    ) -> AppResult<StatusCode> {
        if request.api_key.trim().is_empty() {
            return Err(AppError::BadRequest("API key cannot be empty".to_string()));
        }

        controller.config.set_api_key(&request.api_key).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
