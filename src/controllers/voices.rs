use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    domain::playback::PlaybackError,
    domain::synthesis::{VoiceCatalogService, VoiceInfo},
    error::AppResult,
    infrastructure::repositories::ConfigStore,
};

/// Query for GET /api/voices; list filters are comma separated
#[derive(Debug, Default, Deserialize)]
pub struct VoicesQuery {
    #[serde(default)]
    pub refresh: bool,
    pub lang: Option<String>,
    pub model: Option<String>,
    pub gender: Option<String>,
}

/// Response for GET /api/voices
#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceListResponse {
    pub voices: Vec<VoiceInfo>,
    /// Every language prefix in the catalog, before filtering
    pub languages: Vec<String>,
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub struct VoicesController {
    catalog: Arc<VoiceCatalogService>,
    config: Arc<dyn ConfigStore>,
}

impl VoicesController {
    pub fn new(catalog: Arc<VoiceCatalogService>, config: Arc<dyn ConfigStore>) -> Self {
        Self { catalog, config }
    }

    /// GET /api/voices - List voices offered for the configured api key
    pub async fn list_voices(
        State(controller): State<Arc<VoicesController>>,
        Query(query): Query<VoicesQuery>,
    ) -> AppResult<Json<VoiceListResponse>> {
        let api_key = controller
            .config
            .api_key()
            .await?
            .ok_or(PlaybackError::MissingApiKey)?;

        let catalog = controller.catalog.catalog(&api_key, query.refresh).await?;

        let voices = catalog.filter(
            &split_list(query.lang.as_deref()),
            &split_list(query.model.as_deref()),
            &split_list(query.gender.as_deref()),
        );

        Ok(Json(VoiceListResponse {
            voices,
            languages: catalog.languages(),
        }))
    }
}
