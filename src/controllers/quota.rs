use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    domain::quota::QuotaReport,
    error::AppResult,
    infrastructure::repositories::{ConfigStore, QuotaMeter},
};

pub struct QuotaController {
    quota: Arc<dyn QuotaMeter>,
    config: Arc<dyn ConfigStore>,
}

impl QuotaController {
    pub fn new(quota: Arc<dyn QuotaMeter>, config: Arc<dyn ConfigStore>) -> Self {
        Self { quota, config }
    }

    async fn report(&self) -> AppResult<QuotaReport> {
        let totals = self.quota.totals().await?;
        let settings = self.config.load().await?;
        Ok(QuotaReport::new(totals, &settings))
    }

    /// GET /api/quota - Characters billed since the last reset, with warning levels
    pub async fn get_quota(
        State(controller): State<Arc<QuotaController>>,
    ) -> AppResult<Json<QuotaReport>> {
        Ok(Json(controller.report().await?))
    }

    /// POST /api/quota/reset - Start counting from zero for the current api key
    pub async fn reset_quota(
        State(controller): State<Arc<QuotaController>>,
    ) -> AppResult<Json<QuotaReport>> {
        controller.quota.reset().await?;
        tracing::info!("Quota counters reset");
        Ok(Json(controller.report().await?))
    }
}
