use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::audio::AudioOutputFactory;
use crate::infrastructure::db::{check_connection, DbPool};

pub type HealthState = (Arc<DbPool>, Arc<dyn AudioOutputFactory>);

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State((pool, output)): State<HealthState>) -> impl IntoResponse {
    match check_connection(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "connected",
                "audio_output": output.kind()
            })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "database": "disconnected",
                "audio_output": output.kind()
            })),
        ),
    }
}
