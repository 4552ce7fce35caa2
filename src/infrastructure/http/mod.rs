pub mod request_id;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::controllers::{
    health,
    playback::PlaybackController,
    quota::QuotaController,
    settings::SettingsController,
    voices::VoicesController,
};
use crate::infrastructure::audio::AudioOutputFactory;
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;

/// Controllers served by the control API
#[derive(Clone)]
pub struct Controllers {
    pub playback: Arc<PlaybackController>,
    pub voices: Arc<VoicesController>,
    pub quota: Arc<QuotaController>,
    pub settings: Arc<SettingsController>,
}

/// Build the control API router with all routes and layers
pub fn create_router(
    pool: Arc<DbPool>,
    output: Arc<dyn AudioOutputFactory>,
    controllers: Controllers,
) -> Router {
    let playback_routes = Router::new()
        .route("/api/speak", post(PlaybackController::speak))
        .route("/api/play", post(PlaybackController::play))
        .route("/api/pause", post(PlaybackController::pause))
        .route("/api/resume", post(PlaybackController::resume))
        .route("/api/stop", post(PlaybackController::stop))
        .route("/api/test-sound", post(PlaybackController::test_sound))
        .route("/api/state", get(PlaybackController::state))
        .with_state(controllers.playback);

    let voice_routes = Router::new()
        .route("/api/voices", get(VoicesController::list_voices))
        .with_state(controllers.voices);

    let quota_routes = Router::new()
        .route("/api/quota", get(QuotaController::get_quota))
        .route("/api/quota/reset", post(QuotaController::reset_quota))
        .with_state(controllers.quota);

    let settings_routes = Router::new()
        .route(
            "/api/settings",
            get(SettingsController::get_settings).put(SettingsController::update_settings),
        )
        .route("/api/settings/api-key", put(SettingsController::set_api_key))
        .with_state(controllers.settings);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state((pool, output))
        .merge(playback_routes)
        .merge(voice_routes)
        .merge(quota_routes)
        .merge(settings_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    pool: Arc<DbPool>,
    output: Arc<dyn AudioOutputFactory>,
    controllers: Controllers,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(pool, output, controllers);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
