use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use cloudspeak::controllers::{
    playback::PlaybackController, quota::QuotaController, settings::SettingsController,
    voices::VoicesController,
};
use cloudspeak::domain::playback::{SessionDeps, SessionOptions, SpeechSession};
use cloudspeak::domain::synthesis::{SynthesisClient, VoiceCatalogService};
use cloudspeak::infrastructure::audio::{
    AudioOutputFactory, RodioDecoder, RodioOutputFactory, SimulatedOutputFactory,
};
use cloudspeak::infrastructure::config::{AudioOutputKind, Config, LogFormat};
use cloudspeak::infrastructure::db::{check_connection, create_pool, run_migrations};
use cloudspeak::infrastructure::http::{start_http_server, Controllers};
use cloudspeak::infrastructure::repositories::{
    ConfigStore, FileConfigStore, GoogleTtsRepository, SqliteQuotaMeter,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting cloudspeak control server on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    run_migrations(&pool).await?;
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Settings store, seeded with the environment api key when none is stored yet
    tracing::info!(path = %config.settings_path.display(), "Opening settings store");
    let config_store: Arc<dyn ConfigStore> = Arc::new(FileConfigStore::new(&config.settings_path));
    if let Some(api_key) = &config.tts_api_key {
        if config_store.api_key().await?.is_none() {
            config_store.set_api_key(api_key).await?;
            tracing::info!("API key seeded from environment");
        }
    }

    // 2. Repositories and audio devices
    tracing::info!("Instantiating repositories...");
    let quota = Arc::new(SqliteQuotaMeter::new(pool.clone(), config_store.clone()));
    let backend = Arc::new(GoogleTtsRepository::new(
        config.tts_base_url.clone(),
        config.synthesis_timeout(),
    )?);
    let output: Arc<dyn AudioOutputFactory> = match config.audio_output {
        AudioOutputKind::Device => Arc::new(RodioOutputFactory::new()),
        AudioOutputKind::Simulated => Arc::new(SimulatedOutputFactory::new()),
    };
    tracing::info!(audio_output = output.kind(), "Audio output selected");

    // 3. Services
    tracing::info!("Instantiating services...");
    let client = Arc::new(SynthesisClient::new(backend, Arc::new(RodioDecoder::new())));
    let catalog = Arc::new(VoiceCatalogService::new(
        client.clone(),
        config.voice_catalog_cache_enabled,
    ));
    let invalidated = catalog.clone();
    config_store.on_change(Arc::new(move || invalidated.invalidate_all()));

    let session = SpeechSession::new(
        SessionDeps {
            client,
            config: config_store.clone(),
            quota: quota.clone(),
            output: output.clone(),
        },
        SessionOptions {
            max_resident_buffers: config.max_resident_buffers,
        },
    );
    session.on_state_change(|state| tracing::info!(state = %state, "Playback state changed"));

    // 4. Controllers
    tracing::info!("Instantiating controllers...");
    let controllers = Controllers {
        playback: Arc::new(PlaybackController::new(session)),
        voices: Arc::new(VoicesController::new(catalog, config_store.clone())),
        quota: Arc::new(QuotaController::new(quota, config_store.clone())),
        settings: Arc::new(SettingsController::new(config_store)),
    };

    // Start HTTP server with all routes
    start_http_server(config, pool, output, controllers).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "cloudspeak=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "cloudspeak=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
