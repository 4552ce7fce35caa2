use anyhow::Result;
use axum::Router;
use cloudspeak::controllers::{
    playback::PlaybackController, quota::QuotaController, settings::SettingsController,
    voices::VoicesController,
};
use cloudspeak::domain::playback::{SessionDeps, SessionOptions, SpeechSession};
use cloudspeak::domain::synthesis::{AudioEncoding, SynthesisClient, VoiceCatalogService};
use cloudspeak::infrastructure::audio::{AudioOutputFactory, RodioDecoder, SimulatedOutputFactory};
use cloudspeak::infrastructure::db::{create_pool, run_migrations};
use cloudspeak::infrastructure::http::{create_router, Controllers};
use cloudspeak::infrastructure::repositories::{
    ConfigStore, FileConfigStore, GoogleTtsRepository, SqliteQuotaMeter,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;
pub mod fake_google;

use api_client::TestClient;
use fake_google::{FakeGoogle, TEST_API_KEY};

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestContext {
    pub client: TestClient,
    pub google: FakeGoogle,
    pub output: SimulatedOutputFactory,
    pub config_store: Arc<dyn ConfigStore>,
    _dir: TempDir,
}

impl TestContext {
    /// Context whose settings already hold a valid api key
    pub async fn new() -> Result<Self> {
        Self::with_api_key(Some(TEST_API_KEY)).await
    }

    pub async fn with_api_key(api_key: Option<&str>) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let database_url = format!("sqlite://{}?mode=rwc", dir.path().join("quota.db").display());

        let pool = Arc::new(create_pool(&database_url).await?);
        run_migrations(&pool).await?;

        let config_store: Arc<dyn ConfigStore> =
            Arc::new(FileConfigStore::new(dir.path().join("settings.json")));
        let mut settings = config_store.load().await?;
        settings.voice.audio_encoding = AudioEncoding::Linear16;
        config_store.save(&settings).await?;
        if let Some(api_key) = api_key {
            config_store.set_api_key(api_key).await?;
        }

        let google = FakeGoogle::start().await?;
        let output = SimulatedOutputFactory::new();

        let app = create_app(pool, config_store.clone(), &google, output.clone())?;

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to be ready
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(Self {
            client: TestClient::new(&base_url),
            google,
            output,
            config_store,
            _dir: dir,
        })
    }

    /// Poll GET /api/state until it reports `expected`
    pub async fn wait_for_state(&self, expected: &str) -> Value {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        loop {
            let response = self.client.get("/api/state").await.unwrap();
            let body = response.body.clone().unwrap();
            if body.get("state").and_then(|v| v.as_str()) == Some(expected) {
                return body;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "Timed out waiting for state {}, last seen {:?}",
                expected,
                body
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Poll until `condition` holds
    pub async fn wait_until<F: Fn(&Self) -> bool>(&self, what: &str, condition: F) {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        while !condition(self) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "Timed out waiting until {}",
                what
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            TestContext::new()
                .await
                .expect("Failed to create test context")
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // The temporary directory is removed when dropped
        }
    }
}

fn create_app(
    pool: Arc<cloudspeak::infrastructure::db::DbPool>,
    config_store: Arc<dyn ConfigStore>,
    google: &FakeGoogle,
    output: SimulatedOutputFactory,
) -> Result<Router> {
    let quota = Arc::new(SqliteQuotaMeter::new(pool.clone(), config_store.clone()));
    let backend = Arc::new(GoogleTtsRepository::new(
        google.base_url.clone(),
        Some(Duration::from_secs(5)),
    )?);
    let output: Arc<dyn AudioOutputFactory> = Arc::new(output);

    let client = Arc::new(SynthesisClient::new(backend, Arc::new(RodioDecoder::new())));
    let catalog = Arc::new(VoiceCatalogService::new(client.clone(), true));
    let invalidated = catalog.clone();
    config_store.on_change(Arc::new(move || invalidated.invalidate_all()));

    let session = SpeechSession::new(
        SessionDeps {
            client,
            config: config_store.clone(),
            quota: quota.clone(),
            output: output.clone(),
        },
        SessionOptions::default(),
    );

    let controllers = Controllers {
        playback: Arc::new(PlaybackController::new(session)),
        voices: Arc::new(VoicesController::new(catalog, config_store.clone())),
        quota: Arc::new(QuotaController::new(quota, config_store.clone())),
        settings: Arc::new(SettingsController::new(config_store)),
    };

    Ok(create_router(pool, output, controllers))
}

/// Text the segmenter splits into `count` segments, one per paragraph
pub fn paragraphs(count: usize) -> String {
    (0..count)
        .map(|i| format!("Paragraph {} {}", i, "word ".repeat(60).trim_end()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
