use crate::domain::settings::{SettingsError, UserSettings};
use crate::domain::synthesis::VoiceConfig;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub type SettingsListener = Arc<dyn Fn() + Send + Sync>;

/// Source of user settings and per-install secrets.
///
/// Reads return the last written value; no transactional guarantees beyond that.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<UserSettings, SettingsError>;

    async fn save(&self, settings: &UserSettings) -> Result<(), SettingsError>;

    /// The configured api key, `None` when never set
    async fn api_key(&self) -> Result<Option<String>, SettingsError>;

    async fn set_api_key(&self, api_key: &str) -> Result<(), SettingsError>;

    /// Random id of this installation, created on first use
    async fn install_id(&self) -> Result<String, SettingsError>;

    async fn voice_config(&self) -> Result<VoiceConfig, SettingsError> {
        Ok(self.load().await?.voice)
    }

    /// Register a callback fired after every successful write
    fn on_change(&self, listener: SettingsListener);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredConfig {
    #[serde(default)]
    settings: UserSettings,
    #[serde(default)]
    local: LocalSection,
}

/// Values that never leave this machine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    install_id: Option<String>,
}

#[derive(Default)]
struct Listeners(Mutex<Vec<SettingsListener>>);

impl Listeners {
    fn add(&self, listener: SettingsListener) {
        self.0.lock().push(listener);
    }

    fn notify(&self) {
        let listeners = self.0.lock().clone();
        for listener in listeners {
            listener();
        }
    }
}

fn normalize_key(api_key: &str) -> Option<String> {
    let trimmed = api_key.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// JSON file with a `settings` section and a `local` section
pub struct FileConfigStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
    listeners: Listeners,
}

impl FileConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
            listeners: Listeners::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoredConfig, SettingsError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(|b| b.is_ascii_whitespace()) => Ok(StoredConfig::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, config: &StoredConfig) -> Result<(), SettingsError> {
        let json = serde_json::to_vec_pretty(config)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read-modify-write under the write lock
    async fn update<F>(&self, change: F) -> Result<StoredConfig, SettingsError>
    where
        F: FnOnce(&mut StoredConfig) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut config = self.read().await?;
        change(&mut config);
        self.write(&config).await?;
        Ok(config)
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<UserSettings, SettingsError> {
        Ok(self.read().await?.settings)
    }

    async fn save(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        let settings = settings.clone();
        self.update(move |config| config.settings = settings).await?;
        tracing::info!(path = %self.path.display(), "Settings saved");
        self.listeners.notify();
        Ok(())
    }

    async fn api_key(&self) -> Result<Option<String>, SettingsError> {
        Ok(self.read().await?.local.api_key)
    }

    async fn set_api_key(&self, api_key: &str) -> Result<(), SettingsError> {
        let api_key = normalize_key(api_key);
        self.update(move |config| config.local.api_key = api_key).await?;
        tracing::info!("API key updated");
        self.listeners.notify();
        Ok(())
    }

    async fn install_id(&self) -> Result<String, SettingsError> {
        if let Some(id) = self.read().await?.local.install_id {
            return Ok(id);
        }
        let config = self
            .update(|config| {
                config
                    .local
                    .install_id
                    .get_or_insert_with(|| Uuid::new_v4().to_string());
            })
            .await?;
        config
            .local
            .install_id
            .ok_or_else(|| SettingsError::Storage("install id was not persisted".to_string()))
    }

    fn on_change(&self, listener: SettingsListener) {
        self.listeners.add(listener);
    }
}

/// Process-local store, for tests and throwaway sessions
#[derive(Default)]
pub struct InMemoryConfigStore {
    config: Mutex<StoredConfig>,
    listeners: Listeners,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(api_key: &str) -> Self {
        let store = Self::default();
        store.config.lock().local.api_key = normalize_key(api_key);
        store
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn load(&self) -> Result<UserSettings, SettingsError> {
        Ok(self.config.lock().settings.clone())
    }

    async fn save(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        self.config.lock().settings = settings.clone();
        self.listeners.notify();
        Ok(())
    }

    async fn api_key(&self) -> Result<Option<String>, SettingsError> {
        Ok(self.config.lock().local.api_key.clone())
    }

    async fn set_api_key(&self, api_key: &str) -> Result<(), SettingsError> {
        self.config.lock().local.api_key = normalize_key(api_key);
        self.listeners.notify();
        Ok(())
    }

    async fn install_id(&self) -> Result<String, SettingsError> {
        Ok(self
            .config
            .lock()
            .local
            .install_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone())
    }

    fn on_change(&self, listener: SettingsListener) {
        self.listeners.add(listener);
    }
}
