use crate::domain::playback::DEFAULT_MAX_RESIDENT_BUFFERS;
use crate::infrastructure::repositories::google_tts_repository::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub settings_path: PathBuf,
    /// Seeds the stored api key when none is configured yet
    pub tts_api_key: Option<String>,
    pub tts_base_url: String,
    pub synthesis_timeout_secs: u64,
    pub audio_output: AudioOutputKind,
    pub max_resident_buffers: usize,
    pub voice_catalog_cache_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AudioOutputKind {
    Device,
    Simulated,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://cloudspeak.db?mode=rwc".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8711,
            log_format: LogFormat::Pretty,
            settings_path: PathBuf::from("cloudspeak-settings.json"),
            tts_api_key: None,
            tts_base_url: DEFAULT_BASE_URL.to_string(),
            synthesis_timeout_secs: 30,
            audio_output: AudioOutputKind::Device,
            max_resident_buffers: DEFAULT_MAX_RESIDENT_BUFFERS,
            voice_catalog_cache_enabled: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let config = Config {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            settings_path: env::var("SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
            tts_api_key: env::var("TTS_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            tts_base_url: env::var("TTS_BASE_URL").unwrap_or(defaults.tts_base_url),
            synthesis_timeout_secs: env::var("SYNTHESIS_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.synthesis_timeout_secs.to_string())
                .parse()?,
            audio_output: match env::var("AUDIO_OUTPUT")
                .unwrap_or_else(|_| "device".to_string())
                .to_lowercase()
                .as_str()
            {
                "simulated" => AudioOutputKind::Simulated,
                _ => AudioOutputKind::Device,
            },
            max_resident_buffers: env::var("MAX_RESIDENT_BUFFERS")
                .unwrap_or_else(|_| defaults.max_resident_buffers.to_string())
                .parse()?,
            voice_catalog_cache_enabled: env::var("VOICE_CATALOG_CACHE_ENABLED")
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(defaults.voice_catalog_cache_enabled),
        };

        Ok(config)
    }

    /// `None` when the timeout is disabled with 0
    pub fn synthesis_timeout(&self) -> Option<Duration> {
        (self.synthesis_timeout_secs > 0).then(|| Duration::from_secs(self.synthesis_timeout_secs))
    }
}
