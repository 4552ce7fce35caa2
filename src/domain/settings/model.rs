use crate::domain::synthesis::VoiceConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

pub const DEFAULT_SKIP_BACK_SECS: f32 = 0.5;
pub const DEFAULT_TEST_TEXT: &str = "Testing: 1,2,3";

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub voice: VoiceConfig,
    /// Seconds replayed when resuming from pause
    pub skip_back_on_unpause: f32,
    pub test_text: String,
    pub quota_size_warnings: bool,
    pub quota_stop_at_size_wave: u64,
    pub quota_stop_at_size_std: u64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            voice: VoiceConfig::default(),
            skip_back_on_unpause: DEFAULT_SKIP_BACK_SECS,
            test_text: DEFAULT_TEST_TEXT.to_string(),
            quota_size_warnings: true,
            quota_stop_at_size_wave: 1_000_000,
            quota_stop_at_size_std: 4_000_000,
        }
    }
}

impl UserSettings {
    pub fn skip_back(&self) -> Duration {
        if self.skip_back_on_unpause.is_finite() && self.skip_back_on_unpause > 0.0 {
            Duration::from_secs_f32(self.skip_back_on_unpause)
        } else {
            Duration::ZERO
        }
    }
}

/// Stable, non-reversible identifier of an api key (hex sha256)
pub fn api_key_fingerprint(api_key: &str) -> String {
    format!("{:x}", Sha256::digest(api_key.as_bytes()))
}
