use super::error::SettingsError;
use super::model::UserSettings;
use crate::domain::synthesis::{AudioEncoding, EffectsProfile};
use serde::{Deserialize, Serialize};

const PITCH_RANGE: (f32, f32) = (-20.0, 20.0);
const SPEAKING_RATE_RANGE: (f32, f32) = (0.25, 4.0);
const SKIP_BACK_RANGE: (f32, f32) = (0.0, 10.0);

/// Response for GET /api/settings
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: UserSettings,
    pub api_key_set: bool,
    pub install_id: String,
}

/// Request for PUT /api/settings; absent fields are left unchanged
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_encoding: Option<AudioEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects_profile: Option<EffectsProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaking_rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_back_on_unpause: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_size_warnings: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_stop_at_size_wave: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_stop_at_size_std: Option<u64>,
}

/// Request for PUT /api/settings/api-key
#[derive(Debug, Serialize, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

fn check_range(name: &str, value: f32, (min, max): (f32, f32)) -> Result<f32, SettingsError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(SettingsError::Invalid(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

impl UpdateSettingsRequest {
    /// Merge into `current`, validating every provided field
    pub fn apply(self, current: UserSettings) -> Result<UserSettings, SettingsError> {
        let mut settings = current;

        if let Some(name) = self.voice_name {
            settings.voice = settings.voice.with_voice_name(name.trim())?;
        }
        if let Some(encoding) = self.audio_encoding {
            settings.voice.audio_encoding = encoding;
        }
        if let Some(profile) = self.effects_profile {
            settings.voice.effects_profile = profile;
        }
        if let Some(pitch) = self.pitch {
            settings.voice.pitch = check_range("pitch", pitch, PITCH_RANGE)?;
        }
        if let Some(rate) = self.speaking_rate {
            settings.voice.speaking_rate = check_range("speaking_rate", rate, SPEAKING_RATE_RANGE)?;
        }
        if let Some(skip_back) = self.skip_back_on_unpause {
            settings.skip_back_on_unpause =
                check_range("skip_back_on_unpause", skip_back, SKIP_BACK_RANGE)?;
        }
        if let Some(text) = self.test_text {
            if text.trim().is_empty() {
                return Err(SettingsError::Invalid("test_text cannot be empty".to_string()));
            }
            settings.test_text = text;
        }
        if let Some(warnings) = self.quota_size_warnings {
            settings.quota_size_warnings = warnings;
        }
        if let Some(limit) = self.quota_stop_at_size_wave {
            settings.quota_stop_at_size_wave = limit;
        }
        if let Some(limit) = self.quota_stop_at_size_std {
            settings.quota_stop_at_size_std = limit;
        }

        Ok(settings)
    }
}
