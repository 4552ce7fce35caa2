use super::dto::{AudioConfigDto, SynthesisInput, SynthesizeRequest, VoiceSelectionDto};
use super::error::SynthesisError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VOICE_NAME: &str = "en-US-Wavenet-A";

/// Audio encodings accepted by the synthesis backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    #[serde(rename = "MP3_32_KBPS")]
    Mp3_32,
    #[serde(rename = "MP3_64_KBPS")]
    Mp3_64,
    #[serde(rename = "MP3")]
    Mp3,
    #[serde(rename = "LINEAR16")]
    Linear16,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3_32 => "MP3_32_KBPS",
            AudioEncoding::Mp3_64 => "MP3_64_KBPS",
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::Linear16 => "LINEAR16",
        }
    }
}

/// Device classes the backend can post-process audio for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectsProfile {
    #[serde(rename = "wearable-class-device")]
    Wearable,
    #[serde(rename = "handset-class-device")]
    Handset,
    #[serde(rename = "headphone-class-device")]
    Headphone,
    #[serde(rename = "small-bluetooth-speaker-class-device")]
    SmallSpeakers,
    #[serde(rename = "medium-bluetooth-speaker-class-device")]
    MediumSpeakers,
    #[serde(rename = "large-home-entertainment-class-device")]
    LargeSpeakers,
    #[serde(rename = "large-automotive-class-device")]
    Automotive,
    #[serde(rename = "telephony-class-application")]
    Telephony,
}

impl EffectsProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectsProfile::Wearable => "wearable-class-device",
            EffectsProfile::Handset => "handset-class-device",
            EffectsProfile::Headphone => "headphone-class-device",
            EffectsProfile::SmallSpeakers => "small-bluetooth-speaker-class-device",
            EffectsProfile::MediumSpeakers => "medium-bluetooth-speaker-class-device",
            EffectsProfile::LargeSpeakers => "large-home-entertainment-class-device",
            EffectsProfile::Automotive => "large-automotive-class-device",
            EffectsProfile::Telephony => "telephony-class-application",
        }
    }
}

/// Billing class of a voice, used by the quota meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceModelClass {
    Standard,
    PremiumWave,
}

impl VoiceModelClass {
    /// Anything that is not explicitly a `Standard` model bills as premium
    pub fn from_voice_name(name: &str) -> Self {
        match VoiceName::parse(name) {
            Ok(parsed) if parsed.model.eq_ignore_ascii_case("standard") => {
                VoiceModelClass::Standard
            }
            _ => VoiceModelClass::PremiumWave,
        }
    }
}

/// Parsed form of a voice id such as `de-DE-Wavenet-F`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceName {
    pub lang: String,
    pub language_code: String,
    pub model: String,
    pub variant: String,
}

impl VoiceName {
    pub fn parse(name: &str) -> Result<Self, SynthesisError> {
        let parts: Vec<&str> = name.split('-').collect();
        if parts.len() < 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(SynthesisError::InvalidVoice(name.to_string()));
        }

        let lang = parts[0].to_lowercase();
        let model = capitalize(parts[2]);
        Ok(Self {
            language_code: format!("{}-{}", lang, parts[1].to_uppercase()),
            lang,
            model,
            variant: parts[3..].join("-").to_uppercase(),
        })
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Voice and audio parameters sent with every synthesis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub language_code: String,
    pub voice_name: String,
    pub audio_encoding: AudioEncoding,
    pub effects_profile: EffectsProfile,
    pub pitch: f32,
    pub speaking_rate: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            voice_name: DEFAULT_VOICE_NAME.to_string(),
            audio_encoding: AudioEncoding::Mp3_64,
            effects_profile: EffectsProfile::MediumSpeakers,
            pitch: 0.0,
            speaking_rate: 1.0,
        }
    }
}

impl VoiceConfig {
    /// Switch voices, keeping the language code derived from the voice id
    pub fn with_voice_name(mut self, name: &str) -> Result<Self, SynthesisError> {
        let parsed = VoiceName::parse(name)?;
        self.language_code = parsed.language_code;
        self.voice_name = name.to_string();
        Ok(self)
    }

    pub fn model_class(&self) -> VoiceModelClass {
        VoiceModelClass::from_voice_name(&self.voice_name)
    }

    /// Build the wire payload for a single segment
    pub fn to_request(&self, text: &str) -> SynthesizeRequest {
        SynthesizeRequest {
            audio_config: AudioConfigDto {
                audio_encoding: self.audio_encoding.as_str().to_string(),
                effects_profile_id: vec![self.effects_profile.as_str().to_string()],
                pitch: self.pitch,
                speaking_rate: self.speaking_rate,
            },
            voice: VoiceSelectionDto {
                language_code: self.language_code.clone(),
                name: self.voice_name.clone(),
            },
            input: SynthesisInput {
                text: text.to_string(),
            },
        }
    }
}
