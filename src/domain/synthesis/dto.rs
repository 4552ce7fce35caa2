use serde::{Deserialize, Serialize};

/// Body of `POST /v1beta1/text:synthesize`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest {
    pub audio_config: AudioConfigDto,
    pub voice: VoiceSelectionDto,
    pub input: SynthesisInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfigDto {
    pub audio_encoding: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects_profile_id: Vec<String>,
    pub pitch: f32,
    pub speaking_rate: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelectionDto {
    pub language_code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisInput {
    pub text: String,
}

/// Successful synthesis response; `audioContent` is base64
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    pub audio_content: String,
}

/// Failure envelope returned by the backend for non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A voice entry of `GET /v1beta1/voices`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    pub language_codes: Vec<String>,
    pub name: String,
    pub ssml_gender: String,
    pub natural_sample_rate_hertz: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicesResponse {
    #[serde(default)]
    pub voices: Vec<VoiceInfo>,
}
