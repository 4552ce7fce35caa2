use super::state::PlaybackState;
use serde::{Deserialize, Serialize};

/// Request for POST /api/speak
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    /// Treat `text` as an HTML fragment and speak its visible text
    #[serde(default)]
    pub html: bool,
}

/// Response for GET /api/state and every playback command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    pub state: PlaybackState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
