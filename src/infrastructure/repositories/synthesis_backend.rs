use crate::domain::synthesis::{SynthesisError, SynthesizeRequest, VoiceInfo};
use async_trait::async_trait;

/// Remote speech-synthesis provider.
/// Abstracts the HTTP contract of the backend (Google Cloud Text-to-Speech compatible)
///
/// Implementations are responsible for:
/// - Sending the request payload unchanged
/// - Mapping transport failures to `SynthesisError::Transport`
/// - Mapping non-success responses to `SynthesisError::Backend` with the backend's message
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Synthesize one request
    ///
    /// Returns the base64 `audioContent` field exactly as received
    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
        api_key: &str,
    ) -> Result<String, SynthesisError>;

    /// List the voices available to this api key
    async fn list_voices(&self, api_key: &str) -> Result<Vec<VoiceInfo>, SynthesisError>;
}
