use super::synthesis_backend::SynthesisBackend;
use crate::domain::synthesis::{
    ErrorEnvelope, SynthesisError, SynthesizeRequest, SynthesizeResponse, VoiceInfo, VoicesResponse,
};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Google Cloud Text-to-Speech (v1beta1 REST) implementation of the synthesis backend
pub struct GoogleTtsRepository {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleTtsRepository {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self, SynthesisError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Turn a non-success response into a backend error carrying the provider's message
    async fn backend_error(response: reqwest::Response) -> SynthesisError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };

        SynthesisError::Backend {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl SynthesisBackend for GoogleTtsRepository {
    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
        api_key: &str,
    ) -> Result<String, SynthesisError> {
        let url = format!("{}/v1beta1/text:synthesize", self.base_url);

        tracing::debug!(
            voice = %request.voice.name,
            encoding = %request.audio_config.audio_encoding,
            text_length = request.input.text.len(),
            "Calling synthesis backend"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Synthesis request failed to send");
                SynthesisError::from(e)
            })?;

        if !response.status().is_success() {
            let err = Self::backend_error(response).await;
            tracing::error!(error = %err, "Synthesis backend returned an error");
            return Err(err);
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Decode(format!("malformed synthesis response: {}", e)))?;

        Ok(body.audio_content)
    }

    async fn list_voices(&self, api_key: &str) -> Result<Vec<VoiceInfo>, SynthesisError> {
        let url = format!("{}/v1beta1/voices", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("key", api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        let body: VoicesResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Decode(format!("malformed voices response: {}", e)))?;

        tracing::info!(voice_count = body.voices.len(), "Voice list fetched");

        Ok(body.voices)
    }
}
