use super::error::SynthesisError;
use super::model::{DecodedAudioBuffer, VoiceCatalog};
use super::voice::VoiceConfig;
use crate::domain::playback::TextSegment;
use crate::infrastructure::audio::AudioDecoder;
use crate::infrastructure::repositories::SynthesisBackend;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use std::time::Instant;

/// One synthesis round trip per segment: the remote call, then base64 and PCM decoding
pub struct SynthesisClient {
    backend: Arc<dyn SynthesisBackend>,
    decoder: Arc<dyn AudioDecoder>,
}

impl SynthesisClient {
    pub fn new(backend: Arc<dyn SynthesisBackend>, decoder: Arc<dyn AudioDecoder>) -> Self {
        Self { backend, decoder }
    }

    pub async fn fetch_audio(
        &self,
        segment: &TextSegment,
        voice: &VoiceConfig,
        api_key: &str,
    ) -> Result<DecodedAudioBuffer, SynthesisError> {
        let encoded = self.request_audio(segment, voice, api_key).await?;
        self.decode_audio(segment, &encoded).await
    }

    /// Send one segment to the backend and return its base64 audio payload
    pub async fn request_audio(
        &self,
        segment: &TextSegment,
        voice: &VoiceConfig,
        api_key: &str,
    ) -> Result<String, SynthesisError> {
        let started = Instant::now();
        let request = voice.to_request(&segment.text);

        let encoded = self.backend.synthesize(&request, api_key).await?;
        tracing::debug!(
            segment_index = segment.index,
            latency_ms = started.elapsed().as_millis() as u64,
            "Segment audio received"
        );
        Ok(encoded)
    }

    /// Turn a backend payload into a playable buffer for `segment`
    pub async fn decode_audio(
        &self,
        segment: &TextSegment,
        encoded: &str,
    ) -> Result<DecodedAudioBuffer, SynthesisError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SynthesisError::Decode(format!("invalid base64 audio content: {}", e)))?;

        // Decoding is CPU bound, keep it off the async workers
        let decoder = self.decoder.clone();
        let audio = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| SynthesisError::Decode(format!("decoder task failed: {}", e)))??;

        let billed_chars = segment.char_count();
        tracing::info!(
            segment_index = segment.index,
            billed_chars = billed_chars,
            audio_ms = audio.duration().as_millis() as u64,
            "Segment synthesized"
        );

        Ok(DecodedAudioBuffer::new(segment.clone(), audio, billed_chars))
    }

    pub async fn fetch_voice_catalog(&self, api_key: &str) -> Result<VoiceCatalog, SynthesisError> {
        let voices = self.backend.list_voices(api_key).await?;
        Ok(VoiceCatalog::new(voices))
    }
}
