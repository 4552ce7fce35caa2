use super::{DecodedAudio, SynthesisError, SynthesizeRequest, VoiceInfo};
use crate::infrastructure::audio::AudioDecoder;
use crate::infrastructure::repositories::SynthesisBackend;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use std::time::Duration;

/// Scripted synthesis backend: echoes the segment text back as the "audio" payload
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<(SynthesizeRequest, String)>>,
    voice_calls: Mutex<usize>,
    delay: Mutex<Duration>,
    failures: Mutex<Vec<(String, SynthesisError)>>,
    raw: Mutex<Option<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        let backend = Self::default();
        *backend.delay.lock() = delay;
        backend
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn fail_when_text_contains(&self, needle: &str, error: SynthesisError) {
        self.failures.lock().push((needle.to_string(), error));
    }

    pub fn respond_with_raw(&self, payload: &str) {
        *self.raw.lock() = Some(payload.to_string());
    }

    /// Every synthesize request with the api key it carried
    pub fn calls(&self) -> Vec<(SynthesizeRequest, String)> {
        self.calls.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|(request, _)| request.input.text.clone())
            .collect()
    }

    pub fn voice_calls(&self) -> usize {
        *self.voice_calls.lock()
    }
}

pub fn sample_voices() -> Vec<VoiceInfo> {
    ["fr-FR-Wavenet-C", "en-US-Wavenet-A", "en-GB-Standard-A"]
        .iter()
        .map(|name| VoiceInfo {
            language_codes: vec![name[..5].to_string()],
            name: name.to_string(),
            ssml_gender: "FEMALE".to_string(),
            natural_sample_rate_hertz: 24000,
        })
        .collect()
}

#[async_trait]
impl SynthesisBackend for FakeBackend {
    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
        api_key: &str,
    ) -> Result<String, SynthesisError> {
        self.calls
            .lock()
            .push((request.clone(), api_key.to_string()));

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .lock()
            .iter()
            .find(|(needle, _)| request.input.text.contains(needle.as_str()))
            .map(|(_, error)| error.clone());
        if let Some(error) = failure {
            return Err(error);
        }

        if let Some(raw) = self.raw.lock().clone() {
            return Ok(raw);
        }
        Ok(STANDARD.encode(request.input.text.as_bytes()))
    }

    async fn list_voices(&self, _api_key: &str) -> Result<Vec<VoiceInfo>, SynthesisError> {
        *self.voice_calls.lock() += 1;
        Ok(sample_voices())
    }
}

/// Produces silence of a fixed duration for any payload except `undecodable`
pub struct FakeDecoder {
    duration: Duration,
}

impl FakeDecoder {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl AudioDecoder for FakeDecoder {
    fn decode(&self, encoded: &[u8]) -> Result<DecodedAudio, SynthesisError> {
        if encoded == b"undecodable" {
            return Err(SynthesisError::Decode("unsupported audio payload".to_string()));
        }
        let frames = self.duration.as_millis() as usize;
        Ok(DecodedAudio::new(1, 1000, vec![0.0; frames]))
    }
}
