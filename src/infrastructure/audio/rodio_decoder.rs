use super::AudioDecoder;
use crate::domain::synthesis::{DecodedAudio, SynthesisError};
use rodio::{Decoder, Source};
use std::io::Cursor;

/// Decodes mp3 / wav payloads with rodio's symphonia-backed decoder
#[derive(Debug, Default, Clone)]
pub struct RodioDecoder;

impl RodioDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for RodioDecoder {
    fn decode(&self, encoded: &[u8]) -> Result<DecodedAudio, SynthesisError> {
        if encoded.is_empty() {
            return Err(SynthesisError::Decode("empty audio payload".to_string()));
        }

        let cursor = Cursor::new(encoded.to_vec());
        let decoder = Decoder::new(cursor)
            .map_err(|e| SynthesisError::Decode(format!("unsupported audio payload: {}", e)))?;

        let channels: u16 = decoder.channels().into();
        let sample_rate: u32 = decoder.sample_rate().into();
        if channels == 0 || sample_rate == 0 {
            return Err(SynthesisError::Decode(format!(
                "invalid stream parameters: {} channels at {} Hz",
                channels, sample_rate
            )));
        }

        let samples: Vec<f32> = decoder.collect();

        tracing::debug!(
            channels = channels,
            sample_rate = sample_rate,
            sample_count = samples.len(),
            "Audio payload decoded"
        );

        Ok(DecodedAudio::new(channels, sample_rate, samples))
    }
}
