use super::dto::VoiceInfo;
use super::voice::VoiceName;
use crate::domain::playback::TextSegment;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Interleaved PCM produced by the audio decoder
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            channels,
            sample_rate,
            samples: samples.into(),
        }
    }

    pub fn duration(&self) -> Duration {
        if self.channels == 0 || self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }
}

/// Playable audio for exactly one text segment
#[derive(Debug, Clone)]
pub struct DecodedAudioBuffer {
    segment: TextSegment,
    audio: DecodedAudio,
    billed_chars: usize,
}

impl DecodedAudioBuffer {
    pub fn new(segment: TextSegment, audio: DecodedAudio, billed_chars: usize) -> Self {
        Self {
            segment,
            audio,
            billed_chars,
        }
    }

    pub fn segment(&self) -> &TextSegment {
        &self.segment
    }

    pub fn segment_index(&self) -> usize {
        self.segment.index
    }

    pub fn audio(&self) -> &DecodedAudio {
        &self.audio
    }

    pub fn billed_chars(&self) -> usize {
        self.billed_chars
    }

    pub fn duration(&self) -> Duration {
        self.audio.duration()
    }
}

/// Voices offered by the backend, sorted by name then gender
#[derive(Debug, Clone, Default, Serialize)]
pub struct VoiceCatalog {
    pub voices: Vec<VoiceInfo>,
}

impl VoiceCatalog {
    pub fn new(mut voices: Vec<VoiceInfo>) -> Self {
        voices.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.ssml_gender.cmp(&b.ssml_gender))
        });
        Self { voices }
    }

    /// Distinct language prefixes (`en`, `fr`, ...) present in the catalog
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self
            .voices
            .iter()
            .filter_map(|v| v.language_codes.first())
            .filter_map(|code| code.split('-').next())
            .map(|lang| lang.to_lowercase())
            .collect();
        langs.sort();
        langs.dedup();
        langs
    }

    /// Filter voices; an empty restriction list matches everything
    pub fn filter(&self, langs: &[String], models: &[String], genders: &[String]) -> Vec<VoiceInfo> {
        let matches = |allowed: &[String], value: &str| {
            allowed.is_empty() || allowed.iter().any(|a| a.eq_ignore_ascii_case(value))
        };

        self.voices
            .iter()
            .filter(|voice| match VoiceName::parse(&voice.name) {
                Ok(parsed) => {
                    matches(langs, &parsed.lang)
                        && matches(models, &parsed.model)
                        && matches(genders, &voice.ssml_gender)
                }
                Err(_) => false,
            })
            .cloned()
            .collect()
    }
}
