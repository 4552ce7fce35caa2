pub mod catalog;
pub mod client;
pub mod dto;
pub mod error;
pub mod model;
pub mod voice;

pub use catalog::VoiceCatalogService;
pub use client::SynthesisClient;
pub use dto::{
    AudioConfigDto, ErrorBody, ErrorEnvelope, SynthesisInput, SynthesizeRequest,
    SynthesizeResponse, VoiceInfo, VoiceSelectionDto, VoicesResponse,
};
pub use error::SynthesisError;
pub use model::{DecodedAudio, DecodedAudioBuffer, VoiceCatalog};
pub use voice::{
    AudioEncoding, EffectsProfile, VoiceConfig, VoiceModelClass, VoiceName, DEFAULT_VOICE_NAME,
};

#[cfg(test)]
pub mod test_support;
