pub mod rodio_decoder;
pub mod rodio_output;
pub mod simulated_output;

pub use rodio_decoder::RodioDecoder;
pub use rodio_output::RodioOutputFactory;
pub use simulated_output::{SimulatedOutputFactory, StartRecord};

use crate::domain::playback::PlaybackError;
use crate::domain::synthesis::{DecodedAudio, DecodedAudioBuffer, SynthesisError};
use std::time::Duration;
use tokio::sync::oneshot;

/// Resolves when the started buffer plays to its natural end.
/// Dropped without firing when the output is suspended or closed.
pub type CompletionSignal = oneshot::Receiver<()>;

/// Turns encoded audio bytes (mp3, wav, ...) into PCM
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, encoded: &[u8]) -> Result<DecodedAudio, SynthesisError>;
}

/// One live audio output context. At most one buffer plays on it at a time.
pub trait AudioOutput: Send {
    /// Start playing `buffer` from `offset`
    fn start(
        &mut self,
        buffer: &DecodedAudioBuffer,
        offset: Duration,
    ) -> Result<CompletionSignal, PlaybackError>;

    /// Suspend playback without releasing the context.
    ///
    /// Returns the time played since the last `start`, not counting the start offset.
    fn suspend(&mut self) -> Result<Duration, PlaybackError>;

    /// Release the context; a pending completion signal never fires
    fn close(&mut self);
}

/// Allocates audio output contexts
pub trait AudioOutputFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn AudioOutput>, PlaybackError>;

    /// Short name used in logs and readiness reports
    fn kind(&self) -> &'static str;
}
