use super::error::PlaybackError;
use crate::domain::synthesis::DecodedAudioBuffer;
use crate::infrastructure::audio::{AudioOutput, AudioOutputFactory};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default seek-back applied when resuming from pause
pub const DEFAULT_SKIP_BACK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A buffer played to its natural end
    Ended { cycle: u64, generation: u64 },
}

/// Offset to restart from after pausing at `paused`.
///
/// Below the threshold the true offset is kept; otherwise playback seeks back by the threshold.
pub fn resume_offset(paused: Duration, threshold: Duration) -> Duration {
    if paused < threshold {
        paused
    } else {
        paused - threshold
    }
}

/// Owns the session's audio output and plays one buffer at a time
pub struct PlaybackEngine {
    factory: Arc<dyn AudioOutputFactory>,
    output: Option<Box<dyn AudioOutput>>,
    current: Option<Arc<DecodedAudioBuffer>>,
    started_offset: Duration,
    paused_offset: Duration,
    skip_back: Duration,
    /// Bumped on every start, pause and stop; stale completion events carry an older value.
    generation: u64,
    stopped: bool,
    cycle: u64,
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

impl PlaybackEngine {
    pub fn new(
        factory: Arc<dyn AudioOutputFactory>,
        skip_back: Duration,
        cycle: u64,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Self {
        Self {
            factory,
            output: None,
            current: None,
            started_offset: Duration::ZERO,
            paused_offset: Duration::ZERO,
            skip_back,
            generation: 0,
            stopped: false,
            cycle,
            events,
        }
    }

    /// Start `buffer`, from the seek-back adjusted pause offset when `resume_from_pause` is set
    pub fn play(
        &mut self,
        buffer: Arc<DecodedAudioBuffer>,
        resume_from_pause: bool,
    ) -> Result<(), PlaybackError> {
        let offset = if resume_from_pause {
            resume_offset(self.paused_offset, self.skip_back).min(buffer.duration())
        } else {
            Duration::ZERO
        };

        let mut output = match self.output.take() {
            Some(output) => output,
            None => self.factory.open()?,
        };
        let started = output.start(&buffer, offset);
        self.output = Some(output);
        let signal = started?;

        self.generation += 1;
        self.stopped = false;
        self.started_offset = offset;
        self.paused_offset = Duration::ZERO;

        tracing::info!(
            segment_index = buffer.segment_index(),
            offset_ms = offset.as_millis() as u64,
            duration_ms = buffer.duration().as_millis() as u64,
            output = self.factory.kind(),
            "Playing segment"
        );
        self.current = Some(buffer);

        let event = PlaybackEvent::Ended {
            cycle: self.cycle,
            generation: self.generation,
        };
        let events = self.events.clone();
        tokio::spawn(async move {
            if signal.await.is_ok() {
                let _ = events.send(event);
            }
        });

        Ok(())
    }

    /// Suspend the output without releasing it and remember where playback stood
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.current.is_none() {
            return Ok(());
        }
        let Some(output) = self.output.as_mut() else {
            return Ok(());
        };
        let elapsed = output.suspend()?;
        self.generation += 1;

        let limit = self
            .current
            .as_ref()
            .map(|buffer| buffer.duration())
            .unwrap_or(Duration::ZERO);
        self.paused_offset = (self.started_offset + elapsed).min(limit);

        tracing::debug!(
            paused_offset_ms = self.paused_offset.as_millis() as u64,
            "Playback suspended"
        );
        Ok(())
    }

    /// Restart the current buffer near the pause point
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        let buffer = self
            .current
            .clone()
            .ok_or_else(|| PlaybackError::Output("nothing to resume".to_string()))?;
        self.play(buffer, true)
    }

    /// Release the output and suppress any pending completion event
    pub fn stop(&mut self) {
        self.stopped = true;
        self.generation += 1;
        if let Some(mut output) = self.output.take() {
            output.close();
            tracing::debug!("Audio output released");
        }
        self.started_offset = Duration::ZERO;
        self.paused_offset = Duration::ZERO;
        self.current = None;
    }

    /// Whether a completion event still refers to what is playing now
    pub fn accept_ended(&self, generation: u64) -> bool {
        !self.stopped && generation == self.generation
    }

    /// The current buffer played to its end; the output stays open for the next one
    pub fn finish_current(&mut self) {
        self.current = None;
        self.started_offset = Duration::ZERO;
        self.paused_offset = Duration::ZERO;
    }

    pub fn set_skip_back(&mut self, skip_back: Duration) {
        self.skip_back = skip_back;
    }

    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    pub fn paused_offset(&self) -> Duration {
        self.paused_offset
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.close();
        }
    }
}
