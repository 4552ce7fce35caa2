use super::{AudioOutput, AudioOutputFactory, CompletionSignal};
use crate::domain::playback::PlaybackError;
use crate::domain::synthesis::DecodedAudioBuffer;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A `start` call observed by the simulated output
#[derive(Debug, Clone, PartialEq)]
pub struct StartRecord {
    pub segment_index: usize,
    pub offset: Duration,
}

/// Headless output: "plays" a buffer by sleeping for its remaining duration on the tokio clock.
#[derive(Clone, Default)]
pub struct SimulatedOutputFactory {
    starts: Arc<Mutex<Vec<StartRecord>>>,
    opened: Arc<Mutex<usize>>,
    fail_open: Arc<Mutex<Option<String>>>,
}

impl SimulatedOutputFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every start observed so far, in order
    pub fn starts(&self) -> Vec<StartRecord> {
        self.starts.lock().clone()
    }

    pub fn opened_count(&self) -> usize {
        *self.opened.lock()
    }

    /// Make subsequent `open` calls fail with `message` (device unplugged, ...)
    pub fn fail_next_open(&self, message: &str) {
        *self.fail_open.lock() = Some(message.to_string());
    }
}

impl AudioOutputFactory for SimulatedOutputFactory {
    fn open(&self) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        if let Some(message) = self.fail_open.lock().take() {
            return Err(PlaybackError::Output(message));
        }
        *self.opened.lock() += 1;
        Ok(Box::new(SimulatedOutput {
            starts: self.starts.clone(),
            started_at: None,
            timer: None,
        }))
    }

    fn kind(&self) -> &'static str {
        "simulated"
    }
}

struct SimulatedOutput {
    starts: Arc<Mutex<Vec<StartRecord>>>,
    started_at: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

impl SimulatedOutput {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl AudioOutput for SimulatedOutput {
    fn start(
        &mut self,
        buffer: &DecodedAudioBuffer,
        offset: Duration,
    ) -> Result<CompletionSignal, PlaybackError> {
        self.cancel_timer();
        self.starts.lock().push(StartRecord {
            segment_index: buffer.segment_index(),
            offset,
        });

        let remaining = buffer.duration().saturating_sub(offset);
        let (tx, rx) = oneshot::channel();
        self.started_at = Some(Instant::now());
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = tx.send(());
        }));

        Ok(rx)
    }

    fn suspend(&mut self) -> Result<Duration, PlaybackError> {
        self.cancel_timer();
        Ok(self
            .started_at
            .take()
            .map(|at| at.elapsed())
            .unwrap_or(Duration::ZERO))
    }

    fn close(&mut self) {
        self.cancel_timer();
        self.started_at = None;
    }
}

impl Drop for SimulatedOutput {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
