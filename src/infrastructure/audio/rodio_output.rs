use super::{AudioOutput, AudioOutputFactory, CompletionSignal};
use crate::domain::playback::PlaybackError;
use crate::domain::synthesis::DecodedAudioBuffer;
use rodio::buffer::SamplesBuffer;
use rodio::mixer::Mixer;
use rodio::{OutputStreamBuilder, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// How often the sink is checked for natural completion
const PLAYER_LOOP_SLEEP_DURATION: Duration = Duration::from_millis(50);

/// Plays on the default output device through rodio
#[derive(Debug, Default, Clone)]
pub struct RodioOutputFactory;

impl RodioOutputFactory {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutputFactory for RodioOutputFactory {
    fn open(&self) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<Mixer, String>>(1);
        let (close_tx, close_rx) = mpsc::channel::<()>();

        // The output stream stays on this thread for its whole life; only the mixer crosses over.
        std::thread::Builder::new()
            .name("cloudspeak-audio".to_string())
            .spawn(move || match OutputStreamBuilder::open_default_stream() {
                Ok(mut stream) => {
                    // Reopened every speak cycle, keep stderr quiet on drop
                    stream.log_on_drop(false);
                    if ready_tx.send(Ok(stream.mixer().clone())).is_err() {
                        return;
                    }
                    // Blocks until the owning RodioOutput closes or drops its sender
                    let _ = close_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| PlaybackError::Output(format!("failed to spawn audio thread: {}", e)))?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| PlaybackError::Output("audio thread exited unexpectedly".to_string()))?
            .map_err(|e| PlaybackError::Output(format!("failed to open audio device: {}", e)))?;

        tracing::debug!("Audio output context opened");

        Ok(Box::new(RodioOutput {
            mixer,
            sink: None,
            close_tx: Some(close_tx),
            closed: Arc::new(AtomicBool::new(false)),
            watcher: None,
        }))
    }

    fn kind(&self) -> &'static str {
        "device"
    }
}

struct RodioOutput {
    mixer: Mixer,
    /// Sink of the buffer started last; replaced on every start
    sink: Option<Arc<Sink>>,
    close_tx: Option<mpsc::Sender<()>>,
    closed: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
}

impl RodioOutput {
    fn stop_watcher(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

impl AudioOutput for RodioOutput {
    fn start(
        &mut self,
        buffer: &DecodedAudioBuffer,
        offset: Duration,
    ) -> Result<CompletionSignal, PlaybackError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlaybackError::Output(format!("no async runtime for playback: {}", e)))?;

        self.stop_watcher();
        self.stop_sink();

        let audio = buffer.audio();
        let channels = audio.channels.try_into().map_err(|e| {
            PlaybackError::Output(format!("invalid channel count {}: {}", audio.channels, e))
        })?;
        let sample_rate = audio.sample_rate.try_into().map_err(|e| {
            PlaybackError::Output(format!("invalid sample rate {}: {}", audio.sample_rate, e))
        })?;
        let source = SamplesBuffer::new(channels, sample_rate, audio.samples.to_vec())
            .skip_duration(offset);

        // A fresh sink never waits on a stopped queue to drain, so appending does not block
        let sink = Arc::new(Sink::connect_new(&self.mixer));
        sink.append(source);
        sink.play();
        self.sink = Some(sink.clone());

        let (tx, rx) = oneshot::channel();
        let closed = self.closed.clone();
        self.watcher = Some(runtime.spawn(async move {
            loop {
                tokio::time::sleep(PLAYER_LOOP_SLEEP_DURATION).await;
                if closed.load(Ordering::SeqCst) {
                    return;
                }
                if !sink.is_paused() && sink.empty() {
                    let _ = tx.send(());
                    return;
                }
            }
        }));

        Ok(rx)
    }

    fn suspend(&mut self) -> Result<Duration, PlaybackError> {
        self.stop_watcher();
        match &self.sink {
            Some(sink) => {
                sink.pause();
                Ok(sink.get_pos())
            }
            None => Ok(Duration::ZERO),
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.stop_watcher();
        self.stop_sink();
        // Dropping the sender lets the audio thread release the device
        self.close_tx.take();
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.close();
    }
}
