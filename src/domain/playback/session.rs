use super::engine::{PlaybackEngine, PlaybackEvent};
use super::error::PlaybackError;
use super::queue::{FetchResult, NextBuffer, SegmentQueue, DEFAULT_MAX_RESIDENT_BUFFERS};
use super::segmenter::{self, TextSegment};
use super::state::{ListenerId, PlaybackState, StatusBoard};
use crate::domain::settings::UserSettings;
use crate::domain::synthesis::{SynthesisClient, SynthesisError, VoiceConfig};
use crate::infrastructure::audio::AudioOutputFactory;
use crate::infrastructure::repositories::{ConfigStore, QuotaMeter};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, MutexGuard};

/// Collaborators injected into a session
#[derive(Clone)]
pub struct SessionDeps {
    pub client: Arc<SynthesisClient>,
    pub config: Arc<dyn ConfigStore>,
    pub quota: Arc<dyn QuotaMeter>,
    pub output: Arc<dyn AudioOutputFactory>,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub max_resident_buffers: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_resident_buffers: DEFAULT_MAX_RESIDENT_BUFFERS,
        }
    }
}

/// Voice settings and credentials the resident buffers were synthesized with
#[derive(Debug, Clone, PartialEq)]
struct SettingsFingerprint {
    voice: VoiceConfig,
    api_key: String,
}

/// Everything a segment fetch needs, cloned into each fetch task
#[derive(Clone)]
struct FetchContext {
    client: Arc<SynthesisClient>,
    quota: Arc<dyn QuotaMeter>,
    voice: VoiceConfig,
    api_key: String,
}

impl FetchContext {
    /// Fetch a segment and bill the characters actually sent.
    ///
    /// The backend call and its billing run in their own task. Aborting the fetch only
    /// abandons decoding, so a request already sent is still billed once.
    fn fetcher(&self) -> impl FnOnce(TextSegment) -> BoxFuture<'static, FetchResult> {
        let context = self.clone();
        move |segment| {
            async move {
                let request = {
                    let context = context.clone();
                    let segment = segment.clone();
                    tokio::spawn(async move {
                        let encoded = context
                            .client
                            .request_audio(&segment, &context.voice, &context.api_key)
                            .await?;
                        if let Err(e) = context
                            .quota
                            .increment(segment.char_count(), context.voice.model_class())
                            .await
                        {
                            tracing::warn!(error = %e, "Failed to record quota usage");
                        }
                        Ok::<_, SynthesisError>(encoded)
                    })
                };
                let encoded = request.await.map_err(|e| {
                    SynthesisError::Transport(format!("synthesis request task ended: {}", e))
                })??;

                let buffer = context.client.decode_audio(&segment, &encoded).await?;
                Ok(Arc::new(buffer))
            }
            .boxed()
        }
    }
}

/// Queue, engine and bookkeeping of the current speak cycle
struct Cycle {
    id: u64,
    /// Bumped by every speak, pause, resume and stop so a waiter can tell it was superseded
    intent: u64,
    queue: SegmentQueue,
    engine: PlaybackEngine,
    context: Option<FetchContext>,
    fingerprint: Option<SettingsFingerprint>,
    last_text: Option<String>,
}

enum Advanced {
    Playing,
    Finished,
    Superseded,
}

struct SessionShared {
    status: StatusBoard,
    cycle: Mutex<Cycle>,
    deps: SessionDeps,
    options: SessionOptions,
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

/// Public playback state machine. Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct SpeechSession {
    shared: Arc<SessionShared>,
}

impl SpeechSession {
    /// Must be called from within a tokio runtime
    pub fn new(deps: SessionDeps, options: SessionOptions) -> Self {
        let (events, mut rx) = mpsc::unbounded_channel();
        let engine = PlaybackEngine::new(deps.output.clone(), Duration::ZERO, 0, events.clone());

        let shared = Arc::new(SessionShared {
            status: StatusBoard::new(),
            cycle: Mutex::new(Cycle {
                id: 0,
                intent: 0,
                queue: SegmentQueue::new(options.max_resident_buffers),
                engine,
                context: None,
                fingerprint: None,
                last_text: None,
            }),
            deps,
            options,
            events,
        });

        let weak: Weak<SessionShared> = Arc::downgrade(&shared);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                SpeechSession { shared }.on_track_ended(event).await;
            }
            tracing::debug!("Playback event loop finished");
        });

        Self { shared }
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.status.state()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.status.last_error()
    }

    /// Subscribe to state changes; the callback runs once per actual change
    pub fn on_state_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(PlaybackState) + Send + Sync + 'static,
    {
        self.shared.status.subscribe(Arc::new(listener))
    }

    pub fn remove_state_listener(&self, id: ListenerId) -> bool {
        self.shared.status.unsubscribe(id)
    }

    /// Speak `text` from the beginning.
    ///
    /// Returns once the first buffer started playing (or the request failed). Failures are
    /// also recorded as the session's last error.
    pub async fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        let cleaned = segmenter::normalize(text.trim());
        if cleaned.trim().is_empty() {
            tracing::debug!("Ignoring blank speak request");
            return Ok(());
        }

        let (settings, api_key) = match self.load_settings().await {
            Ok(loaded) => loaded,
            Err(e) => return Err(self.fail_before_start(e).await),
        };
        let fingerprint = SettingsFingerprint {
            voice: settings.voice.clone(),
            api_key: api_key.clone(),
        };

        let mut cycle = self.shared.cycle.lock().await;
        cycle.intent += 1;
        let intent = cycle.intent;
        cycle.engine.stop();
        cycle.id += 1;
        cycle.engine = PlaybackEngine::new(
            self.shared.deps.output.clone(),
            settings.skip_back(),
            cycle.id,
            self.shared.events.clone(),
        );

        let replay = self.state() != PlaybackState::Error
            && cycle.last_text.as_deref() == Some(cleaned.as_str())
            && cycle.fingerprint.as_ref() == Some(&fingerprint)
            && cycle.queue.rewind();

        if replay {
            tracing::info!(cycle = cycle.id, "Replaying resident buffers");
        } else {
            let segments = segmenter::segment(&cleaned);
            tracing::info!(
                cycle = cycle.id,
                segment_count = segments.len(),
                text_length = cleaned.chars().count(),
                voice = %settings.voice.voice_name,
                "Starting speech"
            );

            self.shared.status.clear_error();
            let mut queue = SegmentQueue::new(self.shared.options.max_resident_buffers);
            queue.initialize(segments);
            cycle.queue = queue;
            cycle.context = Some(FetchContext {
                client: self.shared.deps.client.clone(),
                quota: self.shared.deps.quota.clone(),
                voice: settings.voice,
                api_key,
            });
            cycle.fingerprint = Some(fingerprint);
            cycle.last_text = Some(cleaned);
            self.shared.status.set(PlaybackState::Downloading);
        }

        self.advance(cycle, intent).await
    }

    /// Host "play" command: keep playing, resume when paused, otherwise replay the last text
    pub async fn play(&self) -> Result<(), PlaybackError> {
        match self.state() {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Paused => self.resume().await,
            _ => {
                let last_text = self.shared.cycle.lock().await.last_text.clone();
                match last_text {
                    Some(text) => self.speak(&text).await,
                    None => Ok(()),
                }
            }
        }
    }

    /// Speak the configured test phrase
    pub async fn play_test_sound(&self) -> Result<(), PlaybackError> {
        let settings = match self.shared.deps.config.load().await {
            Ok(settings) => settings,
            Err(e) => return Err(self.fail_before_start(e.into()).await),
        };
        self.speak(&settings.test_text).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        let mut cycle = self.shared.cycle.lock().await;
        if self.state() != PlaybackState::Playing {
            return Ok(());
        }
        cycle.intent += 1;

        if let Err(e) = cycle.engine.pause() {
            cycle.engine.stop();
            self.shared.status.fail(e.to_string());
            return Err(e);
        }
        self.shared.status.set(PlaybackState::Paused);
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), PlaybackError> {
        if self.state() != PlaybackState::Paused {
            return Ok(());
        }
        // The seek-back may have been changed while paused
        let skip_back = match self.shared.deps.config.load().await {
            Ok(settings) => Some(settings.skip_back()),
            Err(e) => {
                tracing::warn!(error = %e, "Keeping the previous seek-back, settings unreadable");
                None
            }
        };

        let mut cycle = self.shared.cycle.lock().await;
        if self.state() != PlaybackState::Paused {
            return Ok(());
        }
        cycle.intent += 1;
        let intent = cycle.intent;
        if let Some(skip_back) = skip_back {
            cycle.engine.set_skip_back(skip_back);
        }

        if cycle.engine.has_current() {
            if let Err(e) = cycle.engine.resume() {
                cycle.engine.stop();
                self.shared.status.fail(e.to_string());
                return Err(e);
            }
            self.shared.status.set(PlaybackState::Playing);
            return Ok(());
        }

        // Paused while waiting on the next buffer
        self.shared.status.set(PlaybackState::Playing);
        self.advance(cycle, intent).await
    }

    pub async fn stop(&self) {
        let mut cycle = self.shared.cycle.lock().await;
        cycle.intent += 1;
        cycle.engine.stop();

        match self.state() {
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Downloading => {
                tracing::info!(cycle = cycle.id, "Playback stopped");
                self.shared.status.set(PlaybackState::Stopped);
            }
            _ => {}
        }
    }

    /// Settings could not be read: silence the output and publish the error
    async fn fail_before_start(&self, e: PlaybackError) -> PlaybackError {
        let mut cycle = self.shared.cycle.lock().await;
        cycle.intent += 1;
        cycle.engine.stop();
        self.shared.status.fail(e.to_string());
        e
    }

    async fn load_settings(&self) -> Result<(UserSettings, String), PlaybackError> {
        let config = &self.shared.deps.config;
        let settings = config.load().await?;
        let api_key = config
            .api_key()
            .await?
            .filter(|key| !key.trim().is_empty())
            .ok_or(PlaybackError::MissingApiKey)?;
        Ok((settings, api_key))
    }

    async fn on_track_ended(&self, event: PlaybackEvent) {
        let PlaybackEvent::Ended { cycle: id, generation } = event;

        let mut cycle = self.shared.cycle.lock().await;
        if cycle.id != id || !cycle.engine.accept_ended(generation) {
            tracing::debug!(cycle = id, generation = generation, "Ignoring stale completion");
            return;
        }
        cycle.engine.finish_current();
        cycle.queue.mark_played();

        let intent = cycle.intent;
        if let Err(e) = self.advance(cycle, intent).await {
            tracing::warn!(error = %e, "Chaining to the next segment failed");
        }
    }

    /// Play the next buffer and publish the resulting state while still holding the cycle
    async fn advance<'a>(
        &'a self,
        cycle: MutexGuard<'a, Cycle>,
        intent: u64,
    ) -> Result<(), PlaybackError> {
        let (mut cycle, outcome) = self.step(cycle, intent).await;

        match outcome {
            Ok(Advanced::Playing) => {
                self.shared.status.set(PlaybackState::Playing);
                Ok(())
            }
            Ok(Advanced::Finished) => {
                tracing::info!(cycle = cycle.id, "All segments played");
                self.shared.status.set(PlaybackState::Stopped);
                Ok(())
            }
            Ok(Advanced::Superseded) => Ok(()),
            Err(e) => {
                cycle.engine.stop();
                self.shared.status.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Take the next buffer in order, waiting on the inflight fetch without holding the cycle lock
    async fn step<'a>(
        &'a self,
        mut cycle: MutexGuard<'a, Cycle>,
        intent: u64,
    ) -> (MutexGuard<'a, Cycle>, Result<Advanced, PlaybackError>) {
        loop {
            if cycle.intent != intent {
                return (cycle, Ok(Advanced::Superseded));
            }

            let context = cycle.context.clone();
            if let Some(context) = &context {
                cycle.queue.ensure_prefetch(context.fetcher());
            }

            match cycle.queue.take_next_ready() {
                NextBuffer::Ready(buffer) => {
                    if let Err(e) = cycle.engine.play(buffer, false) {
                        return (cycle, Err(e));
                    }
                    // Start fetching the following segment while this one plays
                    if let Some(context) = &context {
                        cycle.queue.ensure_prefetch(context.fetcher());
                    }
                    return (cycle, Ok(Advanced::Playing));
                }
                NextBuffer::Pending(fetch) => {
                    tracing::debug!(cycle = cycle.id, "Waiting for the next segment");
                    drop(cycle);
                    let _ = fetch.await;
                    cycle = self.shared.cycle.lock().await;
                }
                NextBuffer::Failed(e) => return (cycle, Err(e.into())),
                NextBuffer::Exhausted => return (cycle, Ok(Advanced::Finished)),
                NextBuffer::NeedsFetch => {
                    return (
                        cycle,
                        Err(PlaybackError::Output(
                            "no synthesis context for pending segments".to_string(),
                        )),
                    );
                }
            }
        }
    }
}
