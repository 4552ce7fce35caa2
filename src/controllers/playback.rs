use axum::{extract::State, http::StatusCode, Json};
use std::future::Future;
use std::sync::Arc;

use crate::{
    domain::playback::{PlaybackError, SpeakRequest, SpeechSession, StateResponse},
    error::{AppError, AppResult},
};

/// Width large enough that html2text never wraps lines
const HTML_TEXT_WIDTH: usize = usize::MAX;

pub struct PlaybackController {
    session: SpeechSession,
}

impl PlaybackController {
    pub fn new(session: SpeechSession) -> Self {
        Self { session }
    }

    fn snapshot(&self) -> StateResponse {
        StateResponse {
            state: self.session.state(),
            last_error: self.session.last_error(),
        }
    }

    /// Run a long command in the background; its failures land in the session state
    fn spawn_command<F>(&self, command: &'static str, future: F)
    where
        F: Future<Output = Result<(), PlaybackError>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = future.await {
                tracing::warn!(command = command, error = %e, "Playback command failed");
            }
        });
    }

    /// POST /api/speak - Start speaking a text from its beginning
    pub async fn speak(
        State(controller): State<Arc<PlaybackController>>,
        Json(request): Json<SpeakRequest>,
    ) -> AppResult<(StatusCode, Json<StateResponse>)> {
        let text = if request.html {
            html2text::from_read(request.text.as_bytes(), HTML_TEXT_WIDTH)
        } else {
            request.text
        };

        if text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }

        tracing::debug!(text_length = text.chars().count(), "Speak requested");
        let session = controller.session.clone();
        controller.spawn_command("speak", async move { session.speak(&text).await });

        Ok((StatusCode::ACCEPTED, Json(controller.snapshot())))
    }

    /// POST /api/play - Resume, keep playing, or replay the last text
    pub async fn play(
        State(controller): State<Arc<PlaybackController>>,
    ) -> (StatusCode, Json<StateResponse>) {
        let session = controller.session.clone();
        controller.spawn_command("play", async move { session.play().await });
        (StatusCode::ACCEPTED, Json(controller.snapshot()))
    }

    /// POST /api/pause - Pause the current buffer
    pub async fn pause(
        State(controller): State<Arc<PlaybackController>>,
    ) -> AppResult<Json<StateResponse>> {
        controller.session.pause().await?;
        Ok(Json(controller.snapshot()))
    }

    /// POST /api/resume - Resume after a pause
    pub async fn resume(
        State(controller): State<Arc<PlaybackController>>,
    ) -> (StatusCode, Json<StateResponse>) {
        let session = controller.session.clone();
        controller.spawn_command("resume", async move { session.resume().await });
        (StatusCode::ACCEPTED, Json(controller.snapshot()))
    }

    /// POST /api/stop - Stop playback and release the audio output
    pub async fn stop(State(controller): State<Arc<PlaybackController>>) -> Json<StateResponse> {
        controller.session.stop().await;
        Json(controller.snapshot())
    }

    /// POST /api/test-sound - Speak the configured test phrase
    pub async fn test_sound(
        State(controller): State<Arc<PlaybackController>>,
    ) -> (StatusCode, Json<StateResponse>) {
        let session = controller.session.clone();
        controller.spawn_command("test_sound", async move { session.play_test_sound().await });
        (StatusCode::ACCEPTED, Json(controller.snapshot()))
    }

    /// GET /api/state - Current playback state and last error
    pub async fn state(State(controller): State<Arc<PlaybackController>>) -> Json<StateResponse> {
        Json(controller.snapshot())
    }
}
