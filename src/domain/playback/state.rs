use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    Idle,
    Downloading,
    Playing,
    Paused,
    Stopped,
    Error,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "IDLE",
            PlaybackState::Downloading => "DOWNLOADING",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
            PlaybackState::Stopped => "STOPPED",
            PlaybackState::Error => "ERROR",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle returned by `on_state_change`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type StateListener = Arc<dyn Fn(PlaybackState) + Send + Sync>;

struct Board {
    state: PlaybackState,
    last_error: Option<String>,
    listeners: Vec<(ListenerId, StateListener)>,
    next_listener: u64,
}

/// Current state, last error and subscribers of one session.
///
/// Listeners run on the transitioning task after the lock is released, so they may
/// read the session state back.
pub struct StatusBoard {
    inner: Mutex<Board>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Board {
                state: PlaybackState::Idle,
                last_error: None,
                listeners: Vec::new(),
                next_listener: 0,
            }),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// Move to `state`, notifying listeners only when the value actually changes
    pub fn set(&self, state: PlaybackState) -> bool {
        let listeners = {
            let mut board = self.inner.lock();
            if board.state == state {
                return false;
            }
            tracing::debug!(from = %board.state, to = %state, "Playback state changed");
            board.state = state;
            board
                .listeners
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect::<Vec<_>>()
        };

        for listener in listeners {
            listener(state);
        }
        true
    }

    /// Record `message` and move to `Error`
    pub fn fail(&self, message: String) {
        tracing::error!(error = %message, "Playback failed");
        self.inner.lock().last_error = Some(message);
        self.set(PlaybackState::Error);
    }

    pub fn clear_error(&self) {
        self.inner.lock().last_error = None;
    }

    pub fn subscribe(&self, listener: StateListener) -> ListenerId {
        let mut board = self.inner.lock();
        let id = ListenerId(board.next_listener);
        board.next_listener += 1;
        board.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut board = self.inner.lock();
        let before = board.listeners.len();
        board.listeners.retain(|(listener_id, _)| *listener_id != id);
        board.listeners.len() != before
    }
}
