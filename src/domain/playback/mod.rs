pub mod dto;
pub mod engine;
pub mod error;
pub mod queue;
pub mod segmenter;
pub mod session;
pub mod state;

pub use dto::{SpeakRequest, StateResponse};
pub use engine::{resume_offset, PlaybackEngine, PlaybackEvent, DEFAULT_SKIP_BACK};
pub use error::PlaybackError;
pub use queue::{FetchResult, InflightFetch, NextBuffer, SegmentQueue, DEFAULT_MAX_RESIDENT_BUFFERS};
pub use segmenter::{normalize, segment, TextSegment, IDEAL_SEGMENT_SIZE, MINIMUM_PARAGRAPH_SIZE};
pub use session::{SessionDeps, SessionOptions, SpeechSession};
pub use state::{ListenerId, PlaybackState, StatusBoard};
