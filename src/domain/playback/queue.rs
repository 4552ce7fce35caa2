use super::segmenter::TextSegment;
use crate::domain::synthesis::{DecodedAudioBuffer, SynthesisError};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::VecDeque;
use std::sync::Arc;

pub const DEFAULT_MAX_RESIDENT_BUFFERS: usize = 12;

pub type FetchResult = Result<Arc<DecodedAudioBuffer>, SynthesisError>;

/// The single outstanding fetch, awaitable by any number of waiters
pub type InflightFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Outcome of asking the queue for the next buffer to play
pub enum NextBuffer {
    Ready(Arc<DecodedAudioBuffer>),
    /// The next buffer is being fetched; await it, then ask again
    Pending(InflightFetch),
    Failed(SynthesisError),
    /// Segments remain but no fetch is running; call `ensure_prefetch`
    NeedsFetch,
    Exhausted,
}

struct Inflight {
    segment_index: usize,
    fetch: InflightFetch,
    abort: tokio::task::AbortHandle,
}

/// Pending segments and decoded buffers of one speak cycle.
///
/// Buffers are handed out strictly in segment order and at most one fetch runs at a time.
pub struct SegmentQueue {
    pending: VecDeque<TextSegment>,
    ready: VecDeque<Arc<DecodedAudioBuffer>>,
    /// Absolute index of the next buffer to hand out
    cursor: usize,
    /// Number of played buffers dropped from the front of `ready`
    released: usize,
    inflight: Option<Inflight>,
    failure: Option<SynthesisError>,
    max_resident_buffers: usize,
    fetches_started: usize,
}

impl SegmentQueue {
    pub fn new(max_resident_buffers: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            ready: VecDeque::new(),
            cursor: 0,
            released: 0,
            inflight: None,
            failure: None,
            max_resident_buffers: max_resident_buffers.max(1),
            fetches_started: 0,
        }
    }

    /// Replace the pending segments, dropping every buffer and cancelling the inflight fetch
    pub fn initialize(&mut self, segments: Vec<TextSegment>) {
        self.cancel_inflight();
        self.pending = segments.into();
        self.ready.clear();
        self.cursor = 0;
        self.released = 0;
        self.failure = None;
    }

    /// Start fetching the next pending segment if the cursor caught up with the decoded buffers.
    ///
    /// Returns whether a fetch was started.
    pub fn ensure_prefetch<F>(&mut self, start_fetch: F) -> bool
    where
        F: FnOnce(TextSegment) -> BoxFuture<'static, FetchResult>,
    {
        self.settle();

        if self.cursor != self.ready_len() || self.inflight.is_some() || self.failure.is_some() {
            return false;
        }
        let Some(segment) = self.pending.pop_front() else {
            return false;
        };

        let segment_index = segment.index;
        let task = tokio::spawn(start_fetch(segment));
        let abort = task.abort_handle();
        let fetch = task
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(SynthesisError::Transport(format!("fetch task ended: {}", e))),
            })
            .boxed()
            .shared();

        tracing::debug!(segment_index = segment_index, "Segment fetch started");

        self.fetches_started += 1;
        self.inflight = Some(Inflight {
            segment_index,
            fetch,
            abort,
        });
        true
    }

    /// Hand out the next buffer in order, or say why none is available yet
    pub fn take_next_ready(&mut self) -> NextBuffer {
        self.settle();

        if self.cursor < self.ready_len() {
            let position = self.cursor - self.released;
            if let Some(buffer) = self.ready.get(position) {
                self.cursor += 1;
                return NextBuffer::Ready(buffer.clone());
            }
        }
        if let Some(inflight) = &self.inflight {
            return NextBuffer::Pending(inflight.fetch.clone());
        }
        if let Some(failure) = &self.failure {
            return NextBuffer::Failed(failure.clone());
        }
        if self.pending.is_empty() {
            NextBuffer::Exhausted
        } else {
            NextBuffer::NeedsFetch
        }
    }

    /// Nothing left to fetch or play
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.inflight.is_none() && self.cursor == self.ready_len()
    }

    /// Release played buffers beyond the residency cap
    pub fn mark_played(&mut self) {
        while self.ready.len() > self.max_resident_buffers && self.released < self.cursor {
            self.ready.pop_front();
            self.released += 1;
        }
    }

    /// Restart from buffer 0 without refetching. Fails once any buffer was released.
    pub fn rewind(&mut self) -> bool {
        self.settle();
        if self.released > 0 || self.ready.is_empty() || self.failure.is_some() {
            return false;
        }
        self.cursor = 0;
        true
    }

    pub fn has_inflight(&self) -> bool {
        self.inflight.is_some()
    }

    pub fn resident_buffers(&self) -> usize {
        self.ready.len()
    }

    pub fn fetches_started(&self) -> usize {
        self.fetches_started
    }

    fn ready_len(&self) -> usize {
        self.released + self.ready.len()
    }

    /// Move a completed inflight result into `ready` or `failure`
    fn settle(&mut self) {
        let Some(inflight) = &self.inflight else {
            return;
        };
        let Some(result) = inflight.fetch.clone().now_or_never() else {
            return;
        };
        let segment_index = inflight.segment_index;
        self.inflight = None;

        match result {
            Ok(buffer) => {
                tracing::debug!(segment_index = segment_index, "Segment buffer ready");
                self.ready.push_back(buffer);
            }
            Err(e) => {
                tracing::warn!(segment_index = segment_index, error = %e, "Segment fetch failed");
                self.failure = Some(e);
            }
        }
    }

    fn cancel_inflight(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            tracing::debug!(
                segment_index = inflight.segment_index,
                "Cancelling inflight segment fetch"
            );
            inflight.abort.abort();
        }
    }
}

impl Drop for SegmentQueue {
    fn drop(&mut self) {
        self.cancel_inflight();
    }
}
