use std::sync::Arc;
use std::time::Duration;

use crate::models::chunk::MediaChunk;
use crate::models::error::RecorderError;

/// Event emitted by a recorder backend during a session.
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// An encoded chunk is available.
    ChunkAvailable(MediaChunk),

    /// The recorder finished stopping; no more chunks will follow.
    Stopped,

    /// The recorder failed mid-session. The session returns to idle.
    Error(RecorderError),
}

/// Callback invoked for each recorder event.
///
/// May fire on a dedicated backend thread; keep processing minimal.
/// Implementations should marshal to the UI thread if needed.
pub type RecorderEventCallback = Arc<dyn Fn(RecorderEvent) + Send + Sync + 'static>;

/// Control interface for the recorder object serializing a capture stream
/// into encoded chunks.
///
/// A recorder is created fresh per recording session by
/// `MediaBackend::create_recorder` and discarded once stopped.
pub trait StreamRecorder: Send {
    /// Begin recording.
    ///
    /// With a timeslice, a chunk is emitted at least every `timeslice`;
    /// without one, a single chunk arrives when the recorder stops.
    fn start(&mut self, timeslice: Option<Duration>) -> Result<(), RecorderError>;

    /// Suspend encoding. Paused time is not recorded.
    fn pause(&mut self) -> Result<(), RecorderError>;

    /// Resume after `pause`.
    fn resume(&mut self) -> Result<(), RecorderError>;

    /// Flush buffered data into a chunk ahead of the timeslice schedule.
    fn request_chunk(&mut self) -> Result<(), RecorderError>;

    /// Stop recording. Remaining data is flushed as a final chunk, then
    /// `RecorderEvent::Stopped` is delivered through the event callback.
    fn stop(&mut self) -> Result<(), RecorderError>;
}
