use crate::models::capabilities::{MediaCapabilities, MediaDeviceInfo, MediaTrack, TrackKind};
use crate::models::constraints::{MediaConstraints, RecorderOptions};
use crate::models::error::RecorderError;

use super::recorder::{RecorderEventCallback, StreamRecorder};

/// A live capture stream handle.
///
/// Returned by `MediaBackend::acquire`. At most one recorder is attached
/// to a stream at a time.
pub trait CaptureStream: Send {
    /// Tracks carried by this stream.
    fn tracks(&self) -> Vec<MediaTrack>;

    /// Enable or disable every track of the given kind.
    ///
    /// A disabled audio track keeps its place in the timeline and records
    /// as silence.
    fn set_track_enabled(&mut self, kind: TrackKind, enabled: bool);

    /// Stop the underlying device capture and release the device.
    ///
    /// Idempotent.
    fn release(&mut self);
}

/// Who is responsible for releasing a stream.
///
/// Streams acquired by the session are released when the session stops or
/// drops; caller-supplied streams never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOwnership {
    Owned,
    External,
}

/// Platform entry point: acquires device streams and creates recorders.
///
/// Implemented by platform backends (e.g. the cpal audio backend) and
/// plugged into the generic `RecorderSession`.
pub trait MediaBackend: Send {
    type Stream: CaptureStream;
    type Recorder: StreamRecorder;

    /// What this backend can capture and encode.
    fn capabilities(&self) -> MediaCapabilities;

    /// Enumerate input devices available to `acquire`.
    fn devices(&self) -> Result<Vec<MediaDeviceInfo>, RecorderError>;

    /// Open a device stream satisfying `constraints`.
    fn acquire(&mut self, constraints: &MediaConstraints) -> Result<Self::Stream, RecorderError>;

    /// Create a recorder bound to `stream`.
    ///
    /// Events are delivered through `events`, possibly from a backend
    /// thread.
    fn create_recorder(
        &mut self,
        stream: &mut Self::Stream,
        options: &RecorderOptions,
        events: RecorderEventCallback,
    ) -> Result<Self::Recorder, RecorderError>;
}
