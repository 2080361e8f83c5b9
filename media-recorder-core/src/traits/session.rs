use crate::models::artifact::MediaArtifact;
use crate::models::error::RecorderError;
use crate::models::status::RecorderStatus;

/// Main recording session interface.
///
/// Binds a capture stream and a recorder object to the status state
/// machine and assembles the recorded output into a single artifact.
pub trait MediaRecorderSession {
    /// Current session status.
    fn status(&self) -> RecorderStatus;

    /// The most recent acquisition or recording error.
    fn last_error(&self) -> Option<RecorderError>;

    /// The artifact assembled by the last completed recording.
    fn artifact(&self) -> Option<MediaArtifact>;

    /// Acquire the device stream. Transitions: idle → acquiring_media → ready.
    fn acquire_stream(&mut self) -> Result<(), RecorderError>;

    /// Start a recording session, acquiring a stream first if none is
    /// held. Transitions: ready → recording.
    fn start_recording(&mut self) -> Result<(), RecorderError>;

    /// Pause recording. Transitions: recording → paused.
    fn pause_recording(&mut self) -> Result<(), RecorderError>;

    /// Resume recording. Transitions: paused → recording.
    fn resume_recording(&mut self) -> Result<(), RecorderError>;

    /// Stop recording and assemble the artifact. Transitions:
    /// recording/paused → stopping → stopped. A no-op when nothing is
    /// recording.
    fn stop_recording(&mut self) -> Result<(), RecorderError>;

    /// Flush buffered recorder data into a chunk ahead of schedule.
    fn request_chunk(&mut self) -> Result<(), RecorderError>;

    /// Mute or unmute the stream's audio tracks.
    fn mute_audio(&mut self, muted: bool);

    fn is_audio_muted(&self) -> bool;

    /// Active recording duration in seconds, excluding paused time.
    fn duration_secs(&self) -> f64;
}
