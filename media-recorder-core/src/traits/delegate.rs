use crate::models::artifact::MediaArtifact;
use crate::models::chunk::MediaChunk;
use crate::models::error::RecorderError;
use crate::models::status::RecorderStatus;

/// Event delegate for recording session notifications.
///
/// Methods may be called from a backend thread, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called on every status transition.
    fn on_status_changed(&self, status: RecorderStatus);

    /// Called when the recorder emits an encoded chunk.
    fn on_chunk(&self, chunk: &MediaChunk);

    /// Called when the session reaches `stopped`. `None` when the
    /// recorder produced no data.
    fn on_stop(&self, artifact: Option<&MediaArtifact>);

    /// Called when acquisition or recording fails.
    fn on_error(&self, error: &RecorderError);
}
