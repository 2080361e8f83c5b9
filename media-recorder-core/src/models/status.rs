use serde::{Deserialize, Serialize};

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → acquiring_media → ready → recording ↔ paused
///             ↓                        ↓         ↓
///           failed                  stopping → stopped
/// ```
///
/// Acquisition and recorder start failures land in `failed`; an
/// asynchronous recorder fault during a session returns to `idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderStatus {
    Idle,
    AcquiringMedia,
    Ready,
    Recording,
    Paused,
    Stopping,
    Stopped,
    Failed,
}

impl Default for RecorderStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl RecorderStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// A recorder object exists for the current session.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused | Self::Stopping)
    }

    /// Whether a new stream acquisition may begin from this state.
    pub fn can_acquire(&self) -> bool {
        matches!(self, Self::Idle | Self::Ready | Self::Stopped | Self::Failed)
    }
}
