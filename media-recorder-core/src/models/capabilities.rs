use serde::{Deserialize, Serialize};

use super::constraints::MediaConstraints;
use super::error::RecorderError;

/// Kind of media carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Kind of input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    AudioInput,
    VideoInput,
    Display,
}

/// An input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
    pub is_default: bool,
}

/// A track carried by a live capture stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub id: String,
    pub label: String,
    pub kind: TrackKind,
    /// Disabled audio tracks record as silence.
    pub enabled: bool,
}

/// What a backend is able to capture and encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapabilities {
    pub audio_input: bool,
    pub video_input: bool,
    pub display_capture: bool,
    /// Artifact MIME types the backend's recorder can produce.
    pub mime_types: Vec<String>,
}

impl MediaCapabilities {
    /// Check a constraint set against these capabilities.
    ///
    /// Runs before any acquisition attempt so unsupported requests never
    /// touch a device.
    pub fn check(&self, constraints: &MediaConstraints) -> Result<(), RecorderError> {
        constraints
            .validate()
            .map_err(RecorderError::InvalidConstraints)?;

        if constraints.audio && !self.audio_input {
            return Err(RecorderError::NotSupported("audio capture".into()));
        }
        if constraints.video && !self.video_input {
            return Err(RecorderError::NotSupported("video capture".into()));
        }
        if constraints.screen && !self.display_capture {
            return Err(RecorderError::NotSupported("display capture".into()));
        }
        Ok(())
    }

    pub fn supports_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime_type))
    }
}
