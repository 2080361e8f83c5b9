use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which kinds of media a capture stream should carry, plus device hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConstraints {
    /// Capture microphone audio.
    pub audio: bool,

    /// Capture camera video.
    pub video: bool,

    /// Capture display contents instead of a camera.
    pub screen: bool,

    /// Specific input device ID, or None for the system default.
    pub device_id: Option<String>,

    /// Preferred sample rate in Hz (backend may pick the closest match).
    pub sample_rate: Option<u32>,

    /// Preferred channel count (1 = mono, 2 = stereo).
    pub channels: Option<u16>,
}

impl MediaConstraints {
    /// Audio-only constraints for the default input device.
    pub fn audio() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.audio && !self.video && !self.screen {
            return Err("no media kind requested".into());
        }
        if self.sample_rate == Some(0) {
            return Err("sample rate must be positive".into());
        }
        if let Some(channels) = self.channels {
            if !(1..=2).contains(&channels) {
                return Err(format!("unsupported channel count: {}", channels));
            }
        }
        Ok(())
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: false,
            screen: false,
            device_id: None,
            sample_rate: None,
            channels: None,
        }
    }
}

/// Options for the recorder object created fresh per recording session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderOptions {
    /// Requested artifact MIME type, or None for the backend default.
    pub mime_type: Option<String>,

    /// Emit a chunk at least this often. None = one chunk at stop time.
    pub timeslice: Option<Duration>,

    /// Target audio bitrate in bits per second (hint only).
    pub audio_bitrate: Option<u32>,
}

/// Caller-supplied configuration bundle handed to the session at
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub constraints: MediaConstraints,
    pub recorder_options: RecorderOptions,
}
