//! # media-recorder-cpal
//!
//! cpal audio backend for media-recorder-kit.
//!
//! Provides:
//! - `CpalBackend` — `MediaBackend` implementation over the default cpal host
//! - `CpalCaptureStream` — device stream running on a dedicated capture thread
//! - `WavRecorder` — serializes the stream into streaming `audio/wav` chunks
//! - `devices` — input device enumeration
//!
//! ## Usage
//! ```ignore
//! use media_recorder_core::{MediaRecorderSession, RecorderSession, SessionConfig};
//! use media_recorder_cpal::CpalBackend;
//!
//! let mut session = RecorderSession::new(CpalBackend::new(), SessionConfig::default());
//! session.start_recording().unwrap();
//! // ...
//! session.stop_recording().unwrap();
//! let artifact = session.artifact();
//! ```

pub mod devices;
pub mod pcm_buffer;
pub mod recorder;
pub mod source;
pub mod wav;

pub use pcm_buffer::PcmBuffer;
pub use recorder::{WavRecorder, WAV_MIME_TYPES};
pub use source::{CpalBackend, CpalCaptureStream, SampleSink};
