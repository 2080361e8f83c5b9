//! # media-recorder-core
//!
//! Platform-agnostic media recording core library.
//!
//! Binds a device capture stream and a recorder object to a small status
//! state machine (idle → acquiring_media → ready → recording ↔ paused →
//! stopping → stopped/failed) and assembles the recorder's encoded chunks
//! into a single retrievable artifact. Platform backends implement the
//! `MediaBackend` seam and plug into the generic `RecorderSession`.
//!
//! ## Architecture
//!
//! ```text
//! media-recorder-core (this crate)
//! ├── traits/   ← MediaBackend, CaptureStream, StreamRecorder, RecorderDelegate
//! ├── models/   ← RecorderStatus, RecorderError, MediaConstraints, MediaChunk, MediaArtifact
//! └── session/  ← RecorderSession (generic state container)
//! ```

pub mod models;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::artifact::{ArtifactMetadata, MediaArtifact};
pub use models::capabilities::{DeviceKind, MediaCapabilities, MediaDeviceInfo, MediaTrack, TrackKind};
pub use models::chunk::MediaChunk;
pub use models::constraints::{MediaConstraints, RecorderOptions, SessionConfig};
pub use models::error::RecorderError;
pub use models::status::RecorderStatus;
pub use session::recorder_session::RecorderSession;
pub use traits::backend::{CaptureStream, MediaBackend, StreamOwnership};
pub use traits::delegate::RecorderDelegate;
pub use traits::recorder::{RecorderEvent, RecorderEventCallback, StreamRecorder};
pub use traits::session::MediaRecorderSession;
