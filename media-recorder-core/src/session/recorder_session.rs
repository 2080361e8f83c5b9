use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::artifact::MediaArtifact;
use crate::models::capabilities::{MediaDeviceInfo, MediaTrack, TrackKind};
use crate::models::chunk::MediaChunk;
use crate::models::constraints::SessionConfig;
use crate::models::error::RecorderError;
use crate::models::status::RecorderStatus;
use crate::traits::backend::{CaptureStream, MediaBackend, StreamOwnership};
use crate::traits::delegate::RecorderDelegate;
use crate::traits::recorder::{RecorderEvent, RecorderEventCallback, StreamRecorder};
use crate::traits::session::MediaRecorderSession;

/// Internal mutable session state, protected by `parking_lot::Mutex`.
///
/// Shared with the recorder event callback, which may run on a backend
/// thread.
struct SessionState {
    status: RecorderStatus,
    error: Option<RecorderError>,
    chunks: Vec<MediaChunk>,
    artifact: Option<MediaArtifact>,
    audio_muted: bool,
    capture_start: Option<Instant>,
    paused_duration: Duration,
    last_pause_time: Option<Instant>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: RecorderStatus::Idle,
            error: None,
            chunks: Vec::new(),
            artifact: None,
            audio_muted: false,
            capture_start: None,
            paused_duration: Duration::ZERO,
            last_pause_time: None,
        }
    }

    /// Active recording time so far, excluding completed and ongoing pauses.
    fn elapsed_duration(&self) -> f64 {
        let Some(start) = self.capture_start else {
            return 0.0;
        };
        let mut active = start.elapsed().saturating_sub(self.paused_duration);
        if let Some(pause_start) = self.last_pause_time {
            active = active.saturating_sub(pause_start.elapsed());
        }
        active.as_secs_f64()
    }
}

/// Component-lifecycle-bound recording state container.
///
/// Holds at most one live capture stream and, while a session is active,
/// one recorder object created fresh per session. Generic over the
/// platform backend via the `MediaBackend` trait.
///
/// All mutation happens through this handle or through the recorder event
/// callback; the shared-state mutex exists only so backend threads can
/// deliver events.
///
/// Dropping the session stops a live recorder and releases an owned
/// stream.
pub struct RecorderSession<B: MediaBackend> {
    backend: B,
    config: SessionConfig,
    stream: Option<B::Stream>,
    ownership: StreamOwnership,
    recorder: Option<B::Recorder>,
    state: Arc<Mutex<SessionState>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl<B: MediaBackend> RecorderSession<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            stream: None,
            ownership: StreamOwnership::Owned,
            recorder: None,
            state: Arc::new(Mutex::new(SessionState::new())),
            delegate: None,
        }
    }

    /// Register the lifecycle delegate. Set it before starting a
    /// recording; the recorder event callback captures it at start time.
    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Hand the session a caller-owned stream.
    ///
    /// The session records from it but never releases it; lifecycle stays
    /// with the caller.
    pub fn use_external_stream(&mut self, stream: B::Stream) -> Result<(), RecorderError> {
        {
            let state = self.state.lock();
            if state.status.is_active() || state.status == RecorderStatus::AcquiringMedia {
                return Err(RecorderError::InvalidState(
                    "cannot replace the stream while a session is active".into(),
                ));
            }
        }

        self.release_stream();
        self.stream = Some(stream);
        self.ownership = StreamOwnership::External;
        self.apply_mute();
        self.set_status(RecorderStatus::Ready);
        Ok(())
    }

    /// Enumerate input devices offered by the backend.
    pub fn devices(&self) -> Result<Vec<MediaDeviceInfo>, RecorderError> {
        self.backend.devices()
    }

    /// Tracks of the held stream, if any.
    pub fn tracks(&self) -> Vec<MediaTrack> {
        self.stream
            .as_ref()
            .map(|s| s.tracks())
            .unwrap_or_default()
    }

    /// Drop the held stream, releasing the device when the session owns it.
    pub fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if self.ownership == StreamOwnership::Owned {
                stream.release();
            }
        }
        self.ownership = StreamOwnership::Owned;
    }

    /// Forget the assembled artifact.
    pub fn clear_artifact(&mut self) {
        self.state.lock().artifact = None;
    }

    // --- Internal helpers ---

    fn set_status(&self, status: RecorderStatus) {
        set_status_shared(&self.state, self.delegate.as_ref(), status);
    }

    /// Record `error` and land in `failed`. Used for acquisition and
    /// recorder construction/start failures.
    fn fail(&self, error: RecorderError) {
        self.state.lock().error = Some(error.clone());
        if let Some(delegate) = &self.delegate {
            delegate.on_error(&error);
        }
        self.set_status(RecorderStatus::Failed);
    }

    fn apply_mute(&mut self) {
        let muted = self.state.lock().audio_muted;
        if let Some(stream) = self.stream.as_mut() {
            stream.set_track_enabled(TrackKind::Audio, !muted);
        }
    }

    fn event_callback(&self) -> RecorderEventCallback {
        let state = Arc::clone(&self.state);
        let delegate = self.delegate.clone();
        Arc::new(move |event| handle_event(&state, delegate.as_ref(), event))
    }
}

impl<B: MediaBackend> MediaRecorderSession for RecorderSession<B> {
    fn status(&self) -> RecorderStatus {
        self.state.lock().status
    }

    fn last_error(&self) -> Option<RecorderError> {
        self.state.lock().error.clone()
    }

    fn artifact(&self) -> Option<MediaArtifact> {
        self.state.lock().artifact.clone()
    }

    fn acquire_stream(&mut self) -> Result<(), RecorderError> {
        {
            let state = self.state.lock();
            if !state.status.can_acquire() {
                return Err(RecorderError::InvalidState(
                    "cannot acquire while a session is active".into(),
                ));
            }
        }

        // Reject unsupported constraints before any acquisition attempt.
        // The caller gets the error directly; no status transition.
        if let Err(e) = self.backend.capabilities().check(&self.config.constraints) {
            self.state.lock().error = Some(e.clone());
            return Err(e);
        }

        self.state.lock().error = None;
        self.release_stream();
        self.set_status(RecorderStatus::AcquiringMedia);

        match self.backend.acquire(&self.config.constraints) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.ownership = StreamOwnership::Owned;
                self.apply_mute();
                self.set_status(RecorderStatus::Ready);
                Ok(())
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    fn start_recording(&mut self) -> Result<(), RecorderError> {
        {
            let state = self.state.lock();
            if state.status.is_active() || state.status == RecorderStatus::AcquiringMedia {
                return Err(RecorderError::InvalidState(
                    "a recording is already in progress".into(),
                ));
            }
        }

        if self.stream.is_none() {
            self.acquire_stream()?;
        }

        let options = self.config.recorder_options.clone();
        if let Some(mime_type) = &options.mime_type {
            if !self.backend.capabilities().supports_mime_type(mime_type) {
                let e = RecorderError::NotSupported(format!("mime type {}", mime_type));
                self.fail(e.clone());
                return Err(e);
            }
        }

        {
            let mut state = self.state.lock();
            state.error = None;
            state.chunks.clear();
        }

        let events = self.event_callback();
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => {
                let e = RecorderError::StreamFailed("no stream acquired".into());
                self.fail(e.clone());
                return Err(e);
            }
        };

        let mut recorder = match self.backend.create_recorder(stream, &options, events) {
            Ok(recorder) => recorder,
            Err(e) => {
                self.fail(e.clone());
                return Err(e);
            }
        };

        if let Err(e) = recorder.start(options.timeslice) {
            drop(recorder);
            self.fail(e.clone());
            return Err(e);
        }
        self.recorder = Some(recorder);

        {
            let mut state = self.state.lock();
            state.capture_start = Some(Instant::now());
            state.paused_duration = Duration::ZERO;
            state.last_pause_time = None;
        }
        self.set_status(RecorderStatus::Recording);
        log::debug!("recording started");
        Ok(())
    }

    fn pause_recording(&mut self) -> Result<(), RecorderError> {
        if !self.state.lock().status.is_recording() {
            return Err(RecorderError::InvalidState(
                "can only pause while recording".into(),
            ));
        }
        let recorder = self
            .recorder
            .as_mut()
            .ok_or_else(|| RecorderError::InvalidState("no active recorder".into()))?;

        recorder.pause()?;
        self.state.lock().last_pause_time = Some(Instant::now());
        self.set_status(RecorderStatus::Paused);
        Ok(())
    }

    fn resume_recording(&mut self) -> Result<(), RecorderError> {
        if !self.state.lock().status.is_paused() {
            return Err(RecorderError::InvalidState(
                "can only resume while paused".into(),
            ));
        }
        let recorder = self
            .recorder
            .as_mut()
            .ok_or_else(|| RecorderError::InvalidState("no active recorder".into()))?;

        recorder.resume()?;
        {
            let mut state = self.state.lock();
            if let Some(pause_start) = state.last_pause_time.take() {
                state.paused_duration += pause_start.elapsed();
            }
        }
        self.set_status(RecorderStatus::Recording);
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), RecorderError> {
        let Some(mut recorder) = self.recorder.take() else {
            // Stop before start is a no-op.
            return Ok(());
        };

        let status = self.state.lock().status;
        if !(status.is_recording() || status.is_paused()) {
            // The session already ended (e.g. a recorder fault); discard
            // the stale handle.
            return Ok(());
        }

        // Synchronous flip; the Stopped event finishes the transition.
        self.set_status(RecorderStatus::Stopping);

        // Close out an ongoing pause so the final duration is correct.
        {
            let mut state = self.state.lock();
            if let Some(pause_start) = state.last_pause_time.take() {
                state.paused_duration += pause_start.elapsed();
            }
        }

        let stopped = recorder.stop();
        drop(recorder);
        self.release_stream();

        if let Err(e) = stopped {
            log::warn!("recorder stop failed: {}", e);
            self.state.lock().error = Some(e.clone());
            if let Some(delegate) = &self.delegate {
                delegate.on_error(&e);
            }
            self.set_status(RecorderStatus::Idle);
            return Err(e);
        }
        Ok(())
    }

    fn request_chunk(&mut self) -> Result<(), RecorderError> {
        if !self.state.lock().status.is_active() {
            return Err(RecorderError::InvalidState(
                "no recording in progress".into(),
            ));
        }
        let recorder = self
            .recorder
            .as_mut()
            .ok_or_else(|| RecorderError::InvalidState("no active recorder".into()))?;
        recorder.request_chunk()
    }

    fn mute_audio(&mut self, muted: bool) {
        self.state.lock().audio_muted = muted;
        self.apply_mute();
    }

    fn is_audio_muted(&self) -> bool {
        self.state.lock().audio_muted
    }

    fn duration_secs(&self) -> f64 {
        self.state.lock().elapsed_duration()
    }
}

impl<B: MediaBackend> Drop for RecorderSession<B> {
    fn drop(&mut self) {
        if let Some(mut recorder) = self.recorder.take() {
            if let Err(e) = recorder.stop() {
                log::warn!("failed to stop recorder during teardown: {}", e);
            }
        }
        self.release_stream();
    }
}

fn set_status_shared(
    state: &Mutex<SessionState>,
    delegate: Option<&Arc<dyn RecorderDelegate>>,
    status: RecorderStatus,
) {
    state.lock().status = status;
    if let Some(delegate) = delegate {
        delegate.on_status_changed(status);
    }
}

/// Recorder event handling, shared between the session handle and backend
/// threads through the event callback.
fn handle_event(
    state: &Arc<Mutex<SessionState>>,
    delegate: Option<&Arc<dyn RecorderDelegate>>,
    event: RecorderEvent,
) {
    match event {
        RecorderEvent::ChunkAvailable(chunk) => {
            if chunk.is_empty() {
                return;
            }
            state.lock().chunks.push(chunk.clone());
            if let Some(delegate) = delegate {
                delegate.on_chunk(&chunk);
            }
        }
        RecorderEvent::Stopped => {
            let artifact = {
                let mut s = state.lock();
                let duration = s.elapsed_duration();
                let chunks = std::mem::take(&mut s.chunks);
                let artifact = MediaArtifact::assemble(&chunks, duration);
                s.artifact = artifact.clone();
                s.capture_start = None;
                s.paused_duration = Duration::ZERO;
                s.last_pause_time = None;
                artifact
            };
            set_status_shared(state, delegate, RecorderStatus::Stopped);
            if let Some(delegate) = delegate {
                delegate.on_stop(artifact.as_ref());
            }
        }
        RecorderEvent::Error(error) => {
            log::warn!("recorder failed: {}", error);
            state.lock().error = Some(error.clone());
            if let Some(delegate) = delegate {
                delegate.on_error(&error);
            }
            set_status_shared(state, delegate, RecorderStatus::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capabilities::{DeviceKind, MediaCapabilities, MediaDeviceInfo};
    use crate::models::constraints::MediaConstraints;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        acquires: AtomicUsize,
        releases: AtomicUsize,
    }

    struct MockStream {
        counters: Arc<Counters>,
        audio_enabled: bool,
    }

    impl MockStream {
        fn new(counters: Arc<Counters>) -> Self {
            Self {
                counters,
                audio_enabled: true,
            }
        }
    }

    impl CaptureStream for MockStream {
        fn tracks(&self) -> Vec<MediaTrack> {
            vec![MediaTrack {
                id: "mock-audio-0".into(),
                label: "Mock Microphone".into(),
                kind: TrackKind::Audio,
                enabled: self.audio_enabled,
            }]
        }

        fn set_track_enabled(&mut self, kind: TrackKind, enabled: bool) {
            if kind == TrackKind::Audio {
                self.audio_enabled = enabled;
            }
        }

        fn release(&mut self) {
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockRecorder {
        events: RecorderEventCallback,
        fail_start: Option<RecorderError>,
        stop_script: Vec<RecorderEvent>,
    }

    impl StreamRecorder for MockRecorder {
        fn start(&mut self, _timeslice: Option<Duration>) -> Result<(), RecorderError> {
            match self.fail_start.take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn pause(&mut self) -> Result<(), RecorderError> {
            Ok(())
        }

        fn resume(&mut self) -> Result<(), RecorderError> {
            Ok(())
        }

        fn request_chunk(&mut self) -> Result<(), RecorderError> {
            Ok(())
        }

        fn stop(&mut self) -> Result<(), RecorderError> {
            for event in self.stop_script.drain(..) {
                (self.events)(event);
            }
            Ok(())
        }
    }

    /// Shared knobs the tests keep after the backend moves into a session.
    #[derive(Clone)]
    struct MockHandles {
        counters: Arc<Counters>,
        fail_acquire: Arc<Mutex<Option<RecorderError>>>,
        fail_start: Arc<Mutex<Option<RecorderError>>>,
        stop_script: Arc<Mutex<Vec<RecorderEvent>>>,
        events: Arc<Mutex<Option<RecorderEventCallback>>>,
    }

    struct MockBackend {
        caps: MediaCapabilities,
        handles: MockHandles,
    }

    impl MediaBackend for MockBackend {
        type Stream = MockStream;
        type Recorder = MockRecorder;

        fn capabilities(&self) -> MediaCapabilities {
            self.caps.clone()
        }

        fn devices(&self) -> Result<Vec<MediaDeviceInfo>, RecorderError> {
            Ok(vec![MediaDeviceInfo {
                id: "mock-mic".into(),
                label: "Mock Microphone".into(),
                kind: DeviceKind::AudioInput,
                is_default: true,
            }])
        }

        fn acquire(
            &mut self,
            _constraints: &MediaConstraints,
        ) -> Result<MockStream, RecorderError> {
            self.handles.counters.acquires.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.handles.fail_acquire.lock().clone() {
                return Err(e);
            }
            Ok(MockStream::new(Arc::clone(&self.handles.counters)))
        }

        fn create_recorder(
            &mut self,
            _stream: &mut MockStream,
            _options: &crate::models::constraints::RecorderOptions,
            events: RecorderEventCallback,
        ) -> Result<MockRecorder, RecorderError> {
            *self.handles.events.lock() = Some(Arc::clone(&events));
            Ok(MockRecorder {
                events,
                fail_start: self.handles.fail_start.lock().clone(),
                stop_script: self.handles.stop_script.lock().clone(),
            })
        }
    }

    fn audio_caps() -> MediaCapabilities {
        MediaCapabilities {
            audio_input: true,
            video_input: false,
            display_capture: false,
            mime_types: vec!["audio/wav".into()],
        }
    }

    fn mock_backend(caps: MediaCapabilities) -> (MockBackend, MockHandles) {
        let handles = MockHandles {
            counters: Arc::new(Counters::default()),
            fail_acquire: Arc::new(Mutex::new(None)),
            fail_start: Arc::new(Mutex::new(None)),
            stop_script: Arc::new(Mutex::new(Vec::new())),
            events: Arc::new(Mutex::new(None)),
        };
        let backend = MockBackend {
            caps,
            handles: handles.clone(),
        };
        (backend, handles)
    }

    fn chunk(data: &[u8], sequence: u64) -> MediaChunk {
        MediaChunk::new(data.to_vec(), "audio/wav", sequence)
    }

    #[derive(Default)]
    struct RecordingLog {
        statuses: Mutex<Vec<RecorderStatus>>,
        chunks: Mutex<Vec<u64>>,
        stops: Mutex<Vec<Option<String>>>,
        errors: Mutex<Vec<RecorderError>>,
    }

    impl RecorderDelegate for RecordingLog {
        fn on_status_changed(&self, status: RecorderStatus) {
            self.statuses.lock().push(status);
        }

        fn on_chunk(&self, chunk: &MediaChunk) {
            self.chunks.lock().push(chunk.sequence);
        }

        fn on_stop(&self, artifact: Option<&MediaArtifact>) {
            self.stops.lock().push(artifact.map(|a| a.mime_type.clone()));
        }

        fn on_error(&self, error: &RecorderError) {
            self.errors.lock().push(error.clone());
        }
    }

    #[test]
    fn full_session_assembles_chunks_into_artifact() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![
            RecorderEvent::ChunkAvailable(chunk(b"RIFF-head", 0)),
            RecorderEvent::ChunkAvailable(chunk(b"-pcm-tail", 1)),
            RecorderEvent::Stopped,
        ];

        let log = Arc::new(RecordingLog::default());
        let mut session = RecorderSession::new(backend, SessionConfig::default());
        session.set_delegate(log.clone());

        session.start_recording().unwrap();
        assert_eq!(session.status(), RecorderStatus::Recording);

        session.stop_recording().unwrap();
        assert_eq!(session.status(), RecorderStatus::Stopped);

        let artifact = session.artifact().unwrap();
        assert_eq!(artifact.data, b"RIFF-head-pcm-tail");
        assert_eq!(artifact.mime_type, "audio/wav");
        assert_eq!(artifact.metadata.chunk_count, 2);

        // stopping is flipped synchronously, before the stop notification.
        let statuses = log.statuses.lock().clone();
        let stopping = statuses
            .iter()
            .position(|s| *s == RecorderStatus::Stopping)
            .unwrap();
        let stopped = statuses
            .iter()
            .position(|s| *s == RecorderStatus::Stopped)
            .unwrap();
        assert!(stopping < stopped);
        assert_eq!(log.chunks.lock().as_slice(), &[0, 1]);
        assert_eq!(log.stops.lock().as_slice(), &[Some("audio/wav".into())]);
    }

    #[test]
    fn stop_before_start_is_a_noop() {
        let (backend, _handles) = mock_backend(audio_caps());
        let log = Arc::new(RecordingLog::default());
        let mut session = RecorderSession::new(backend, SessionConfig::default());
        session.set_delegate(log.clone());

        assert!(session.stop_recording().is_ok());
        assert_eq!(session.status(), RecorderStatus::Idle);
        assert!(log.statuses.lock().is_empty());
        assert!(log.stops.lock().is_empty());
    }

    #[test]
    fn empty_recording_yields_no_artifact() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![RecorderEvent::Stopped];

        let log = Arc::new(RecordingLog::default());
        let mut session = RecorderSession::new(backend, SessionConfig::default());
        session.set_delegate(log.clone());

        session.start_recording().unwrap();
        session.stop_recording().unwrap();

        assert_eq!(session.status(), RecorderStatus::Stopped);
        assert!(session.artifact().is_none());
        assert_eq!(log.stops.lock().as_slice(), &[None]);
    }

    #[test]
    fn unsupported_constraints_rejected_before_acquisition() {
        let (backend, handles) = mock_backend(audio_caps());
        let config = SessionConfig {
            constraints: MediaConstraints {
                video: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = RecorderSession::new(backend, config);

        let err = session.acquire_stream().unwrap_err();
        assert!(matches!(err, RecorderError::NotSupported(_)));
        assert_eq!(handles.counters.acquires.load(Ordering::SeqCst), 0);
        assert_eq!(session.status(), RecorderStatus::Idle);
        assert_eq!(session.last_error(), Some(err));
    }

    #[test]
    fn unsupported_mime_type_rejected_before_recorder_creation() {
        let (backend, _handles) = mock_backend(audio_caps());
        let config = SessionConfig {
            recorder_options: crate::models::constraints::RecorderOptions {
                mime_type: Some("video/webm".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = RecorderSession::new(backend, config);

        let err = session.start_recording().unwrap_err();
        assert!(matches!(err, RecorderError::NotSupported(_)));
        assert_eq!(session.status(), RecorderStatus::Failed);
    }

    #[test]
    fn acquisition_failure_enters_failed() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.fail_acquire.lock() = Some(RecorderError::DeviceNotAvailable);

        let log = Arc::new(RecordingLog::default());
        let mut session = RecorderSession::new(backend, SessionConfig::default());
        session.set_delegate(log.clone());

        let err = session.acquire_stream().unwrap_err();
        assert_eq!(err, RecorderError::DeviceNotAvailable);
        assert_eq!(session.status(), RecorderStatus::Failed);
        assert_eq!(session.last_error(), Some(RecorderError::DeviceNotAvailable));
        assert_eq!(log.errors.lock().len(), 1);
    }

    #[test]
    fn recorder_start_failure_enters_failed() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.fail_start.lock() =
            Some(RecorderError::RecorderFailed("encoder unavailable".into()));

        let mut session = RecorderSession::new(backend, SessionConfig::default());

        let err = session.start_recording().unwrap_err();
        assert!(matches!(err, RecorderError::RecorderFailed(_)));
        assert_eq!(session.status(), RecorderStatus::Failed);

        // Recovery: clear the fault and start again.
        *handles.fail_start.lock() = None;
        *handles.stop_script.lock() = vec![RecorderEvent::Stopped];
        session.start_recording().unwrap();
        assert_eq!(session.status(), RecorderStatus::Recording);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn async_recorder_error_returns_to_idle() {
        let (backend, handles) = mock_backend(audio_caps());
        let log = Arc::new(RecordingLog::default());
        let mut session = RecorderSession::new(backend, SessionConfig::default());
        session.set_delegate(log.clone());

        session.start_recording().unwrap();

        // Fault delivered from the backend, as if from a capture thread.
        let events = handles.events.lock().clone().unwrap();
        events(RecorderEvent::Error(RecorderError::RecorderFailed(
            "device unplugged".into(),
        )));

        assert_eq!(session.status(), RecorderStatus::Idle);
        assert!(matches!(
            session.last_error(),
            Some(RecorderError::RecorderFailed(_))
        ));
        assert_eq!(log.errors.lock().len(), 1);

        // A later stop only discards the stale recorder handle.
        assert!(session.stop_recording().is_ok());
        assert_eq!(session.status(), RecorderStatus::Idle);
    }

    #[test]
    fn pause_and_resume_are_guarded() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![RecorderEvent::Stopped];
        let mut session = RecorderSession::new(backend, SessionConfig::default());

        assert!(session.pause_recording().is_err());

        session.start_recording().unwrap();
        session.pause_recording().unwrap();
        assert_eq!(session.status(), RecorderStatus::Paused);
        assert!(session.pause_recording().is_err());

        session.resume_recording().unwrap();
        assert_eq!(session.status(), RecorderStatus::Recording);
        assert!(session.resume_recording().is_err());

        session.stop_recording().unwrap();
        assert_eq!(session.status(), RecorderStatus::Stopped);
    }

    #[test]
    fn request_chunk_requires_active_session() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![RecorderEvent::Stopped];
        let mut session = RecorderSession::new(backend, SessionConfig::default());

        assert!(session.request_chunk().is_err());
        session.start_recording().unwrap();
        assert!(session.request_chunk().is_ok());
    }

    #[test]
    fn mute_audio_toggles_stream_tracks() {
        let (backend, _handles) = mock_backend(audio_caps());
        let mut session = RecorderSession::new(backend, SessionConfig::default());

        session.acquire_stream().unwrap();
        assert!(session.tracks()[0].enabled);

        session.mute_audio(true);
        assert!(session.is_audio_muted());
        assert!(!session.tracks()[0].enabled);

        session.mute_audio(false);
        assert!(session.tracks()[0].enabled);
    }

    #[test]
    fn owned_stream_released_on_stop() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![RecorderEvent::Stopped];
        let mut session = RecorderSession::new(backend, SessionConfig::default());

        session.start_recording().unwrap();
        session.stop_recording().unwrap();

        assert_eq!(handles.counters.releases.load(Ordering::SeqCst), 1);
        assert!(session.tracks().is_empty());
    }

    #[test]
    fn external_stream_is_never_released() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![
            RecorderEvent::ChunkAvailable(chunk(b"bytes", 0)),
            RecorderEvent::Stopped,
        ];
        let mut session = RecorderSession::new(backend, SessionConfig::default());

        let external = MockStream::new(Arc::clone(&handles.counters));
        session.use_external_stream(external).unwrap();
        assert_eq!(session.status(), RecorderStatus::Ready);

        session.start_recording().unwrap();
        session.stop_recording().unwrap();

        assert_eq!(handles.counters.acquires.load(Ordering::SeqCst), 0);
        assert_eq!(handles.counters.releases.load(Ordering::SeqCst), 0);
        assert!(session.artifact().is_some());
    }

    #[test]
    fn second_recording_replaces_artifact() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![
            RecorderEvent::ChunkAvailable(chunk(b"first", 0)),
            RecorderEvent::Stopped,
        ];
        let mut session = RecorderSession::new(backend, SessionConfig::default());

        session.start_recording().unwrap();
        session.stop_recording().unwrap();
        assert_eq!(session.artifact().unwrap().data, b"first");

        *handles.stop_script.lock() = vec![
            RecorderEvent::ChunkAvailable(chunk(b"second", 0)),
            RecorderEvent::Stopped,
        ];
        session.start_recording().unwrap();
        session.stop_recording().unwrap();

        assert_eq!(session.artifact().unwrap().data, b"second");
        // The first stream was released, so a fresh one was acquired.
        assert_eq!(handles.counters.acquires.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_artifact_empties_the_slot() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![
            RecorderEvent::ChunkAvailable(chunk(b"bytes", 0)),
            RecorderEvent::Stopped,
        ];
        let mut session = RecorderSession::new(backend, SessionConfig::default());

        session.start_recording().unwrap();
        session.stop_recording().unwrap();
        assert!(session.artifact().is_some());

        session.clear_artifact();
        assert!(session.artifact().is_none());
    }

    #[test]
    fn drop_releases_owned_stream() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![RecorderEvent::Stopped];
        {
            let mut session = RecorderSession::new(backend, SessionConfig::default());
            session.start_recording().unwrap();
        }
        assert_eq!(handles.counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_chunks_are_discarded() {
        let (backend, handles) = mock_backend(audio_caps());
        *handles.stop_script.lock() = vec![
            RecorderEvent::ChunkAvailable(chunk(b"", 0)),
            RecorderEvent::ChunkAvailable(chunk(b"data", 1)),
            RecorderEvent::Stopped,
        ];
        let log = Arc::new(RecordingLog::default());
        let mut session = RecorderSession::new(backend, SessionConfig::default());
        session.set_delegate(log.clone());

        session.start_recording().unwrap();
        session.stop_recording().unwrap();

        let artifact = session.artifact().unwrap();
        assert_eq!(artifact.data, b"data");
        assert_eq!(artifact.metadata.chunk_count, 1);
        assert_eq!(log.chunks.lock().as_slice(), &[1]);
    }
}
