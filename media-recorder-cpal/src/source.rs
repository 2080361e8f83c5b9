//! cpal device stream acquisition.
//!
//! A cpal input stream is not `Send`, so each acquired stream lives on a
//! dedicated capture thread: the thread resolves the device, opens the
//! stream, reports the negotiated format back through a channel, and
//! parks until the stream is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::SampleFormat;
use parking_lot::Mutex;

use media_recorder_core::models::capabilities::{MediaCapabilities, MediaDeviceInfo, MediaTrack, TrackKind};
use media_recorder_core::models::constraints::{MediaConstraints, RecorderOptions};
use media_recorder_core::models::error::RecorderError;
use media_recorder_core::traits::backend::{CaptureStream, MediaBackend};
use media_recorder_core::traits::recorder::RecorderEventCallback;

use crate::devices;
use crate::recorder::{WavRecorder, WAV_MIME_TYPES};

/// Callback invoked when a sample buffer is available.
///
/// Parameters:
/// - `samples`: interleaved f32 samples.
/// - `sample_rate`: sample rate of the delivered audio in Hz.
/// - `channels`: number of interleaved channels.
///
/// Fires on the cpal audio thread; keep processing minimal.
pub type SampleSink = Arc<dyn Fn(&[f32], u32, u16) + Send + Sync + 'static>;

/// State shared between a stream handle, its capture thread, and an
/// attached recorder.
pub(crate) struct SharedStreamState {
    pub(crate) running: AtomicBool,
    pub(crate) audio_enabled: AtomicBool,
    /// The attached recorder's sink; at most one at a time.
    pub(crate) sink: Mutex<Option<SampleSink>>,
}

impl SharedStreamState {
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            audio_enabled: AtomicBool::new(true),
            sink: Mutex::new(None),
        }
    }
}

/// Negotiated stream format, reported by the capture thread.
struct StreamFormat {
    label: String,
    sample_rate: u32,
    channels: u16,
}

/// A live audio capture stream backed by a cpal input device.
pub struct CpalCaptureStream {
    shared: Arc<SharedStreamState>,
    device_label: String,
    sample_rate: u32,
    channels: u16,
    capture_handle: Option<thread::JoinHandle<()>>,
}

impl CpalCaptureStream {
    /// Open a stream satisfying `constraints`.
    ///
    /// Blocks until the capture thread has the device stream running, so
    /// acquisition failures surface here.
    pub fn open(constraints: &MediaConstraints) -> Result<Self, RecorderError> {
        let shared = Arc::new(SharedStreamState::new());
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_shared = Arc::clone(&shared);
        let thread_constraints = constraints.clone();
        let handle = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || capture_loop(thread_shared, thread_constraints, ready_tx))
            .map_err(|e| RecorderError::Unknown(format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(format)) => {
                log::debug!(
                    "capture stream open: {} ({} Hz, {} ch)",
                    format.label,
                    format.sample_rate,
                    format.channels
                );
                Ok(Self {
                    shared,
                    device_label: format.label,
                    sample_rate: format.sample_rate,
                    channels: format.channels,
                    capture_handle: Some(handle),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(RecorderError::StreamFailed(
                    "capture thread exited before reporting a format".into(),
                ))
            }
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub(crate) fn shared(&self) -> Arc<SharedStreamState> {
        Arc::clone(&self.shared)
    }
}

impl CaptureStream for CpalCaptureStream {
    fn tracks(&self) -> Vec<MediaTrack> {
        vec![MediaTrack {
            id: self.device_label.clone(),
            label: self.device_label.clone(),
            kind: TrackKind::Audio,
            enabled: self.shared.audio_enabled.load(Ordering::SeqCst),
        }]
    }

    fn set_track_enabled(&mut self, kind: TrackKind, enabled: bool) {
        if kind == TrackKind::Audio {
            self.shared.audio_enabled.store(enabled, Ordering::SeqCst);
        }
    }

    fn release(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        *self.shared.sink.lock() = None;
        if let Some(handle) = self.capture_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// `MediaBackend` over the default cpal host. Audio capture only.
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for CpalBackend {
    type Stream = CpalCaptureStream;
    type Recorder = WavRecorder;

    fn capabilities(&self) -> MediaCapabilities {
        use cpal::traits::HostTrait;
        MediaCapabilities {
            audio_input: cpal::default_host().default_input_device().is_some(),
            video_input: false,
            display_capture: false,
            mime_types: WAV_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn devices(&self) -> Result<Vec<MediaDeviceInfo>, RecorderError> {
        devices::list_input_devices()
    }

    fn acquire(&mut self, constraints: &MediaConstraints) -> Result<CpalCaptureStream, RecorderError> {
        if !constraints.audio {
            return Err(RecorderError::NotSupported(
                "this backend captures audio only".into(),
            ));
        }
        CpalCaptureStream::open(constraints)
    }

    fn create_recorder(
        &mut self,
        stream: &mut CpalCaptureStream,
        options: &RecorderOptions,
        events: RecorderEventCallback,
    ) -> Result<WavRecorder, RecorderError> {
        WavRecorder::new(stream, options, events)
    }
}

/// Capture thread body: all cpal device access happens here, since the
/// stream must be created and dropped on the same thread.
fn capture_loop(
    shared: Arc<SharedStreamState>,
    constraints: MediaConstraints,
    ready_tx: mpsc::Sender<Result<StreamFormat, RecorderError>>,
) {
    let device = match devices::resolve_input_device(constraints.device_id.as_deref()) {
        Ok(device) => device,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let label = device.name().unwrap_or_else(|_| "Default Input".into());

    let (config, sample_format) = match pick_config(&device, &constraints) {
        Ok(picked) => picked,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;

    let stream = match build_stream(&device, &config, sample_format, &shared, sample_rate, channels) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(RecorderError::StreamFailed(format!(
            "failed to start input stream: {}",
            e
        ))));
        return;
    }

    let _ = ready_tx.send(Ok(StreamFormat {
        label,
        sample_rate,
        channels,
    }));

    // Park until released; the stream delivers buffers on cpal's audio
    // thread in the meantime.
    while shared.running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }
    drop(stream);
}

/// Pick a stream config, honoring sample-rate and channel hints when a
/// supported range covers them, falling back to the device default.
fn pick_config(
    device: &cpal::Device,
    constraints: &MediaConstraints,
) -> Result<(cpal::StreamConfig, SampleFormat), RecorderError> {
    let default = device
        .default_input_config()
        .map_err(|e| RecorderError::StreamFailed(format!("no default input config: {}", e)))?;

    if constraints.sample_rate.is_some() || constraints.channels.is_some() {
        let rate = constraints.sample_rate.unwrap_or(default.sample_rate().0);
        if let Ok(supported) = device.supported_input_configs() {
            for range in supported {
                if let Some(channels) = constraints.channels {
                    if range.channels() != channels {
                        continue;
                    }
                }
                if rate >= range.min_sample_rate().0 && rate <= range.max_sample_rate().0 {
                    let config = range.with_sample_rate(cpal::SampleRate(rate));
                    let sample_format = config.sample_format();
                    return Ok((config.config(), sample_format));
                }
            }
        }
        log::warn!("no input config matches the requested hints, using the device default");
    }

    let sample_format = default.sample_format();
    Ok((default.config(), sample_format))
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: SampleFormat,
    shared: &Arc<SharedStreamState>,
    sample_rate: u32,
    channels: u16,
) -> Result<cpal::Stream, RecorderError> {
    let err_fn = |e: cpal::StreamError| log::error!("input stream error: {}", e);

    let result = match sample_format {
        SampleFormat::F32 => {
            let shared = Arc::clone(shared);
            device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    deliver(&shared, data, sample_rate, channels);
                },
                err_fn,
                None,
            )
        }
        SampleFormat::I16 => {
            let shared = Arc::clone(shared);
            device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> =
                        data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                    deliver(&shared, &samples, sample_rate, channels);
                },
                err_fn,
                None,
            )
        }
        SampleFormat::U16 => {
            let shared = Arc::clone(shared);
            device.build_input_stream(
                config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> = data
                        .iter()
                        .map(|&s| (s as f32 - 32768.0) / 32768.0)
                        .collect();
                    deliver(&shared, &samples, sample_rate, channels);
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(RecorderError::NotSupported(format!(
                "sample format {:?}",
                other
            )))
        }
    };

    result.map_err(|e| RecorderError::StreamFailed(format!("failed to open input stream: {}", e)))
}

/// Hand a sample buffer to the attached recorder, if any.
///
/// A disabled audio track keeps its place in the timeline: silence is
/// delivered instead of dropping the buffer.
fn deliver(shared: &SharedStreamState, samples: &[f32], sample_rate: u32, channels: u16) {
    let guard = shared.sink.lock();
    let Some(sink) = guard.as_ref() else {
        return;
    };
    if shared.audio_enabled.load(Ordering::Relaxed) {
        sink(samples, sample_rate, channels);
    } else {
        let silence = vec![0.0f32; samples.len()];
        sink(&silence, sample_rate, channels);
    }
}
