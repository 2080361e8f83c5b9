//! Streaming WAV recorder.
//!
//! Serializes an attached capture stream into `audio/wav` chunks. Samples
//! arrive from the stream's sink on the audio thread, land in a bounded
//! PCM buffer, and a chunker thread drains them on a 100 ms cadence. The
//! first emitted chunk carries the 44-byte streaming header; later chunks
//! are raw PCM continuation, so the concatenated chunks form a playable
//! stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use media_recorder_core::models::chunk::MediaChunk;
use media_recorder_core::models::constraints::RecorderOptions;
use media_recorder_core::models::error::RecorderError;
use media_recorder_core::traits::recorder::{RecorderEvent, RecorderEventCallback, StreamRecorder};

use crate::pcm_buffer::PcmBuffer;
use crate::source::{CpalCaptureStream, SharedStreamState};
use crate::wav;

/// Artifact MIME types this recorder can produce.
pub const WAV_MIME_TYPES: &[&str] = &["audio/wav", "audio/wave", "audio/x-wav"];

/// How often the chunker thread drains the PCM buffer.
const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// Seconds of audio the handoff buffer can hold before dropping samples.
const BUFFER_SECONDS: usize = 5;

/// Records an attached capture stream into streaming WAV chunks.
///
/// Created fresh per recording session via `CpalBackend::create_recorder`
/// and discarded after `stop`.
pub struct WavRecorder {
    stream_shared: Arc<SharedStreamState>,
    events: RecorderEventCallback,
    mime_type: String,
    sample_rate: u32,
    channels: u16,
    buffer: Arc<Mutex<PcmBuffer>>,
    paused: Arc<AtomicBool>,
    flush_requested: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    chunker_handle: Option<thread::JoinHandle<()>>,
    started: bool,
}

impl WavRecorder {
    pub(crate) fn new(
        stream: &CpalCaptureStream,
        options: &RecorderOptions,
        events: RecorderEventCallback,
    ) -> Result<Self, RecorderError> {
        Self::with_format(
            stream.shared(),
            stream.sample_rate(),
            stream.channels(),
            options,
            events,
        )
    }

    pub(crate) fn with_format(
        stream_shared: Arc<SharedStreamState>,
        sample_rate: u32,
        channels: u16,
        options: &RecorderOptions,
        events: RecorderEventCallback,
    ) -> Result<Self, RecorderError> {
        let mime_type = match &options.mime_type {
            Some(mime) => {
                if !WAV_MIME_TYPES.iter().any(|t| t.eq_ignore_ascii_case(mime)) {
                    return Err(RecorderError::NotSupported(format!("mime type {}", mime)));
                }
                mime.clone()
            }
            None => "audio/wav".into(),
        };

        let capacity = sample_rate as usize * channels as usize * 2 * BUFFER_SECONDS;
        Ok(Self {
            stream_shared,
            events,
            mime_type,
            sample_rate,
            channels,
            buffer: Arc::new(Mutex::new(PcmBuffer::new(capacity))),
            paused: Arc::new(AtomicBool::new(false)),
            flush_requested: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            chunker_handle: None,
            started: false,
        })
    }
}

impl StreamRecorder for WavRecorder {
    fn start(&mut self, timeslice: Option<Duration>) -> Result<(), RecorderError> {
        if self.started {
            return Err(RecorderError::InvalidState(
                "recorder already started".into(),
            ));
        }

        // Claim the stream: one active recorder at a time.
        {
            let mut sink = self.stream_shared.sink.lock();
            if sink.is_some() {
                return Err(RecorderError::InvalidState(
                    "another recorder is attached to this stream".into(),
                ));
            }
            let buffer = Arc::clone(&self.buffer);
            let paused = Arc::clone(&self.paused);
            *sink = Some(Arc::new(move |samples: &[f32], _rate, _channels| {
                // Paused time is not recorded at all.
                if paused.load(Ordering::Relaxed) {
                    return;
                }
                let pcm = wav::encode_i16_pcm(samples);
                buffer.lock().write(&pcm);
            }));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let buffer = Arc::clone(&self.buffer);
        let flush_requested = Arc::clone(&self.flush_requested);
        let events = Arc::clone(&self.events);
        let header = wav::streaming_wav_header(self.sample_rate, self.channels, 16);
        let mime_type = self.mime_type.clone();

        let handle = match thread::Builder::new()
            .name("wav-chunker".into())
            .spawn(move || {
                chunker_loop(running, buffer, flush_requested, events, header, mime_type, timeslice);
            }) {
            Ok(handle) => handle,
            Err(e) => {
                *self.stream_shared.sink.lock() = None;
                self.running.store(false, Ordering::SeqCst);
                return Err(RecorderError::RecorderFailed(format!(
                    "failed to spawn chunker thread: {}",
                    e
                )));
            }
        };

        self.chunker_handle = Some(handle);
        self.started = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), RecorderError> {
        if !self.started {
            return Err(RecorderError::InvalidState("recorder not started".into()));
        }
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), RecorderError> {
        if !self.started {
            return Err(RecorderError::InvalidState("recorder not started".into()));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn request_chunk(&mut self) -> Result<(), RecorderError> {
        if !self.started {
            return Err(RecorderError::InvalidState("recorder not started".into()));
        }
        self.flush_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        if !self.started {
            return Err(RecorderError::InvalidState(
                "recorder was never started".into(),
            ));
        }

        // Detach from the stream first so no more samples arrive, then let
        // the chunker flush what is buffered and announce the stop.
        *self.stream_shared.sink.lock() = None;
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.chunker_handle.take() {
            handle
                .join()
                .map_err(|_| RecorderError::RecorderFailed("chunker thread panicked".into()))?;
        }
        Ok(())
    }
}

impl Drop for WavRecorder {
    fn drop(&mut self) {
        if self.chunker_handle.is_some() {
            if let Err(e) = self.stop() {
                log::warn!("failed to stop recorder during teardown: {}", e);
            }
        }
    }
}

fn chunker_loop(
    running: Arc<AtomicBool>,
    buffer: Arc<Mutex<PcmBuffer>>,
    flush_requested: Arc<AtomicBool>,
    events: RecorderEventCallback,
    header: [u8; wav::WAV_HEADER_SIZE],
    mime_type: String,
    timeslice: Option<Duration>,
) {
    let mut pending: Vec<u8> = Vec::new();
    let mut sequence: u64 = 0;
    let mut header_sent = false;
    let mut last_emit = Instant::now();

    while running.load(Ordering::SeqCst) {
        thread::sleep(DRAIN_INTERVAL);
        pending.extend(buffer.lock().read_all());

        let due = timeslice
            .map(|slice| last_emit.elapsed() >= slice)
            .unwrap_or(false);
        let flush = flush_requested.swap(false, Ordering::SeqCst);
        if (due || flush) && !pending.is_empty() {
            emit_chunk(&events, &mime_type, &header, &mut header_sent, &mut pending, &mut sequence);
            last_emit = Instant::now();
        }
    }

    // Final drain and flush before announcing the stop.
    pending.extend(buffer.lock().read_all());
    if !pending.is_empty() {
        emit_chunk(&events, &mime_type, &header, &mut header_sent, &mut pending, &mut sequence);
    }
    events(RecorderEvent::Stopped);
}

fn emit_chunk(
    events: &RecorderEventCallback,
    mime_type: &str,
    header: &[u8; wav::WAV_HEADER_SIZE],
    header_sent: &mut bool,
    pending: &mut Vec<u8>,
    sequence: &mut u64,
) {
    let mut data = Vec::with_capacity(header.len() + pending.len());
    if !*header_sent {
        data.extend_from_slice(header);
        *header_sent = true;
    }
    data.append(pending);

    events(RecorderEvent::ChunkAvailable(MediaChunk::new(
        data, mime_type, *sequence,
    )));
    *sequence += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder_with_log() -> (WavRecorder, Arc<SharedStreamState>, Arc<Mutex<Vec<RecorderEvent>>>) {
        let shared = Arc::new(SharedStreamState::new());
        let log: Arc<Mutex<Vec<RecorderEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_log = Arc::clone(&log);
        let events: RecorderEventCallback = Arc::new(move |event| sink_log.lock().push(event));

        let recorder = WavRecorder::with_format(
            Arc::clone(&shared),
            48000,
            1,
            &RecorderOptions::default(),
            events,
        )
        .unwrap();
        (recorder, shared, log)
    }

    fn feed(shared: &SharedStreamState, samples: &[f32]) {
        let sink = shared.sink.lock().clone().expect("no sink attached");
        sink(samples, 48000, 1);
    }

    fn chunks(log: &Mutex<Vec<RecorderEvent>>) -> Vec<MediaChunk> {
        log.lock()
            .iter()
            .filter_map(|e| match e {
                RecorderEvent::ChunkAvailable(chunk) => Some(chunk.clone()),
                _ => None,
            })
            .collect()
    }

    fn wait_for_chunks(log: &Mutex<Vec<RecorderEvent>>, count: usize) {
        for _ in 0..100 {
            if chunks(log).len() >= count {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("timed out waiting for {} chunks", count);
    }

    #[test]
    fn rejects_unsupported_mime_type() {
        let shared = Arc::new(SharedStreamState::new());
        let events: RecorderEventCallback = Arc::new(|_| {});
        let options = RecorderOptions {
            mime_type: Some("video/webm".into()),
            ..Default::default()
        };

        let result = WavRecorder::with_format(shared, 48000, 1, &options, events);
        assert!(matches!(result, Err(RecorderError::NotSupported(_))));
    }

    #[test]
    fn single_chunk_at_stop_without_timeslice() {
        let (mut recorder, shared, log) = recorder_with_log();

        recorder.start(None).unwrap();
        feed(&shared, &[0.0, 0.5, -0.5]);
        recorder.stop().unwrap();

        let emitted = chunks(&log);
        assert_eq!(emitted.len(), 1);
        let chunk = &emitted[0];
        assert_eq!(chunk.mime_type, "audio/wav");
        assert_eq!(chunk.sequence, 0);
        // Header + 3 samples of 16-bit PCM.
        assert_eq!(chunk.data.len(), wav::WAV_HEADER_SIZE + 6);
        assert_eq!(&chunk.data[0..4], b"RIFF");

        // Stopped arrives after the final chunk.
        assert!(matches!(log.lock().last(), Some(RecorderEvent::Stopped)));
    }

    #[test]
    fn empty_recording_emits_only_stopped() {
        let (mut recorder, _shared, log) = recorder_with_log();

        recorder.start(None).unwrap();
        recorder.stop().unwrap();

        assert!(chunks(&log).is_empty());
        assert_eq!(log.lock().len(), 1);
        assert!(matches!(log.lock()[0], RecorderEvent::Stopped));
    }

    #[test]
    fn request_chunk_flushes_ahead_of_schedule() {
        let (mut recorder, shared, log) = recorder_with_log();

        recorder.start(None).unwrap();
        feed(&shared, &[0.1, 0.2, 0.3, 0.4]);
        recorder.request_chunk().unwrap();
        wait_for_chunks(&log, 1);

        feed(&shared, &[0.5]);
        recorder.stop().unwrap();

        let emitted = chunks(&log);
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].sequence, 0);
        assert_eq!(emitted[1].sequence, 1);

        // Only the first chunk carries the header; the rest is raw PCM.
        assert_eq!(&emitted[0].data[0..4], b"RIFF");
        assert_eq!(emitted[0].data.len(), wav::WAV_HEADER_SIZE + 8);
        assert_eq!(emitted[1].data.len(), 2);
    }

    #[test]
    fn paused_samples_are_discarded() {
        let (mut recorder, shared, log) = recorder_with_log();

        recorder.start(None).unwrap();
        feed(&shared, &[0.1, 0.2]);

        recorder.pause().unwrap();
        feed(&shared, &[0.9; 100]); // lost
        recorder.resume().unwrap();

        feed(&shared, &[0.3]);
        recorder.stop().unwrap();

        let emitted = chunks(&log);
        assert_eq!(emitted.len(), 1);
        // Header + 3 recorded samples; the paused burst never lands.
        assert_eq!(emitted[0].data.len(), wav::WAV_HEADER_SIZE + 6);
    }

    #[test]
    fn start_claims_the_stream_exclusively() {
        let (mut recorder, shared, _log) = recorder_with_log();
        recorder.start(None).unwrap();

        let events: RecorderEventCallback = Arc::new(|_| {});
        let mut second = WavRecorder::with_format(
            Arc::clone(&shared),
            48000,
            1,
            &RecorderOptions::default(),
            events,
        )
        .unwrap();

        assert!(matches!(
            second.start(None),
            Err(RecorderError::InvalidState(_))
        ));

        recorder.stop().unwrap();
    }

    #[test]
    fn control_calls_require_start() {
        let (mut recorder, _shared, _log) = recorder_with_log();

        assert!(recorder.pause().is_err());
        assert!(recorder.request_chunk().is_err());
        assert!(recorder.stop().is_err());
    }

    #[test]
    fn start_twice_is_rejected() {
        let (mut recorder, _shared, _log) = recorder_with_log();

        recorder.start(None).unwrap();
        assert!(matches!(
            recorder.start(None),
            Err(RecorderError::InvalidState(_))
        ));
        recorder.stop().unwrap();
    }
}
