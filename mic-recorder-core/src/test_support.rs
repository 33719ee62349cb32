//! Test doubles for the hardware-facing traits.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioSource, InputFormat};
use crate::models::error::{CaptureError, PlaybackError, RecorderError, SinkError};
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;
use crate::storage::wav_writer::WavEncoder;
use crate::traits::audio_input::{AudioBufferCallback, AudioInput, StreamErrorCallback};
use crate::traits::audio_player::AudioPlayer;
use crate::traits::encoder::{AudioEncoder, EncodedWriter, EncoderFormat};
use crate::traits::permission::{MicrophonePermission, PermissionStatus};
use crate::traits::recorder_delegate::RecorderDelegate;

#[derive(Default)]
struct MockInputInner {
    on_samples: Option<AudioBufferCallback>,
    on_error: Option<StreamErrorCallback>,
    fail_next_start: Option<CaptureError>,
    fail_stop: bool,
    last_format: Option<InputFormat>,
    start_calls: usize,
    stop_calls: usize,
}

/// Drives a [`MockInput`] from the test thread.
#[derive(Clone, Default)]
pub struct MockInputHandle {
    inner: Arc<Mutex<MockInputInner>>,
}

impl MockInputHandle {
    /// Deliver samples as the hardware callback would. Returns `false` when the input is stopped.
    pub fn push(&self, samples: &[i16]) -> bool {
        let callback = self.inner.lock().on_samples.clone();
        match callback {
            Some(cb) => {
                cb(samples);
                true
            }
            None => false,
        }
    }

    /// Report an unrecoverable stream error through the registered callback.
    pub fn fail_stream(&self, error: CaptureError) {
        let callback = self.inner.lock().on_error.clone();
        if let Some(cb) = callback {
            cb(error);
        }
    }

    pub fn fail_next_start(&self, error: CaptureError) {
        self.inner.lock().fail_next_start = Some(error);
    }

    pub fn fail_stop(&self) {
        self.inner.lock().fail_stop = true;
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().on_samples.is_some()
    }

    pub fn start_calls(&self) -> usize {
        self.inner.lock().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.lock().stop_calls
    }

    pub fn last_format(&self) -> Option<InputFormat> {
        self.inner.lock().last_format
    }
}

pub struct MockInput {
    handle: MockInputHandle,
}

impl MockInput {
    pub fn new() -> (Self, MockInputHandle) {
        let handle = MockInputHandle::default();
        (Self { handle: handle.clone() }, handle)
    }
}

impl AudioInput for MockInput {
    fn is_available(&self) -> bool {
        true
    }

    fn start(
        &mut self,
        format: InputFormat,
        on_samples: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), CaptureError> {
        let mut inner = self.handle.inner.lock();
        inner.start_calls += 1;
        inner.last_format = Some(format);
        if let Some(e) = inner.fail_next_start.take() {
            return Err(e);
        }
        inner.on_samples = Some(on_samples);
        inner.on_error = Some(on_error);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let mut inner = self.handle.inner.lock();
        inner.stop_calls += 1;
        inner.on_samples = None;
        inner.on_error = None;
        if inner.fail_stop {
            return Err(CaptureError::StreamFailed("mock stop failure".into()));
        }
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "mock-mic".into(),
            name: "Mock Microphone".into(),
            is_default: true,
        }
    }
}

#[derive(Default)]
struct MockPlayerInner {
    loaded: Vec<PathBuf>,
    paused: bool,
    finished: bool,
    released: usize,
    fail_load: Option<PlaybackError>,
}

#[derive(Clone, Default)]
pub struct MockPlayerHandle {
    inner: Arc<Mutex<MockPlayerInner>>,
}

impl MockPlayerHandle {
    pub fn loaded(&self) -> Vec<PathBuf> {
        self.inner.lock().loaded.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    /// Simulate the file playing to its end.
    pub fn finish(&self) {
        self.inner.lock().finished = true;
    }

    /// Number of times a player handle was released.
    pub fn released(&self) -> usize {
        self.inner.lock().released
    }

    pub fn fail_next_load(&self, error: PlaybackError) {
        self.inner.lock().fail_load = Some(error);
    }
}

pub struct MockPlayer {
    handle: MockPlayerHandle,
}

impl MockPlayer {
    pub fn new() -> (Self, MockPlayerHandle) {
        let handle = MockPlayerHandle::default();
        (Self { handle: handle.clone() }, handle)
    }
}

impl AudioPlayer for MockPlayer {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        let mut inner = self.handle.inner.lock();
        if let Some(e) = inner.fail_load.take() {
            return Err(e);
        }
        inner.loaded.push(path.to_path_buf());
        inner.paused = false;
        inner.finished = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.handle.inner.lock().paused = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        self.handle.inner.lock().paused = false;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        let mut inner = self.handle.inner.lock();
        inner.released += 1;
        inner.paused = false;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.handle.inner.lock().finished
    }
}

/// Permission provider with a scripted answer.
pub struct FixedPermission {
    status: PermissionStatus,
    on_request: PermissionStatus,
    requests: AtomicUsize,
}

impl FixedPermission {
    pub fn new(status: PermissionStatus, on_request: PermissionStatus) -> Self {
        Self {
            status,
            on_request,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl MicrophonePermission for FixedPermission {
    fn status(&self) -> PermissionStatus {
        self.status
    }

    fn request(&self) -> PermissionStatus {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.on_request
    }
}

/// Delegate that records every callback as a short string.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl RecorderDelegate for EventLog {
    fn on_state_changed(&self, state: RecorderState) {
        self.events.lock().push(format!("state:{:?}", state));
    }

    fn on_error(&self, error: &RecorderError) {
        self.events.lock().push(format!("error:{}", error.code()));
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.events.lock().push(format!("finished:{}", result.frames_written));
    }
}

/// WAV writer that stalls on every write.
struct StallingWriter {
    inner: Box<dyn EncodedWriter>,
    delay: Duration,
}

impl EncodedWriter for StallingWriter {
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        std::thread::sleep(self.delay);
        self.inner.write_samples(samples)
    }

    fn finalize(self: Box<Self>) -> Result<u64, SinkError> {
        self.inner.finalize()
    }
}

/// WAV encoder whose writes each take `.0`, like a hung network mount.
pub struct StallingEncoder(pub Duration);

impl AudioEncoder for StallingEncoder {
    fn codec_name(&self) -> &str {
        "wav/stalling"
    }

    fn file_extension(&self) -> &str {
        "wav"
    }

    fn create(&self, path: &Path, format: &EncoderFormat) -> Result<Box<dyn EncodedWriter>, SinkError> {
        Ok(Box::new(StallingWriter {
            inner: WavEncoder.create(path, format)?,
            delay: self.0,
        }))
    }
}

/// `frames` frames of a full-scale sine, duplicated across `channels`.
pub fn sine_block(freq: f64, sample_rate: u32, channels: u16, frames: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(frames * usize::from(channels));
    for i in 0..frames {
        let t = i as f64 / f64::from(sample_rate);
        let v = (f64::from(i16::MAX) * (2.0 * std::f64::consts::PI * freq * t).sin()) as i16;
        for _ in 0..channels {
            out.push(v);
        }
    }
    out
}

pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("mic_recorder_test_{}", uuid::Uuid::new_v4()))
        .join(name)
}
