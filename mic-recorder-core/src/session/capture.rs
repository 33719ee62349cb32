use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};

use crate::models::audio_models::{AudioSource, CaptureDiagnostics, CaptureHandle, InputFormat};
use crate::models::config::{RecorderOptions, RecordingConfig};
use crate::models::error::{CaptureError, RecorderError};
use crate::models::state::{CaptureState, RecorderState};
use crate::processing::amplitude;
use crate::processing::block_queue::BlockQueue;
use crate::processing::throttle::EmitThrottle;
use crate::session::amplitude_hub::{AmplitudeHub, Delivery};
use crate::storage::recording_sink::RecordingSink;
use crate::traits::audio_input::{AudioBufferCallback, AudioInput, StreamErrorCallback};
use crate::traits::recorder_delegate::RecorderDelegate;

/// How long the read loop waits for a block before re-checking its running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Seconds of audio the block queue holds before dropping the oldest samples.
const QUEUE_SECONDS: usize = 5;

pub(crate) type DelegateSlot = Arc<RwLock<Option<Arc<dyn RecorderDelegate>>>>;

/// Timing knobs taken from [`RecorderOptions`].
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub emit_interval: Duration,
    pub stop_timeout: Duration,
}

impl From<&RecorderOptions> for SessionSettings {
    fn from(options: &RecorderOptions) -> Self {
        Self {
            emit_interval: options.emit_interval,
            stop_timeout: options.stop_timeout,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&RecorderOptions::default())
    }
}

/// State shared with the hardware callback and the read loop.
struct SessionState {
    state: CaptureState,
    diagnostics: CaptureDiagnostics,
    fault: Option<CaptureError>,
    input_released: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            diagnostics: CaptureDiagnostics::default(),
            fault: None,
            input_released: true,
        }
    }
}

/// Per-start resources; dropped on teardown.
struct ActiveCapture {
    handle: CaptureHandle,
    channels: u16,
    running: Arc<AtomicBool>,
    queue: Arc<BlockQueue>,
    sink: Arc<Mutex<Option<RecordingSink>>>,
    thread: Option<JoinHandle<()>>,
    done: Receiver<()>,
}

/// Owner of the hardware input and the read loop.
///
/// ```text
/// [AudioInput callback] → [BlockQueue] → mic-read-loop ─┬→ [RecordingSink]
///                                                        └→ meter → throttle → [AmplitudeHub]
/// ```
///
/// The input is long-lived; every `start` creates a fresh queue, loop thread
/// and counters. At most one capture is active at a time.
pub struct CaptureSession<I: AudioInput + 'static> {
    input: Arc<Mutex<I>>,
    hub: Arc<AmplitudeHub>,
    settings: SessionSettings,
    session_state: Arc<Mutex<SessionState>>,
    delegate: DelegateSlot,
    active: Option<ActiveCapture>,
}

impl<I: AudioInput + 'static> CaptureSession<I> {
    pub fn new(input: I, hub: Arc<AmplitudeHub>, settings: SessionSettings) -> Self {
        Self {
            input: Arc::new(Mutex::new(input)),
            hub,
            settings,
            session_state: Arc::new(Mutex::new(SessionState::new())),
            delegate: Arc::new(RwLock::new(None)),
            active: None,
        }
    }

    pub(crate) fn with_delegate_slot(mut self, delegate: DelegateSlot) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn set_delegate(&self, delegate: Option<Arc<dyn RecorderDelegate>>) {
        *self.delegate.write() = delegate;
    }

    pub fn state(&self) -> CaptureState {
        self.session_state.lock().state
    }

    /// Counters for the current or most recent capture.
    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.session_state.lock().diagnostics.clone()
    }

    /// A capture ended by a stream fault whose sink has not been collected yet.
    pub fn has_leftover(&self) -> bool {
        self.active.is_some() && self.state().is_idle()
    }

    pub fn handle(&self) -> Option<&CaptureHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }

    pub fn is_available(&self) -> bool {
        self.input.lock().is_available()
    }

    pub fn device_info(&self) -> AudioSource {
        self.input.lock().device_info()
    }

    /// Start capturing with `config`, feeding every block to `sink` if given.
    ///
    /// On any failure the sink is discarded before the error is returned.
    pub fn start(
        &mut self,
        config: &RecordingConfig,
        sink: Option<RecordingSink>,
    ) -> Result<CaptureHandle, CaptureError> {
        if self.active.is_some() || self.state().is_busy() {
            if let Some(sink) = sink {
                sink.discard();
            }
            return Err(CaptureError::AlreadyActive);
        }

        {
            let mut s = self.session_state.lock();
            s.state = CaptureState::Starting;
            s.diagnostics = CaptureDiagnostics::default();
            s.fault = None;
            s.input_released = false;
        }

        let capacity = config.sample_rate as usize * QUEUE_SECONDS * usize::from(config.channels);
        let queue = Arc::new(BlockQueue::new(capacity));
        let running = Arc::new(AtomicBool::new(true));
        let file_path = sink.as_ref().map(|s| s.path().to_path_buf());
        let sink = Arc::new(Mutex::new(sink));
        let (done_tx, done_rx) = bounded::<()>(0);

        let read_loop = ReadLoop {
            input: Arc::clone(&self.input),
            session_state: Arc::clone(&self.session_state),
            running: Arc::clone(&running),
            queue: Arc::clone(&queue),
            sink: Arc::clone(&sink),
            hub: Arc::clone(&self.hub),
            delegate: Arc::clone(&self.delegate),
            config: config.clone(),
            throttle: EmitThrottle::new(self.settings.emit_interval),
            _done: done_tx,
        };
        let thread = match thread::Builder::new()
            .name("mic-read-loop".into())
            .spawn(move || read_loop.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                let sink = sink.lock().take();
                self.abort_start(sink);
                return Err(CaptureError::StreamFailed(format!("failed to spawn read loop: {}", e)));
            }
        };

        let mut active = ActiveCapture {
            handle: CaptureHandle {
                id: uuid::Uuid::new_v4(),
                started_at: Utc::now(),
                file_path,
            },
            channels: config.channels,
            running,
            queue,
            sink,
            thread: Some(thread),
            done: done_rx,
        };

        let format = InputFormat {
            sample_rate: config.sample_rate,
            channels: config.channels,
            buffer_frames: config.buffer_size,
        };
        log::debug!(
            "Requesting input format: {} Hz, {} ch, {} frames/block",
            format.sample_rate,
            format.channels,
            format.buffer_frames
        );
        let on_samples = self.sample_callback(&active.queue);
        let on_error = self.error_callback(&active.queue, &active.running);

        let started = self.input.lock().start(format, on_samples, on_error);
        if let Err(e) = started {
            log::error!("Failed to start input: {}", e);
            let deadline = Instant::now() + self.settings.stop_timeout;
            active.running.store(false, Ordering::SeqCst);
            active.queue.wake();
            let exited = self.join_read_loop(&mut active);
            self.abort_start(reclaim_sink(&active.sink, exited, deadline));
            return Err(e);
        }

        let promoted = {
            let mut s = self.session_state.lock();
            if s.state == CaptureState::Starting {
                s.state = CaptureState::Active;
                true
            } else {
                false
            }
        };
        let handle = active.handle.clone();
        self.active = Some(active);

        if !promoted {
            // The stream failed while starting; the read loop already released the input.
            if let Some(sink) = self.teardown() {
                sink.discard();
            }
            return Err(CaptureError::StreamFailed("input stream failed during start".into()));
        }

        log::info!(
            "Capture started: {} Hz, {} ch, {} frames/block",
            config.sample_rate,
            config.channels,
            config.buffer_size
        );
        Ok(handle)
    }

    /// Stop the active capture and hand its sink back for finalization.
    ///
    /// Idempotent: returns `Ok(None)` when nothing is running. A read loop that
    /// does not exit within the stop timeout is detached.
    pub fn stop(&mut self) -> Result<Option<RecordingSink>, CaptureError> {
        if self.active.is_none() {
            return Ok(None);
        }

        {
            let mut s = self.session_state.lock();
            if s.state.is_busy() {
                s.state = CaptureState::Stopping;
            } else {
                log::debug!("Reaping capture ended by a stream fault");
            }
        }

        let sink = self.teardown();
        let diagnostics = self.diagnostics();
        log::info!(
            "Capture stopped: {} blocks, {} amplitude events ({} throttled, {} dropped)",
            diagnostics.blocks_processed,
            diagnostics.amplitude_events_emitted,
            diagnostics.amplitude_events_throttled,
            diagnostics.amplitude_events_dropped
        );
        Ok(sink)
    }

    // --- Internal helpers ---

    fn sample_callback(&self, queue: &Arc<BlockQueue>) -> AudioBufferCallback {
        let queue = Arc::clone(queue);
        let session_state = Arc::clone(&self.session_state);
        Arc::new(move |samples: &[i16]| {
            {
                let mut s = session_state.lock();
                s.diagnostics.callback_count += 1;
                s.diagnostics.samples_received += samples.len() as u64;
            }
            queue.push(samples);
        })
    }

    fn error_callback(&self, queue: &Arc<BlockQueue>, running: &Arc<AtomicBool>) -> StreamErrorCallback {
        let queue = Arc::clone(queue);
        let running = Arc::clone(running);
        let session_state = Arc::clone(&self.session_state);
        Arc::new(move |error: CaptureError| {
            log::error!("Input stream error: {}", error);
            session_state.lock().fault.get_or_insert(error);
            running.store(false, Ordering::SeqCst);
            queue.wake();
        })
    }

    fn abort_start(&self, sink: Option<RecordingSink>) {
        if let Some(sink) = sink {
            sink.discard();
        }
        let mut s = self.session_state.lock();
        s.input_released = true;
        s.state = CaptureState::Idle;
    }

    /// Signal the loop, wait for it, release the input and flush the residual samples.
    fn teardown(&mut self) -> Option<RecordingSink> {
        let mut active = self.active.take()?;
        let deadline = Instant::now() + self.settings.stop_timeout;
        active.running.store(false, Ordering::SeqCst);
        active.queue.wake();
        let exited = self.join_read_loop(&mut active);

        release_input(&self.input, &self.session_state);

        let mut sink = reclaim_sink(&active.sink, exited, deadline);
        let mut residual = active.queue.drain();
        residual.truncate(residual.len() - residual.len() % usize::from(active.channels.max(1)));
        let overflowed = active.queue.overflowed();
        if overflowed > 0 {
            log::warn!("Block queue overflowed; {} samples dropped", overflowed);
        }

        // A detached loop means the writer is stalling; skip the residual flush.
        let write_failures = sink.as_mut().map(|sink| {
            if exited && !residual.is_empty() {
                sink.write(&residual);
            }
            sink.write_failures()
        });

        let mut s = self.session_state.lock();
        if let Some(failures) = write_failures {
            s.diagnostics.sink_write_failures = failures;
        }
        s.state = CaptureState::Idle;
        sink
    }

    /// Wait up to the stop timeout for the loop to exit. Returns `false` if it was detached.
    fn join_read_loop(&self, active: &mut ActiveCapture) -> bool {
        match active.done.recv_timeout(self.settings.stop_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Read loop did not exit within {:?}; detaching it",
                    self.settings.stop_timeout
                );
                active.thread.take();
                false
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(handle) = active.thread.take() {
                    if handle.join().is_err() {
                        log::error!("Read loop panicked");
                    }
                }
                true
            }
        }
    }
}

impl<I: AudioInput + 'static> Drop for CaptureSession<I> {
    fn drop(&mut self) {
        if let Some(sink) = self.teardown() {
            if let Err(e) = sink.close() {
                log::warn!("Failed to finalize recording on shutdown: {}", e);
            }
        }
    }
}

/// Take the sink back from the read loop.
///
/// A detached loop may still be inside a write. Past `deadline` the sink is
/// left to it; its last reference finalizes the file when the loop exits.
fn reclaim_sink(
    sink: &Mutex<Option<RecordingSink>>,
    loop_exited: bool,
    deadline: Instant,
) -> Option<RecordingSink> {
    if loop_exited {
        return sink.lock().take();
    }
    match sink.try_lock_until(deadline) {
        Some(mut guard) => guard.take(),
        None => {
            log::warn!("Recording sink still busy in the detached read loop; abandoning it");
            None
        }
    }
}

/// Stop the hardware input once per capture, whichever side gets there first.
fn release_input<I: AudioInput>(input: &Mutex<I>, session_state: &Mutex<SessionState>) {
    let already_released = std::mem::replace(&mut session_state.lock().input_released, true);
    if already_released {
        return;
    }
    if let Err(e) = input.lock().stop() {
        log::warn!("Failed to stop input: {}", e);
    }
}

struct ReadLoop<I: AudioInput> {
    input: Arc<Mutex<I>>,
    session_state: Arc<Mutex<SessionState>>,
    running: Arc<AtomicBool>,
    queue: Arc<BlockQueue>,
    sink: Arc<Mutex<Option<RecordingSink>>>,
    hub: Arc<AmplitudeHub>,
    delegate: DelegateSlot,
    config: RecordingConfig,
    throttle: EmitThrottle,
    /// Dropped on exit; the disconnect tells `stop` the loop is done.
    _done: Sender<()>,
}

impl<I: AudioInput> ReadLoop<I> {
    fn run(mut self) {
        let block_len = self.config.block_len();
        while self.running.load(Ordering::SeqCst) {
            let Some(block) = self.queue.wait_block(block_len, POLL_INTERVAL) else {
                continue;
            };
            self.process_block(&block);
        }
        self.handle_fault();
    }

    fn process_block(&mut self, block: &[i16]) {
        let write_failures = self.sink.lock().as_mut().map(|sink| {
            sink.write(block);
            sink.write_failures()
        });

        let level = amplitude::measure(block, self.config.amplitude_range);
        let delivery = if !self.throttle.try_acquire() {
            None
        } else if self.running.load(Ordering::SeqCst) {
            Some(self.hub.publish(level))
        } else {
            Some(Delivery::NoSubscriber)
        };

        let mut s = self.session_state.lock();
        let d = &mut s.diagnostics;
        d.blocks_processed += 1;
        if let Some(failures) = write_failures {
            d.sink_write_failures = failures;
        }
        match delivery {
            None => d.amplitude_events_throttled += 1,
            Some(Delivery::Delivered) => d.amplitude_events_emitted += 1,
            Some(Delivery::Dropped) => d.amplitude_events_dropped += 1,
            Some(Delivery::NoSubscriber) => {}
        }
    }

    /// Tear down after an unrecoverable stream error.
    fn handle_fault(&self) {
        let error = {
            let mut s = self.session_state.lock();
            let Some(error) = s.fault.take() else {
                return;
            };
            if s.state == CaptureState::Stopping {
                log::debug!("Stream error during stop ignored: {}", error);
                return;
            }
            error
        };

        log::error!("Capture aborted: {}", error);
        release_input(&self.input, &self.session_state);
        self.session_state.lock().state = CaptureState::Idle;

        let delegate = self.delegate.read().clone();
        if let Some(delegate) = delegate {
            delegate.on_error(&RecorderError::Capture(error));
            delegate.on_state_changed(RecorderState::Idle);
        }
    }
}
