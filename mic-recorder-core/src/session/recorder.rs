use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::models::audio_models::{AudioSource, CaptureDiagnostics, CaptureHandle};
use crate::models::config::{RecorderOptions, RecordingConfig};
use crate::models::error::{CaptureError, RecorderError};
use crate::models::state::{PlaybackState, RecorderState};
use crate::session::amplitude_hub::{AmplitudeHub, AmplitudeStream};
use crate::session::capture::{CaptureSession, DelegateSlot, SessionSettings};
use crate::session::playback::PlaybackController;
use crate::storage::recording_sink::{default_recording_path, RecordingSink};
use crate::storage::wav_writer::WavEncoder;
use crate::traits::audio_input::AudioInput;
use crate::traits::audio_player::AudioPlayer;
use crate::traits::encoder::AudioEncoder;
use crate::traits::permission::{AssumeGranted, MicrophonePermission, PermissionStatus};
use crate::traits::recorder_delegate::RecorderDelegate;

/// Public surface of the recorder.
///
/// Construct once and share by reference or inside an `Arc`; every operation
/// takes `&self`. Configuration changes are held as pending and snapshotted
/// by the next `start`, so reconfiguring never touches a running capture.
///
/// ```text
/// Idle ── start ──→ Recording ── stop ──→ Idle
/// ```
pub struct RecorderFacade<I: AudioInput + 'static, P: AudioPlayer> {
    options: RecorderOptions,
    config: Mutex<RecordingConfig>,
    capture: Mutex<CaptureSession<I>>,
    playback: Mutex<PlaybackController<P>>,
    hub: Arc<AmplitudeHub>,
    encoder: RwLock<Arc<dyn AudioEncoder>>,
    permission: RwLock<Arc<dyn MicrophonePermission>>,
    delegate: DelegateSlot,
}

impl<I: AudioInput + 'static, P: AudioPlayer> RecorderFacade<I, P> {
    pub fn new(input: I, player: P) -> Self {
        Self::with_options(input, player, RecorderOptions::default())
    }

    pub fn with_options(input: I, player: P, options: RecorderOptions) -> Self {
        let hub = Arc::new(AmplitudeHub::new(options.amplitude_channel_capacity));
        let delegate: DelegateSlot = Arc::new(RwLock::new(None));
        let capture = CaptureSession::new(input, Arc::clone(&hub), SessionSettings::from(&options))
            .with_delegate_slot(Arc::clone(&delegate));

        Self {
            options,
            config: Mutex::new(RecordingConfig::default()),
            capture: Mutex::new(capture),
            playback: Mutex::new(PlaybackController::new(player)),
            hub,
            encoder: RwLock::new(Arc::new(WavEncoder) as Arc<dyn AudioEncoder>),
            permission: RwLock::new(Arc::new(AssumeGranted) as Arc<dyn MicrophonePermission>),
            delegate,
        }
    }

    pub fn set_delegate(&self, delegate: Option<Arc<dyn RecorderDelegate>>) {
        *self.delegate.write() = delegate;
    }

    pub fn set_encoder(&self, encoder: Arc<dyn AudioEncoder>) {
        *self.encoder.write() = encoder;
    }

    pub fn set_permission(&self, permission: Arc<dyn MicrophonePermission>) {
        *self.permission.write() = permission;
    }

    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    // --- Recording ---

    /// Start recording to `path`, or to the default cache location.
    pub fn start(&self, path: Option<PathBuf>) -> Result<CaptureHandle, RecorderError> {
        let result = self.start_locked(path);
        match &result {
            Ok(handle) => {
                log::info!(
                    "Recording started: {}",
                    handle
                        .file_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                );
                self.notify(|d| d.on_state_changed(RecorderState::Recording));
            }
            Err(e) => {
                log::warn!("Failed to start recording: {}", e);
                self.notify(|d| d.on_error(e));
            }
        }
        result
    }

    /// Stop recording and return the path of the finished file.
    ///
    /// Never fails: teardown problems are logged and the path is still
    /// returned as long as the file exists. Returns `None` when idle.
    pub fn stop(&self) -> Option<PathBuf> {
        let (sink, file_path, faulted) = {
            let mut capture = self.capture.lock();
            let faulted = capture.has_leftover();
            let file_path = capture.handle().and_then(|h| h.file_path.clone());
            let sink = capture.stop().unwrap_or_else(|e| {
                log::warn!("Capture teardown reported an error: {}", e);
                None
            });
            (sink, file_path, faulted)
        };

        let path = match sink {
            Some(sink) => self.finish(sink),
            None => {
                // The sink stayed with a stalled read loop, which finalizes it on exit.
                let path = file_path?;
                log::warn!("Recording {} was not finalized before stop returned", path.display());
                path.exists().then_some(path)
            }
        };
        if !faulted {
            self.notify(|d| d.on_state_changed(RecorderState::Idle));
        }
        path
    }

    pub fn is_recording(&self) -> bool {
        self.capture.lock().state().is_busy()
    }

    pub fn recorder_state(&self) -> RecorderState {
        if self.is_recording() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn current_handle(&self) -> Option<CaptureHandle> {
        self.capture.lock().handle().cloned()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.capture.lock().diagnostics()
    }

    pub fn input_device(&self) -> AudioSource {
        self.capture.lock().device_info()
    }

    /// Where a recording started without an explicit path is written.
    pub fn default_path(&self) -> PathBuf {
        default_recording_path(&self.options.cache_dir, self.encoder.read().as_ref())
    }

    // --- Configuration ---

    /// Apply a wire payload leniently; see [`RecordingConfig::apply_arguments`].
    pub fn configure_recording(&self, arguments: &Value) -> Result<(), RecorderError> {
        self.config.lock().apply_arguments(arguments)?;
        if self.is_recording() {
            log::info!("Recording configuration updated; takes effect on the next start");
        }
        Ok(())
    }

    /// Replace the pending configuration after a strict check.
    pub fn configure(&self, config: RecordingConfig) -> Result<(), RecorderError> {
        config.validate()?;
        *self.config.lock() = config;
        Ok(())
    }

    /// The configuration the next `start` will use.
    pub fn config(&self) -> RecordingConfig {
        self.config.lock().clone()
    }

    // --- Amplitude stream ---

    /// Subscribe to amplitude values, replacing any previous subscriber.
    pub fn subscribe(&self) -> AmplitudeStream {
        self.hub.subscribe()
    }

    pub fn unsubscribe(&self) {
        self.hub.unsubscribe();
    }

    // --- Playback ---

    pub fn play(&self, path: &Path) -> Result<(), RecorderError> {
        Ok(self.playback.lock().play(path)?)
    }

    pub fn pause_playback(&self) -> Result<(), RecorderError> {
        Ok(self.playback.lock().pause()?)
    }

    pub fn resume_playback(&self) -> Result<(), RecorderError> {
        Ok(self.playback.lock().resume()?)
    }

    pub fn stop_playback(&self) -> Result<(), RecorderError> {
        Ok(self.playback.lock().stop()?)
    }

    pub fn is_playing(&self) -> bool {
        self.playback.lock().is_playing()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.lock().state()
    }

    pub fn platform_version(&self) -> String {
        format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
    }

    // --- Internal helpers ---

    fn start_locked(&self, path: Option<PathBuf>) -> Result<CaptureHandle, RecorderError> {
        let mut capture = self.capture.lock();
        if capture.state().is_busy() {
            return Err(RecorderError::AlreadyRecording);
        }
        if capture.has_leftover() {
            if let Ok(Some(sink)) = capture.stop() {
                self.finish(sink);
            }
        }

        let permission = self.permission.read().clone();
        check_permission(permission.as_ref())?;

        let config = self.config.lock().clone();
        let encoder = self.encoder.read().clone();
        let path = path.unwrap_or_else(|| default_recording_path(&self.options.cache_dir, encoder.as_ref()));

        match self.open_and_start(&mut capture, &config, encoder.as_ref(), &path) {
            Err(RecorderError::Capture(CaptureError::PermissionDenied)) => {
                // The backend refused access; ask once and retry.
                if permission.request() != PermissionStatus::Granted {
                    return Err(CaptureError::PermissionDenied.into());
                }
                log::info!("Microphone permission granted; retrying start");
                self.open_and_start(&mut capture, &config, encoder.as_ref(), &path)
            }
            other => other,
        }
    }

    fn open_and_start(
        &self,
        capture: &mut CaptureSession<I>,
        config: &RecordingConfig,
        encoder: &dyn AudioEncoder,
        path: &Path,
    ) -> Result<CaptureHandle, RecorderError> {
        let sink = RecordingSink::open(encoder, path, config)?.with_metadata(self.options.write_metadata);
        Ok(capture.start(config, Some(sink))?)
    }

    /// Finalize a sink handed back by the capture session.
    fn finish(&self, sink: RecordingSink) -> Option<PathBuf> {
        let path = sink.path().to_path_buf();
        match sink.close() {
            Ok(result) => {
                if result.metadata.write_failures > 0 {
                    log::warn!(
                        "Recording {} finished with {} failed writes",
                        path.display(),
                        result.metadata.write_failures
                    );
                }
                self.notify(|d| d.on_recording_finished(&result));
            }
            Err(e) => {
                log::error!("Failed to finalize recording {}: {}", path.display(), e);
                let error = RecorderError::from(e);
                self.notify(|d| d.on_error(&error));
            }
        }
        path.exists().then_some(path)
    }

    fn notify(&self, f: impl FnOnce(&dyn RecorderDelegate)) {
        let delegate = self.delegate.read().clone();
        if let Some(delegate) = delegate {
            f(delegate.as_ref());
        }
    }
}

/// Granted proceeds; undetermined asks once; anything else is a denial.
fn check_permission(permission: &dyn MicrophonePermission) -> Result<(), CaptureError> {
    match permission.status() {
        PermissionStatus::Granted => Ok(()),
        PermissionStatus::Denied => Err(CaptureError::PermissionDenied),
        PermissionStatus::Undetermined => {
            log::info!("Requesting microphone permission");
            match permission.request() {
                PermissionStatus::Granted => Ok(()),
                _ => Err(CaptureError::PermissionDenied),
            }
        }
    }
}
