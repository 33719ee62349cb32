use std::sync::Arc;

use crate::models::audio_models::{AudioSource, InputFormat};
use crate::models::error::CaptureError;

/// Callback invoked when a buffer of captured audio is available.
///
/// `samples` are interleaved signed 16-bit PCM in the negotiated [`InputFormat`].
/// The buffer length is whatever the hardware delivered; fixed-size blocks are
/// assembled downstream.
pub type AudioBufferCallback = Arc<dyn Fn(&[i16]) + Send + Sync + 'static>;

/// Callback invoked when the input stream fails and cannot continue.
pub type StreamErrorCallback = Arc<dyn Fn(CaptureError) + Send + Sync + 'static>;

/// Interface for platform-specific microphone inputs.
///
/// Implemented by `CpalMicInput` in `mic-recorder-cpal`; tests use an
/// injectable mock.
pub trait AudioInput: Send {
    /// Whether an input device is present.
    fn is_available(&self) -> bool;

    /// Open the device at `format` and start delivering buffers.
    ///
    /// Must fail with [`CaptureError::DeviceUnavailable`] if the device cannot
    /// be opened at the requested format, and with
    /// [`CaptureError::PermissionDenied`] if the platform refuses access.
    /// Callbacks fire on a backend-owned audio thread; keep them short.
    fn start(
        &mut self,
        format: InputFormat,
        on_samples: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), CaptureError>;

    /// Stop delivering buffers and release the device. Idempotent.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Information about the device backing this input.
    fn device_info(&self) -> AudioSource;
}
