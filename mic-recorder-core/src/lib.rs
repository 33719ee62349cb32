//! # mic-recorder-core
//!
//! Platform-agnostic microphone recorder core.
//!
//! Captures PCM from an [`AudioInput`], writes it to a file through an
//! [`AudioEncoder`], and meters every block into a throttled amplitude stream
//! for UI visualization. Playback of finished recordings goes through an
//! [`AudioPlayer`]. Hardware backends (cpal input, rodio playback) live in
//! `mic-recorder-cpal` and plug in through these traits.
//!
//! ## Architecture
//!
//! ```text
//! mic-recorder-core (this crate)
//! ├── traits/       ← AudioInput, AudioPlayer, AudioEncoder, MicrophonePermission, RecorderDelegate
//! ├── models/       ← RecordingConfig, errors, state machines, RecordingResult, diagnostics
//! ├── processing/   ← amplitude meter, emit throttle, RingBuffer, BlockQueue, PCM + WAV helpers
//! ├── session/      ← CaptureSession, AmplitudeHub, PlaybackController, RecorderFacade
//! ├── storage/      ← RecordingSink, WavEncoder, metadata sidecar
//! └── transport/    ← method-call dispatch (string method name + JSON arguments)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioSource, CaptureDiagnostics, CaptureHandle, InputFormat};
pub use models::config::{AmplitudeRange, AudioQuality, RecorderOptions, RecordingConfig};
pub use models::error::{CaptureError, ConfigError, PlaybackError, RecorderError, SinkError};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{CaptureState, PlaybackState, RecorderState};
pub use processing::block_queue::BlockQueue;
pub use processing::ring_buffer::RingBuffer;
pub use processing::throttle::EmitThrottle;
pub use session::amplitude_hub::{AmplitudeHub, AmplitudeStream, Delivery};
pub use session::capture::{CaptureSession, SessionSettings};
pub use session::playback::PlaybackController;
pub use session::recorder::RecorderFacade;
pub use storage::recording_sink::RecordingSink;
pub use storage::wav_writer::WavEncoder;
pub use traits::audio_input::{AudioBufferCallback, AudioInput, StreamErrorCallback};
pub use traits::audio_player::AudioPlayer;
pub use traits::encoder::{AudioEncoder, EncodedWriter, EncoderFormat};
pub use traits::permission::{AssumeGranted, MicrophonePermission, PermissionStatus};
pub use traits::recorder_delegate::RecorderDelegate;
pub use transport::dispatch::{dispatch, MethodCall, MethodError, MethodResponse};
