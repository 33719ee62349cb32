//! # mic-recorder-cpal
//!
//! Hardware backend for mic-recorder.
//!
//! Provides:
//! - `CpalMicInput`: Microphone capture via a cpal input stream
//! - `RodioPlayer`: File playback via rodio on the default output device
//! - `DeviceEnumerator`: Input device listing and name matching
//! - `CpalMicrophonePermission`: Microphone access probe
//!
//! ## Usage
//! ```ignore
//! use mic_recorder_cpal::{CpalMicInput, CpalMicrophonePermission, RodioPlayer};
//! use mic_recorder_core::RecorderFacade;
//! use std::sync::Arc;
//!
//! let recorder = RecorderFacade::new(CpalMicInput::default_device(), RodioPlayer::new());
//! recorder.set_permission(Arc::new(CpalMicrophonePermission));
//! recorder.start(None)?;
//! ```

pub mod cpal_mic;
pub mod device_enumerator;
pub mod permissions;
pub mod rodio_player;

pub use cpal_mic::CpalMicInput;
pub use device_enumerator::DeviceEnumerator;
pub use permissions::CpalMicrophonePermission;
pub use rodio_player::RodioPlayer;
