//! Microphone permission probe.
//!
//! Desktop hosts have no consent API exposed through cpal. On macOS the
//! system prompt is raised the first time the input device is opened, and a
//! refusal surfaces as a backend error on later opens. The probe queries the
//! default input configuration and treats access errors as a denial.

use cpal::traits::{DeviceTrait, HostTrait};

use mic_recorder_core::traits::permission::{MicrophonePermission, PermissionStatus};

/// [`MicrophonePermission`] backed by probing the default input device.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalMicrophonePermission;

impl CpalMicrophonePermission {
    fn probe(&self) -> PermissionStatus {
        let host = cpal::default_host();
        let Some(device) = host.default_input_device() else {
            // Let the capture path report the missing device.
            return PermissionStatus::Granted;
        };

        match device.default_input_config() {
            Ok(_) => PermissionStatus::Granted,
            Err(e) => {
                let message = e.to_string();
                if is_permission_error(&message) {
                    log::warn!("Microphone access denied: {}", message);
                    PermissionStatus::Denied
                } else {
                    log::warn!("Unexpected error checking mic permission: {}", message);
                    PermissionStatus::Granted
                }
            }
        }
    }
}

impl MicrophonePermission for CpalMicrophonePermission {
    fn status(&self) -> PermissionStatus {
        self.probe()
    }

    fn request(&self) -> PermissionStatus {
        self.probe()
    }
}

/// Whether a backend error message describes an access refusal.
pub(crate) fn is_permission_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["permission", "denied", "not authorized"]
        .iter()
        .any(|needle| lower.contains(needle))
}
