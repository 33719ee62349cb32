//! Input device enumeration via cpal.
//!
//! Lists capture devices on the default host and resolves a configured
//! device name to a concrete `cpal::Device`.

use cpal::traits::{DeviceTrait, HostTrait};

use mic_recorder_core::models::audio_models::AudioSource;
use mic_recorder_core::models::error::CaptureError;

/// Audio device enumerator over the default cpal host.
pub struct DeviceEnumerator {
    host: cpal::Host,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// List input devices, marking the host default.
    pub fn list_input_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        let default_name = self.default_input_name();
        let devices = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to list input devices: {}", e)))?;

        Ok(devices
            .enumerate()
            .map(|(i, device)| {
                let name = device.name().unwrap_or_else(|_| format!("Device {}", i));
                let is_default = default_name.as_deref() == Some(name.as_str());
                AudioSource {
                    id: name.clone(),
                    name,
                    is_default,
                }
            })
            .collect())
    }

    /// Name of the default input device, if the host has one.
    pub fn default_input_name(&self) -> Option<String> {
        self.host.default_input_device().and_then(|d| d.name().ok())
    }

    /// Resolve `name` to a device; `None` selects the host default.
    pub fn find_input_device(&self, name: Option<&str>) -> Result<cpal::Device, CaptureError> {
        let Some(name) = name else {
            return self
                .host
                .default_input_device()
                .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()));
        };

        let devices: Vec<cpal::Device> = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
            .collect();
        let names: Vec<String> = devices
            .iter()
            .map(|d| d.name().unwrap_or_default())
            .collect();

        match match_device_name(&names, name) {
            Some(index) => {
                log::debug!("Resolved input device '{}' to '{}'", name, names[index]);
                devices
                    .into_iter()
                    .nth(index)
                    .ok_or_else(|| CaptureError::DeviceUnavailable(name.to_string()))
            }
            None => Err(CaptureError::DeviceUnavailable(format!(
                "input device '{}' not found (available: {})",
                name,
                names.join(", ")
            ))),
        }
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the best match for `query`: exact, then case-insensitive, then substring.
pub(crate) fn match_device_name(names: &[String], query: &str) -> Option<usize> {
    let lower = query.to_lowercase();
    names
        .iter()
        .position(|n| n == query)
        .or_else(|| names.iter().position(|n| n.to_lowercase() == lower))
        .or_else(|| names.iter().position(|n| n.to_lowercase().contains(&lower)))
}
