use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ConfigError;

/// Sample rates accepted by [`RecordingConfig::set_sample_rate`].
pub const VALID_SAMPLE_RATES: [u32; 5] = [8000, 16000, 22050, 44100, 48000];

/// Frames-per-block values accepted by [`RecordingConfig::set_buffer_size`].
pub const VALID_BUFFER_SIZES: [u32; 6] = [128, 256, 512, 1024, 2048, 4096];

/// Encoder quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Min,
    Low,
    Medium,
    High,
    Max,
}

impl AudioQuality {
    /// Map a wire ordinal (0-4) to a preset. Out-of-range ordinals select `High`.
    pub fn from_ordinal(ordinal: i64) -> Self {
        match ordinal {
            0 => Self::Min,
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            4 => Self::Max,
            _ => Self::High,
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Self::Min => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Max => 4,
        }
    }

    /// Target encoder bitrate in bits per second.
    pub fn bit_rate(self) -> u32 {
        match self {
            Self::Min => 32_000,
            Self::Low => 64_000,
            Self::Medium => 96_000,
            Self::High => 128_000,
            Self::Max => 192_000,
        }
    }
}

/// Output scale of the normalized amplitude signal.
///
/// `min > max` is allowed and produces a reversed scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeRange {
    pub min: f64,
    pub max: f64,
}

impl AmplitudeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Lowest value the range can produce, regardless of orientation.
    pub fn lower(&self) -> f64 {
        self.min.min(self.max)
    }

    /// Highest value the range can produce, regardless of orientation.
    pub fn upper(&self) -> f64 {
        self.min.max(self.max)
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

impl Default for AmplitudeRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Per-recording configuration, snapshotted at session start.
///
/// Setters are lenient: values outside an allow-list are dropped and the
/// previous value is kept. Callers rely on this, so it never reports an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_size: u32,
    pub quality: AudioQuality,
    pub amplitude_range: AmplitudeRange,
}

impl RecordingConfig {
    /// Returns `true` if the value was accepted.
    pub fn set_sample_rate(&mut self, sample_rate: i64) -> bool {
        match VALID_SAMPLE_RATES.iter().find(|&&r| i64::from(r) == sample_rate) {
            Some(&rate) => {
                self.sample_rate = rate;
                true
            }
            None => false,
        }
    }

    pub fn set_channels(&mut self, channels: i64) {
        self.channels = channels.clamp(1, 2) as u16;
    }

    /// Returns `true` if the value was accepted.
    pub fn set_buffer_size(&mut self, buffer_size: i64) -> bool {
        match VALID_BUFFER_SIZES.iter().find(|&&s| i64::from(s) == buffer_size) {
            Some(&size) => {
                self.buffer_size = size;
                true
            }
            None => false,
        }
    }

    pub fn set_quality_ordinal(&mut self, ordinal: i64) {
        self.quality = AudioQuality::from_ordinal(ordinal);
    }

    /// Number of interleaved samples in one read-loop block.
    pub fn block_len(&self) -> usize {
        self.buffer_size as usize * self.channels as usize
    }

    /// Apply a `configureRecording` key/value payload.
    ///
    /// Recognized keys: `sampleRate`, `channels`, `bufferSize`, `audioQuality`,
    /// `amplitudeMin`, `amplitudeMax`. Unknown keys are ignored. Non-numeric
    /// values keep the old setting, except `audioQuality` (falls back to High)
    /// and the amplitude bounds (fall back to 0.0 / 1.0). An explicit `null`
    /// counts as absent.
    ///
    /// The payload is applied to a copy and committed only if it is valid as a
    /// whole, so a rejected payload leaves `self` untouched.
    pub fn apply_arguments(&mut self, arguments: &Value) -> Result<(), ConfigError> {
        let args = match arguments {
            Value::Null => {
                return Err(ConfigError::InvalidArguments(
                    "configuration arguments are required".into(),
                ))
            }
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::InvalidArguments(format!(
                    "expected a key/value map, got {}",
                    json_kind(other)
                )))
            }
        };

        let mut next = self.clone();

        if let Some(value) = present(args, "sampleRate") {
            if let Some(rate) = as_integer(value) {
                if !next.set_sample_rate(rate) {
                    log::debug!("ignoring unsupported sample rate {}", rate);
                }
            }
        }

        if let Some(value) = present(args, "channels") {
            if let Some(channels) = as_integer(value) {
                next.set_channels(channels);
            }
        }

        if let Some(value) = present(args, "bufferSize") {
            if let Some(size) = as_integer(value) {
                if !next.set_buffer_size(size) {
                    log::debug!("ignoring unsupported buffer size {}", size);
                }
            }
        }

        if let Some(value) = present(args, "audioQuality") {
            next.set_quality_ordinal(as_integer(value).unwrap_or(3));
        }

        if let Some(value) = present(args, "amplitudeMin") {
            next.amplitude_range.min = value.as_f64().unwrap_or(0.0);
        }

        if let Some(value) = present(args, "amplitudeMax") {
            next.amplitude_range.max = value.as_f64().unwrap_or(1.0);
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Strict check applied to typed configuration and to the result of a payload.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(ConfigError::Configuration(format!(
                "unsupported sample rate: {}",
                self.sample_rate
            )));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(ConfigError::Configuration(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if !VALID_BUFFER_SIZES.contains(&self.buffer_size) {
            return Err(ConfigError::Configuration(format!(
                "unsupported buffer size: {}",
                self.buffer_size
            )));
        }
        if !self.amplitude_range.min.is_finite() || !self.amplitude_range.max.is_finite() {
            return Err(ConfigError::Configuration("amplitude bounds must be finite".into()));
        }
        Ok(())
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            buffer_size: 1024,
            quality: AudioQuality::High,
            amplitude_range: AmplitudeRange::default(),
        }
    }
}

/// Process-level recorder options, fixed for the lifetime of a facade.
#[derive(Debug, Clone)]
pub struct RecorderOptions {
    /// Directory for recordings started without an explicit path.
    pub cache_dir: PathBuf,

    /// Minimum gap between two emitted amplitude events (default: 50 ms).
    pub emit_interval: Duration,

    /// How long `stop` waits for the read loop before force-releasing (default: 1 s).
    pub stop_timeout: Duration,

    /// Slots in the amplitude channel; events beyond this are dropped.
    pub amplitude_channel_capacity: usize,

    /// Write a `<file>.metadata.json` sidecar next to each recording.
    pub write_metadata: bool,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir(),
            emit_interval: Duration::from_millis(50),
            stop_timeout: Duration::from_secs(1),
            amplitude_channel_capacity: 16,
            write_metadata: false,
        }
    }
}

/// Numbers are truncated toward zero, matching integer coercion on the wire.
/// A key that is set to something other than JSON `null`.
fn present<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
