use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::{AudioQuality, RecordingConfig};

/// Result returned when a recording sink is finalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub frames_written: u64,
    pub metadata: RecordingMetadata,
    pub checksum: String,
}

/// Metadata describing a finished recording.
///
/// Serializable for the optional JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    pub duration_secs: f64,
    pub frames_written: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub quality: AudioQuality,
    pub bit_rate: u32,
    pub codec: String,
    pub checksum: String,
    pub created_at: String,
    pub write_failures: u64,
}

impl RecordingMetadata {
    pub fn new(
        file_path: &str,
        config: &RecordingConfig,
        codec: &str,
        frames_written: u64,
        checksum: &str,
        write_failures: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string(),
            duration_secs: frames_to_secs(frames_written, config.sample_rate),
            frames_written,
            sample_rate: config.sample_rate,
            channels: config.channels,
            quality: config.quality,
            bit_rate: config.quality.bit_rate(),
            codec: codec.to_string(),
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            write_failures,
        }
    }
}

pub(crate) fn frames_to_secs(frames: u64, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64
}
