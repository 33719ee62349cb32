use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An audio input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Hardware format requested from an [`AudioInput`](crate::AudioInput).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Preferred hardware buffer in frames. Backends may fall back to their default.
    pub buffer_frames: u32,
}

/// Handle describing a started capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureHandle {
    pub id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub file_path: Option<PathBuf>,
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureDiagnostics {
    pub callback_count: u64,
    pub samples_received: u64,
    pub blocks_processed: u64,
    pub amplitude_events_emitted: u64,
    pub amplitude_events_throttled: u64,
    pub amplitude_events_dropped: u64,
    pub sink_write_failures: u64,
}
