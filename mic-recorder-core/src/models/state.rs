use serde::Serialize;

/// Capture session state machine.
///
/// ```text
/// idle → starting → active → stopping → idle
///            ↓         ↓
///          idle      idle   (start failure / unrecoverable stream error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Idle,
    Starting,
    Active,
    Stopping,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether a session currently holds the hardware input.
    pub fn is_busy(&self) -> bool {
        !self.is_idle()
    }
}

/// Recorder-level lifecycle reported to the delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Playback state machine.
///
/// ```text
/// idle/stopped → playing ⇄ paused
///                   ↓        ↓
///                stopped ← ──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Whether the controller currently holds a player handle.
    pub fn has_handle(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}
