use thiserror::Error;

/// Errors raised by the capture path (hardware input + read loop).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("a capture session is already active")]
    AlreadyActive,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("input stream failed: {0}")]
    StreamFailed(String),

    #[error("timed out waiting for the read loop to exit")]
    Timeout,
}

impl CaptureError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyActive => "ALREADY_RECORDING",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::DeviceUnavailable(_) | Self::StreamFailed(_) | Self::Timeout => "RECORDING_ERROR",
        }
    }
}

/// Errors raised while opening, writing or finalizing a recording file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("path is not writable: {0}")]
    Unwritable(String),

    #[error("encoder rejected format: {0}")]
    UnsupportedFormat(String),

    #[error("storage error: {0}")]
    Io(String),

    #[error("recording file is not open")]
    NotOpen,
}

impl SinkError {
    pub fn code(&self) -> &'static str {
        "RECORDING_ERROR"
    }
}

/// Errors raised by the playback path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("file path is required for playback")]
    MissingArgument,

    #[error("audio file does not exist at {0}")]
    FileNotFound(String),

    #[error("failed to play recording: {0}")]
    Playback(String),

    #[error("failed to pause playback: {0}")]
    Pause(String),

    #[error("failed to stop playback: {0}")]
    Stop(String),
}

impl PlaybackError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument => "MISSING_ARGUMENT",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::Playback(_) => "PLAYBACK_ERROR",
            Self::Pause(_) => "PAUSE_ERROR",
            Self::Stop(_) => "STOP_PLAYBACK_ERROR",
        }
    }
}

/// Errors raised while applying a configuration payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration arguments: {0}")]
    InvalidArguments(String),

    #[error("failed to configure recording: {0}")]
    Configuration(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Top-level error returned by [`RecorderFacade`](crate::RecorderFacade).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("recording is already in progress")]
    AlreadyRecording,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RecorderError {
    /// Stable wire code for the transport layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRecording => "ALREADY_RECORDING",
            Self::Capture(e) => e.code(),
            Self::Sink(e) => e.code(),
            Self::Playback(e) => e.code(),
            Self::Config(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RecorderError::AlreadyRecording.code(), "ALREADY_RECORDING");
        assert_eq!(RecorderError::from(CaptureError::PermissionDenied).code(), "PERMISSION_DENIED");
        assert_eq!(
            RecorderError::from(CaptureError::DeviceUnavailable("gone".into())).code(),
            "RECORDING_ERROR"
        );
        assert_eq!(
            RecorderError::from(PlaybackError::FileNotFound("/x".into())).code(),
            "FILE_NOT_FOUND"
        );
        assert_eq!(PlaybackError::Stop("busy".into()).code(), "STOP_PLAYBACK_ERROR");
        assert_eq!(
            RecorderError::from(ConfigError::InvalidArguments("null".into())).code(),
            "INVALID_ARGUMENTS"
        );
    }

    #[test]
    fn messages_are_human_readable() {
        let err = PlaybackError::FileNotFound("/tmp/missing.wav".into());
        assert_eq!(err.to_string(), "audio file does not exist at /tmp/missing.wav");
    }
}
