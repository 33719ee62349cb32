use serde::Serialize;

/// Microphone access as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Permission collaborator consulted before a recording starts.
///
/// `request` may block while the platform prompts the user.
pub trait MicrophonePermission: Send + Sync {
    fn status(&self) -> PermissionStatus;

    fn request(&self) -> PermissionStatus;
}

/// Permission gate for platforms without a microphone consent model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeGranted;

impl MicrophonePermission for AssumeGranted {
    fn status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }
}
