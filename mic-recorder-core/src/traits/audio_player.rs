use std::path::Path;

use crate::models::error::PlaybackError;

/// Interface for platform-specific file playback.
///
/// Implemented by `RodioPlayer` in `mic-recorder-cpal`. A player holds at most
/// one loaded file; [`PlaybackController`](crate::PlaybackController) owns the
/// state machine on top of it.
pub trait AudioPlayer: Send {
    /// Release any current handle, decode `path` and begin playing it.
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError>;

    /// Pause the loaded file.
    fn pause(&mut self) -> Result<(), PlaybackError>;

    /// Continue a paused file.
    fn resume(&mut self) -> Result<(), PlaybackError>;

    /// Stop playback and release the handle. Idempotent.
    fn stop(&mut self) -> Result<(), PlaybackError>;

    /// Whether the loaded file has played to the end (or nothing is loaded).
    /// Must not block.
    fn is_finished(&self) -> bool;
}
