use std::path::{Path, PathBuf};

use crate::models::error::PlaybackError;
use crate::models::state::PlaybackState;
use crate::traits::audio_player::AudioPlayer;

/// Playback state machine over one [`AudioPlayer`].
///
/// `pause` and `stop` outside a playback are no-ops, as is `resume` outside a
/// pause. A file that plays to its end reads as [`PlaybackState::Stopped`].
pub struct PlaybackController<P: AudioPlayer> {
    player: P,
    state: PlaybackState,
    current: Option<PathBuf>,
}

impl<P: AudioPlayer> PlaybackController<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            state: PlaybackState::Idle,
            current: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.state.is_playing() && self.player.is_finished() {
            PlaybackState::Stopped
        } else {
            self.state
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Release any current handle, then load and start `path`.
    pub fn play(&mut self, path: &Path) -> Result<(), PlaybackError> {
        if path.as_os_str().is_empty() {
            return Err(PlaybackError::MissingArgument);
        }

        self.release();
        if !path.is_file() {
            return Err(PlaybackError::FileNotFound(path.display().to_string()));
        }

        self.player.load(path)?;
        self.state = PlaybackState::Playing;
        self.current = Some(path.to_path_buf());
        log::info!("Playback started: {}", path.display());
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.state() != PlaybackState::Playing {
            return Ok(());
        }
        self.player.pause()?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Paused {
            return Ok(());
        }
        self.player.resume()?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        if !self.state.has_handle() {
            return Ok(());
        }
        self.player.stop()?;
        self.state = PlaybackState::Stopped;
        self.current = None;
        log::info!("Playback stopped");
        Ok(())
    }

    /// Drop the current handle without surfacing errors; leaves the state `Stopped`.
    fn release(&mut self) {
        if self.state.has_handle() {
            if let Err(e) = self.player.stop() {
                log::warn!("Failed to release previous playback: {}", e);
            }
        }
        self.state = PlaybackState::Stopped;
        self.current = None;
    }
}
