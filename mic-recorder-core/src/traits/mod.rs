pub mod audio_input;
pub mod audio_player;
pub mod encoder;
pub mod permission;
pub mod recorder_delegate;
