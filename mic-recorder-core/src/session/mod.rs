pub mod amplitude_hub;
pub mod capture;
pub mod playback;
pub mod recorder;
