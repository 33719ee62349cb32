pub mod metadata;
pub mod recording_sink;
pub mod wav_writer;
