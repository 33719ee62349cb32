pub mod amplitude;
pub mod block_queue;
pub mod pcm;
pub mod ring_buffer;
pub mod throttle;
pub mod wav_format;
