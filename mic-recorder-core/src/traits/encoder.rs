use std::path::Path;

use crate::models::error::SinkError;

/// Format handed to an encoder when a recording file is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Target bitrate in bits per second, from the configured quality preset.
    pub bit_rate: u32,
}

/// Opaque codec used by the recording sink.
///
/// An encoder is a stateless factory; every recording gets its own
/// [`EncodedWriter`].
pub trait AudioEncoder: Send + Sync {
    /// Short codec identifier stored in recording metadata (e.g. `"wav/pcm16"`).
    fn codec_name(&self) -> &str;

    /// Extension used for default file names, without the dot.
    fn file_extension(&self) -> &str;

    /// Create `path` and prepare it for `format`.
    ///
    /// Fails with [`SinkError::UnsupportedFormat`] if the codec cannot encode
    /// `format`, and with [`SinkError::Unwritable`] if the file cannot be created.
    fn create(&self, path: &Path, format: &EncoderFormat) -> Result<Box<dyn EncodedWriter>, SinkError>;
}

/// A single open recording file.
pub trait EncodedWriter: Send {
    /// Encode interleaved 16-bit PCM samples.
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError>;

    /// Write trailers/headers and close the file. Returns the number of frames written.
    fn finalize(self: Box<Self>) -> Result<u64, SinkError>;
}
