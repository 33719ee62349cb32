use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::error::SinkError;
use crate::processing::{pcm, wav_format};
use crate::traits::encoder::{AudioEncoder, EncodedWriter, EncoderFormat};

/// Encoder producing 16-bit PCM RIFF/WAVE files.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header, sizes patched on finalize]
/// [interleaved little-endian i16 PCM...]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

impl WavEncoder {
    pub const CODEC: &'static str = "wav/pcm16";
}

impl AudioEncoder for WavEncoder {
    fn codec_name(&self) -> &str {
        Self::CODEC
    }

    fn file_extension(&self) -> &str {
        "wav"
    }

    fn create(&self, path: &Path, format: &EncoderFormat) -> Result<Box<dyn EncodedWriter>, SinkError> {
        if !(1..=2).contains(&format.channels) {
            return Err(SinkError::UnsupportedFormat(format!("{} channels", format.channels)));
        }
        if format.sample_rate == 0 {
            return Err(SinkError::UnsupportedFormat("sample rate 0 Hz".into()));
        }
        if format.bit_rate == 0 {
            return Err(SinkError::UnsupportedFormat("bit rate 0".into()));
        }

        let file = File::create(path)
            .map_err(|e| SinkError::Unwritable(format!("{}: {}", path.display(), e)))?;
        let spec = wav_format::WavSpec::pcm16(format.sample_rate, format.channels);

        let mut writer = WavFileWriter {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            channels: format.channels,
            data_bytes: 0,
        };
        writer.write_raw(&wav_format::generate_wav_header(spec, 0))?;
        Ok(Box::new(writer))
    }
}

/// Streaming writer for one WAV file. Created through [`WavEncoder`].
pub struct WavFileWriter {
    path: PathBuf,
    file: BufWriter<File>,
    channels: u16,
    data_bytes: u64,
}

impl WavFileWriter {
    fn write_raw(&mut self, data: &[u8]) -> Result<(), SinkError> {
        self.file
            .write_all(data)
            .map_err(|e| SinkError::Io(format!("write failed on {}: {}", self.path.display(), e)))
    }

    fn patch_u32(&mut self, offset: u64, value: u32) -> Result<(), SinkError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| SinkError::Io(e.to_string()))?;
        self.write_raw(&value.to_le_bytes())
    }
}

impl EncodedWriter for WavFileWriter {
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        if samples.is_empty() {
            return Ok(());
        }
        self.write_raw(&pcm::to_le_bytes(samples))?;
        self.data_bytes += samples.len() as u64 * 2;
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<u64, SinkError> {
        let data_size = wav_format::clamp_data_size(self.data_bytes);
        self.patch_u32(wav_format::RIFF_SIZE_OFFSET, wav_format::riff_chunk_size(data_size))?;
        self.patch_u32(wav_format::DATA_SIZE_OFFSET, data_size)?;
        self.file.flush().map_err(|e| SinkError::Io(e.to_string()))?;

        let bytes_per_frame = u64::from(self.channels) * 2;
        Ok(self.data_bytes / bytes_per_frame)
    }
}
