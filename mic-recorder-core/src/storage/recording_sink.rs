use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::RecordingConfig;
use crate::models::error::SinkError;
use crate::models::recording_result::{frames_to_secs, RecordingMetadata, RecordingResult};
use crate::storage::metadata;
use crate::traits::encoder::{AudioEncoder, EncodedWriter, EncoderFormat};

/// File name used when a recording starts without an explicit path.
pub const DEFAULT_FILE_STEM: &str = "mic_stream_recording";

/// Default recording location: `<cache_dir>/mic_stream_recording.<ext>`.
pub fn default_recording_path(cache_dir: &Path, encoder: &dyn AudioEncoder) -> PathBuf {
    cache_dir.join(format!("{}.{}", DEFAULT_FILE_STEM, encoder.file_extension()))
}

/// Destination of one capture window.
///
/// Owns the output path and the open encoder writer. Writes never fail the
/// caller; failures are counted and the last one is kept for the result.
pub struct RecordingSink {
    path: PathBuf,
    codec: String,
    config: RecordingConfig,
    writer: Option<Box<dyn EncodedWriter>>,
    write_failures: u64,
    last_error: Option<SinkError>,
    write_metadata: bool,
}

impl RecordingSink {
    /// Create parent directories, open the file and write the container header.
    pub fn open(
        encoder: &dyn AudioEncoder,
        path: impl Into<PathBuf>,
        config: &RecordingConfig,
    ) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| SinkError::Unwritable(format!("failed to create {}: {}", parent.display(), e)))?;
        }

        let format = EncoderFormat {
            sample_rate: config.sample_rate,
            channels: config.channels,
            bit_rate: config.quality.bit_rate(),
        };
        let writer = encoder.create(&path, &format)?;
        log::debug!(
            "Opened {} sink at {} ({} Hz, {} ch, {} bps)",
            encoder.codec_name(),
            path.display(),
            format.sample_rate,
            format.channels,
            format.bit_rate
        );

        Ok(Self {
            path,
            codec: encoder.codec_name().to_string(),
            config: config.clone(),
            writer: Some(writer),
            write_failures: 0,
            last_error: None,
            write_metadata: false,
        })
    }

    /// Also write a `<file>.metadata.json` sidecar on close.
    pub fn with_metadata(mut self, enabled: bool) -> Self {
        self.write_metadata = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    /// Encode one block of interleaved samples.
    pub fn write(&mut self, block: &[i16]) {
        let result = match self.writer.as_mut() {
            Some(writer) => writer.write_samples(block),
            None => Err(SinkError::NotOpen),
        };
        if let Err(e) = result {
            self.write_failures += 1;
            if self.write_failures == 1 {
                log::error!("Recording write failed for {}: {}", self.path.display(), e);
            } else {
                log::debug!("Recording write failed ({} so far): {}", self.write_failures, e);
            }
            self.last_error = Some(e);
        }
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    pub fn last_error(&self) -> Option<&SinkError> {
        self.last_error.as_ref()
    }

    /// Finalize the container and compute its checksum.
    ///
    /// A sink that never received samples still produces a valid, header-only file.
    pub fn close(mut self) -> Result<RecordingResult, SinkError> {
        let writer = self.writer.take().ok_or(SinkError::NotOpen)?;
        let frames_written = writer.finalize()?;
        let checksum = sha256_file(&self.path)?;

        let file_path = self.path.to_string_lossy().into_owned();
        let metadata = RecordingMetadata::new(
            &file_path,
            &self.config,
            &self.codec,
            frames_written,
            &checksum,
            self.write_failures,
        );
        if self.write_metadata {
            if let Err(e) = metadata::write_metadata(&metadata, &self.path) {
                log::warn!("Failed to write metadata sidecar: {}", e);
            }
        }

        log::info!(
            "Recording finalized: {} ({} frames, {:.2}s)",
            self.path.display(),
            frames_written,
            metadata.duration_secs
        );

        Ok(RecordingResult {
            file_path: self.path.clone(),
            duration_secs: frames_to_secs(frames_written, self.config.sample_rate),
            frames_written,
            metadata,
            checksum,
        })
    }

    /// Close the writer and remove the partial file.
    pub fn discard(mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                log::debug!("Finalize before discard failed: {}", e);
            }
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Discarded recording at {}", self.path.display()),
            Err(e) => log::warn!("Failed to remove discarded recording {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for RecordingSink {
    fn drop(&mut self) {
        // Leave a playable file behind even if the owner never closed us.
        if let Some(writer) = self.writer.take() {
            log::warn!("Recording sink for {} dropped without close", self.path.display());
            if let Err(e) = writer.finalize() {
                log::error!("Failed to finalize dropped recording: {}", e);
            }
        }
    }
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, SinkError> {
    let data = fs::read(path).map_err(|e| SinkError::Io(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&Sha256::digest(&data)))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format;
    use crate::storage::wav_writer::WavEncoder;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("mic_recorder_sink_{}", uuid::Uuid::new_v4()))
    }

    struct FailingWriter;

    impl EncodedWriter for FailingWriter {
        fn write_samples(&mut self, _samples: &[i16]) -> Result<(), SinkError> {
            Err(SinkError::Io("disk full".into()))
        }

        fn finalize(self: Box<Self>) -> Result<u64, SinkError> {
            Ok(0)
        }
    }

    struct FailingEncoder;

    impl AudioEncoder for FailingEncoder {
        fn codec_name(&self) -> &str {
            "failing"
        }

        fn file_extension(&self) -> &str {
            "bin"
        }

        fn create(&self, path: &Path, _format: &EncoderFormat) -> Result<Box<dyn EncodedWriter>, SinkError> {
            fs::write(path, b"").map_err(|e| SinkError::Unwritable(e.to_string()))?;
            Ok(Box::new(FailingWriter))
        }
    }

    #[test]
    fn default_path_uses_encoder_extension() {
        let path = default_recording_path(Path::new("/cache"), &WavEncoder);
        assert_eq!(path, PathBuf::from("/cache/mic_stream_recording.wav"));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = temp_dir();
        let path = dir.join("a").join("b").join("rec.wav");
        let sink = RecordingSink::open(&WavEncoder, &path, &RecordingConfig::default()).unwrap();
        assert!(path.exists());
        sink.discard();
        assert!(!path.exists());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn close_reports_frames_duration_and_checksum() {
        let dir = temp_dir();
        let path = dir.join("rec.wav");
        let config = RecordingConfig {
            sample_rate: 8000,
            channels: 2,
            ..Default::default()
        };

        let mut sink = RecordingSink::open(&WavEncoder, &path, &config).unwrap();
        sink.write(&vec![100i16; 8000]);
        sink.write(&vec![-100i16; 8000]);
        let result = sink.close().unwrap();

        assert_eq!(result.frames_written, 8000);
        assert!((result.duration_secs - 1.0).abs() < 1e-9);
        assert_eq!(result.checksum.len(), 64);
        assert_eq!(result.checksum, sha256_file(&path).unwrap());
        assert_eq!(result.metadata.codec, WavEncoder::CODEC);
        assert_eq!(result.metadata.channels, 2);
        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 32000);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn empty_sink_closes_to_header_only_file() {
        let dir = temp_dir();
        let path = dir.join("empty.wav");
        let sink = RecordingSink::open(&WavEncoder, &path, &RecordingConfig::default()).unwrap();
        let result = sink.close().unwrap();

        assert_eq!(result.frames_written, 0);
        assert_eq!(result.duration_secs, 0.0);
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), wav_format::WAV_HEADER_SIZE);
        assert!(wav_format::parse_wav_header(&bytes).is_some());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn write_failures_are_counted_not_raised() {
        let dir = temp_dir();
        let path = dir.join("fail.bin");
        let mut sink = RecordingSink::open(&FailingEncoder, &path, &RecordingConfig::default()).unwrap();
        sink.write(&[1, 2, 3]);
        sink.write(&[4, 5, 6]);

        assert_eq!(sink.write_failures(), 2);
        assert_eq!(sink.last_error(), Some(&SinkError::Io("disk full".into())));

        let result = sink.close().unwrap();
        assert_eq!(result.metadata.write_failures, 2);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn metadata_sidecar_is_opt_in() {
        let dir = temp_dir();
        let path = dir.join("meta.wav");

        RecordingSink::open(&WavEncoder, &path, &RecordingConfig::default())
            .unwrap()
            .close()
            .unwrap();
        assert!(!metadata::metadata_path(&path).exists());

        let result = RecordingSink::open(&WavEncoder, &path, &RecordingConfig::default())
            .unwrap()
            .with_metadata(true)
            .close()
            .unwrap();
        let sidecar = metadata::read_metadata(&path).unwrap();
        assert_eq!(sidecar.checksum, result.checksum);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn dropped_sink_still_leaves_valid_header() {
        let dir = temp_dir();
        let path = dir.join("dropped.wav");
        {
            let mut sink = RecordingSink::open(&WavEncoder, &path, &RecordingConfig::default()).unwrap();
            sink.write(&[7i16; 10]);
        }
        let bytes = fs::read(&path).unwrap();
        assert_eq!(wav_format::parse_wav_header(&bytes).unwrap().1, 20);
        fs::remove_dir_all(dir).ok();
    }
}
