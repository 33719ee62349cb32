//! RIFF/WAVE header helpers for 16-bit PCM recordings.
//!
//! The header is written with a zero data size when a recording opens and
//! patched in place once the final byte count is known.

pub const WAV_HEADER_SIZE: usize = 44;

pub const PCM_BIT_DEPTH: u16 = 16;

/// Offset of the RIFF chunk size field.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the data chunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Format fields carried in the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl WavSpec {
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bit_depth: PCM_BIT_DEPTH,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }
}

/// Build the 44-byte header.
///
/// ```text
/// [0-3]    "RIFF"          [22-23]  channels
/// [4-7]    36 + data_size  [24-27]  sample_rate
/// [8-11]   "WAVE"          [28-31]  byte_rate
/// [12-15]  "fmt "          [32-33]  block_align
/// [16-19]  16              [34-35]  bit_depth
/// [20-21]  1 (PCM)         [36-39]  "data"
///                          [40-43]  data_size
/// ```
pub fn generate_wav_header(spec: WavSpec, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_chunk_size(data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&spec.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&spec.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&spec.bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// RIFF chunk size for a given data size. Saturates for files past 4 GiB.
pub fn riff_chunk_size(data_size: u32) -> u32 {
    data_size.saturating_add(36)
}

/// Clamp a running byte count to what the 32-bit size fields can hold.
pub fn clamp_data_size(bytes: u64) -> u32 {
    u32::try_from(bytes).unwrap_or(u32::MAX)
}

/// Parse a header written by [`generate_wav_header`].
///
/// Returns the format and the declared data size, or `None` if the bytes are
/// not a canonical 16-bit PCM header.
pub fn parse_wav_header(bytes: &[u8]) -> Option<(WavSpec, u32)> {
    if bytes.len() < WAV_HEADER_SIZE
        || &bytes[0..4] != b"RIFF"
        || &bytes[8..12] != b"WAVE"
        || &bytes[12..16] != b"fmt "
        || &bytes[36..40] != b"data"
    {
        return None;
    }
    let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

    if u16_at(20) != 1 {
        return None;
    }
    let spec = WavSpec {
        channels: u16_at(22),
        sample_rate: u32_at(24),
        bit_depth: u16_at(34),
    };
    Some((spec, u32_at(40)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_44_bytes() {
        let header = generate_wav_header(WavSpec::pcm16(44100, 1), 0);
        assert_eq!(header.len(), 44);
    }

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(WavSpec::pcm16(44100, 1), 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_48khz_stereo_16bit() {
        let header = generate_wav_header(WavSpec::pcm16(48000, 2), 9600);

        let channels = u16::from_le_bytes([header[22], header[23]]);
        assert_eq!(channels, 2);

        let byte_rate = u32::from_le_bytes([header[28], header[29], header[30], header[31]]);
        assert_eq!(byte_rate, 192000); // 48000 * 2 * 16/8

        let block_align = u16::from_le_bytes([header[32], header[33]]);
        assert_eq!(block_align, 4);

        let chunk_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        assert_eq!(chunk_size, 36 + 9600);
    }

    #[test]
    fn parse_reads_back_generated_header() {
        let header = generate_wav_header(WavSpec::pcm16(8000, 1), 2048);
        let (spec, data_size) = parse_wav_header(&header).unwrap();
        assert_eq!(spec, WavSpec::pcm16(8000, 1));
        assert_eq!(spec.byte_rate(), 16000);
        assert_eq!(data_size, 2048);
    }

    #[test]
    fn parse_rejects_foreign_bytes() {
        assert!(parse_wav_header(b"RIFF").is_none());
        let mut header = generate_wav_header(WavSpec::pcm16(8000, 1), 0);
        header[20] = 3; // IEEE float
        assert!(parse_wav_header(&header).is_none());
    }

    #[test]
    fn sizes_saturate_past_u32() {
        assert_eq!(clamp_data_size(u64::from(u32::MAX) + 10), u32::MAX);
        assert_eq!(riff_chunk_size(u32::MAX - 1), u32::MAX);
    }
}
