//! Sample-format conversions used between the hardware callback and the sink.
//!
//! Everything past the input boundary is interleaved signed 16-bit PCM.

/// Convert a normalized float sample to 16-bit, clamping out-of-range input.
pub fn f32_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// Convert an unsigned 16-bit sample (midpoint 32768) to signed.
pub fn u16_to_i16(sample: u16) -> i16 {
    (i32::from(sample) - 32768) as i16
}

/// Keep the 16 most significant bits of a 32-bit sample.
pub fn i32_to_i16(sample: i32) -> i16 {
    (sample >> 16) as i16
}

pub fn convert_f32(samples: &[f32]) -> Vec<i16> {
    samples.iter().copied().map(f32_to_i16).collect()
}

pub fn convert_u16(samples: &[u16]) -> Vec<i16> {
    samples.iter().copied().map(u16_to_i16).collect()
}

pub fn convert_i32(samples: &[i32]) -> Vec<i16> {
    samples.iter().copied().map(i32_to_i16).collect()
}

/// Serialize samples as little-endian bytes. Output length = `samples.len() * 2`.
pub fn to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), -i16::MAX);
        assert_eq!(f32_to_i16(-5.0), -i16::MAX);
        assert_eq!(f32_to_i16(f32::NAN), 0);
    }

    #[test]
    fn unsigned_midpoint_is_silence() {
        assert_eq!(u16_to_i16(32768), 0);
        assert_eq!(u16_to_i16(0), i16::MIN);
        assert_eq!(u16_to_i16(u16::MAX), i16::MAX);
    }

    #[test]
    fn wide_samples_keep_high_bits() {
        assert_eq!(i32_to_i16(i32::MAX), i16::MAX);
        assert_eq!(i32_to_i16(99 << 16), 99);
        assert_eq!(convert_i32(&[i32::MIN, 0]), vec![i16::MIN, 0]);
    }

    #[test]
    fn le_bytes_layout() {
        assert_eq!(to_le_bytes(&[1, -1, 0x1234]), vec![0x01, 0x00, 0xFF, 0xFF, 0x34, 0x12]);
    }
}
