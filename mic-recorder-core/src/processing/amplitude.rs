//! Block loudness metering.
//!
//! All sample formats are measured in the signed 16-bit integer domain: the
//! RMS of a block is taken over raw `i16`-scale values, converted with
//! `20·log10(rms + 1)`, clamped to `[0, 80]` dB and mapped linearly onto the
//! caller's [`AmplitudeRange`]. In this domain a full-scale sine sits near
//! 87 dB (clamped to the top of the range) and digital silence is exactly 0 dB.

use crate::models::config::AmplitudeRange;

/// Lower edge of the clamping window, in dB.
pub const FLOOR_DB: f64 = 0.0;

/// Upper edge of the clamping window, in dB.
pub const CEILING_DB: f64 = 80.0;

/// Added to the RMS before the logarithm so silence maps to 0 dB.
const RMS_EPSILON: f64 = 1.0;

/// A PCM sample that can be expressed in the 16-bit integer domain.
pub trait PcmSample: Copy {
    fn to_i16_domain(self) -> f64;
}

impl PcmSample for i16 {
    fn to_i16_domain(self) -> f64 {
        f64::from(self)
    }
}

impl PcmSample for i32 {
    fn to_i16_domain(self) -> f64 {
        f64::from(self) / 65536.0
    }
}

impl PcmSample for f32 {
    fn to_i16_domain(self) -> f64 {
        f64::from(self.clamp(-1.0, 1.0)) * f64::from(i16::MAX)
    }
}

/// Root-mean-square of a block, in the 16-bit domain. Empty blocks are 0.
pub fn rms<S: PcmSample>(samples: &[S]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|s| {
            let v = s.to_i16_domain();
            v * v
        })
        .sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Loudness of a block in dB, clamped to `[FLOOR_DB, CEILING_DB]`.
pub fn level_db<S: PcmSample>(samples: &[S]) -> f64 {
    let db = 20.0 * (rms(samples) + RMS_EPSILON).log10();
    if db.is_nan() {
        return FLOOR_DB;
    }
    db.clamp(FLOOR_DB, CEILING_DB)
}

/// Loudness of a block mapped to `[0, 1]`.
pub fn normalized_level<S: PcmSample>(samples: &[S]) -> f64 {
    (level_db(samples) - FLOOR_DB) / (CEILING_DB - FLOOR_DB)
}

/// Measure a block and rescale it into `range`.
///
/// Empty and all-zero blocks return `range.min`. The result always lies
/// within `[range.lower(), range.upper()]`; an inverted range yields a
/// reversed scale.
pub fn measure<S: PcmSample>(samples: &[S], range: AmplitudeRange) -> f64 {
    if samples.is_empty() {
        return range.min;
    }
    rescale(normalized_level(samples), range)
}

/// Map a `[0, 1]` value onto `range`.
///
/// Weighted form so bounds near `f64::MAX` of opposite sign cannot overflow
/// the span; a non-finite result falls back to `range.min`.
pub fn rescale(normalized: f64, range: AmplitudeRange) -> f64 {
    let t = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
    let value = range.min * (1.0 - t) + range.max * t;
    if !value.is_finite() {
        return range.min;
    }
    value.clamp(range.lower(), range.upper())
}
