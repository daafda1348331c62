//! PCM sample conversion
//!
//! Float samples in `-1.0 ~ 1.0` travel as signed 16-bit little-endian
//! integers. Byte order is explicit, so results do not depend on the host.

use bytes::{Buf, BufMut};

/// Float to int16 scale factor
pub const INT16_SCALE: f32 = 32767.0;

/// Bytes per int16 sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert float samples to int16 with `round(x * 32767)`
///
/// Samples outside `-1.0 ~ 1.0` saturate.
pub fn float_to_int16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * INT16_SCALE).round() as i16)
        .collect()
}

/// Convert int16 samples to float with `x / 32767`
///
/// `i16::MIN` would land just below -1.0, so results are clamped.
pub fn int16_to_float(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&s| (s as f32 / INT16_SCALE).max(-1.0))
        .collect()
}

/// Append int16 samples to `out` as little-endian bytes
pub fn put_int16_le(out: &mut impl BufMut, samples: &[i16]) {
    for &sample in samples {
        out.put_i16_le(sample);
    }
}

/// Read little-endian int16 samples
///
/// Returns `None` if the byte count is odd.
pub fn int16_from_le_bytes(mut bytes: &[u8]) -> Option<Vec<i16>> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return None;
    }

    let mut samples = Vec::with_capacity(bytes.len() / BYTES_PER_SAMPLE);
    while bytes.has_remaining() {
        samples.push(bytes.get_i16_le());
    }
    Some(samples)
}
