//! Frame loudness metering in dBFS

use crate::error::LoudnessError;

/// Full scale amplitude of float PCM
const AMPLITUDE_HIGH: f64 = 1.0;

/// Calculate dBFS of a float PCM frame
///
/// Every sample must be in `-1.0 ~ 1.0`. An all-zero frame yields negative
/// infinity, callers clamp before putting it on the wire.
pub fn loudness(frame: &[f32]) -> Result<f32, LoudnessError> {
    if frame.is_empty() {
        return Err(LoudnessError::EmptyFrame);
    }

    if let Some((index, &value)) = frame
        .iter()
        .enumerate()
        .find(|(_, s)| !(-1.0..=1.0).contains(*s))
    {
        return Err(LoudnessError::SampleOutOfRange { index, value });
    }

    Ok(rms_dbfs(frame))
}

/// Calculate dBFS without range checking
///
/// Gain-scaled frames may exceed full scale, then the result is above 0 dBFS.
/// An empty frame yields negative infinity.
pub fn rms_dbfs(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return f32::NEG_INFINITY;
    }

    let sq_sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sq_sum / frame.len() as f64).sqrt();

    (20.0 * (rms / AMPLITUDE_HIGH).log10()) as f32
}

/// Linear amplitude factor for a gain in dB
pub fn db_to_amplitude(gain_db: f32) -> f32 {
    10f32.powf(gain_db / 20.0)
}
