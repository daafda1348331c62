//! Linear scale conversion
//!
//! Maps a value between two linear ranges, clamping at the endpoints:
//!
//! ```text
//!  -80     0     80   scale 1 (gain dB)
//!   |------|------|
//!   0    127.5   255  scale 2 (wire byte)
//! ```

use crate::error::ScaleError;

/// Gain in dB `[-80, 80]` to one wire byte `[0, 255]`
pub const GAIN_SCALE: ScaleConverter = ScaleConverter::from_parts(-80.0, 80.0, 0.0, 255.0);

/// Loudness in dBFS `[-80, 0]` to one wire byte `[0, 255]`
pub const LOUDNESS_SCALE: ScaleConverter = ScaleConverter::from_parts(-80.0, 0.0, 0.0, 255.0);

/// Bidirectional affine map between two ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConverter {
    s1_low: f32,
    s1_high: f32,
    s2_low: f32,
    s2_high: f32,
}

impl ScaleConverter {
    /// Create a converter, both ranges must satisfy `low < high`
    pub fn new(s1_low: f32, s1_high: f32, s2_low: f32, s2_high: f32) -> Result<Self, ScaleError> {
        // `!(a < b)` also rejects NaN endpoints
        if !(s1_low < s1_high) {
            return Err(ScaleError::InvalidRange { low: s1_low, high: s1_high });
        }
        if !(s2_low < s2_high) {
            return Err(ScaleError::InvalidRange { low: s2_low, high: s2_high });
        }

        Ok(Self::from_parts(s1_low, s1_high, s2_low, s2_high))
    }

    const fn from_parts(s1_low: f32, s1_high: f32, s2_low: f32, s2_high: f32) -> Self {
        Self {
            s1_low,
            s1_high,
            s2_low,
            s2_high,
        }
    }

    /// Convert from scale 1 to scale 2
    ///
    /// Values outside scale 1 return the nearest scale 2 endpoint.
    pub fn s1_to_s2(&self, value: f32) -> f32 {
        Self::map(value, self.s1_low, self.s1_high, self.s2_low, self.s2_high)
    }

    /// Convert from scale 2 to scale 1
    ///
    /// Values outside scale 2 return the nearest scale 1 endpoint.
    pub fn s2_to_s1(&self, value: f32) -> f32 {
        Self::map(value, self.s2_low, self.s2_high, self.s1_low, self.s1_high)
    }

    /// Convert from scale 1 to a byte, rounding to the nearest step
    ///
    /// Only meaningful when scale 2 is `[0, 255]`.
    pub fn to_byte(&self, value: f32) -> u8 {
        self.s1_to_s2(value).round().clamp(0.0, 255.0) as u8
    }

    /// Convert a byte on scale 2 back to scale 1
    pub fn from_byte(&self, byte: u8) -> f32 {
        self.s2_to_s1(byte as f32)
    }

    fn map(value: f32, from_low: f32, from_high: f32, to_low: f32, to_high: f32) -> f32 {
        if value <= from_low {
            return to_low;
        }
        if value >= from_high {
            return to_high;
        }

        let normalized = (value - from_low) / (from_high - from_low);
        normalized * (to_high - to_low) + to_low
    }
}
