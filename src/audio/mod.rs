//! Audio utilities shared by the codec and the mixer

pub mod loudness;
pub mod pcm;
pub mod scale;

pub use loudness::{db_to_amplitude, loudness, rms_dbfs};
pub use scale::{ScaleConverter, GAIN_SCALE, LOUDNESS_SCALE};
