//! Error types for the intercom mixer

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Mixer error: {0}")]
    Mixer(#[from] MixerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Packet structure and encoding input errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PacketError {
    #[error("Empty packet passed")]
    Empty,

    #[error("Not a {kind} packet - type ID should be {expected}, but got {actual:#04x}")]
    TypeMismatch {
        kind: &'static str,
        expected: String,
        actual: u8,
    },

    #[error("Too short bytes received, external bytes length field missing")]
    MissingExtLength,

    #[error("Too short bytes as {kind} packet - expected {expected}, but got {actual}")]
    TooShort {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Too long bytes as {kind} packet - expected {expected}, but got {actual}")]
    TooLong {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid length as {kind} packet - {payload} payload bytes is not a multiple of {record_size}")]
    MisalignedRecords {
        kind: &'static str,
        record_size: usize,
        payload: usize,
    },

    #[error("Unknown packet type ID {0:#04x}")]
    UnknownType(u8),

    #[error("Unexpected {0} message, binary packet expected")]
    UnexpectedMessage(&'static str),

    #[error("Invalid frame size - expected {expected} samples, but got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    #[error("For ext_bytes, over 255 bytes data is not allowed, but got {0} bytes")]
    ExtTooLong(usize),

    #[error("Gain must be under or equal 80 dB, but got {0}")]
    GainOutOfRange(f32),

    #[error("Silent threshold must be 0 or negative dBFS, but got {0}")]
    InvalidSilentThreshold(f32),

    #[error("Invalid lane name: {0}")]
    Name(#[from] NameError),

    #[error("Frame loudness: {0}")]
    Loudness(#[from] LoudnessError),
}

/// Lane name validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NameError {
    #[error("lane name can't be empty")]
    Empty,

    #[error("over 3 characters is not allowed, but got {0} characters")]
    TooLong(usize),

    #[error("non ascii or control ascii characters are not allowed")]
    NonPrintable,

    #[error("trailing spaces are not allowed")]
    TrailingSpace,
}

/// Lane id domain errors
#[derive(Error, Debug, Clone, PartialEq)]
#[error("lane id must be in 0~255, but got {0}")]
pub struct LaneIdError(pub i64);

/// Mixing engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixerError {
    #[error("Already reached to maximum lane count: {0}")]
    MaxLanesReached(usize),

    #[error("The lane id {0} is not existing")]
    NonExistingLane(u8),

    #[error("Unexpected frame sample count - expected {expected}, but got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    #[error("Gain must be under or equal 80 dB, but got {0}")]
    GainOutOfRange(f32),

    #[error("Invalid mixer parameter: {0}")]
    InvalidParameter(String),
}

/// Loudness measurement errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoudnessError {
    #[error("Empty frame passed")]
    EmptyFrame,

    #[error("Out of range sample {value} at index {index}, must be -1.0 ~ 1.0")]
    SampleOutOfRange { index: usize, value: f32 },
}

/// Scale converter construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("Must be low < high, but got low ({low}) >= high ({high})")]
    InvalidRange { low: f32, high: f32 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
