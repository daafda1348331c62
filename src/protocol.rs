//! Domain types shared by the mixer and the packet codec

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{LaneIdError, NameError};

/// Width of the fixed lane name field on the wire
pub const NAME_FIELD_LEN: usize = 3;

/// Identifier of a mixer lane, doubles as a one-byte wire identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LaneId(u8);

impl LaneId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for LaneId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl TryFrom<usize> for LaneId {
    type Error = LaneIdError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| LaneIdError(i64::try_from(value).unwrap_or(i64::MAX)))
    }
}

impl TryFrom<i64> for LaneId {
    type Error = LaneIdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value).map(Self).map_err(|_| LaneIdError(value))
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lane display name: 1~3 printable ASCII characters, no trailing space
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaneName(String);

impl LaneName {
    /// Name given to a freshly created lane
    pub const INITIAL: &'static str = "NEW";

    pub fn new(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if !name.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(NameError::NonPrintable);
        }
        if name.len() > NAME_FIELD_LEN {
            return Err(NameError::TooLong(name.len()));
        }
        // Trailing spaces are wire padding
        if name.ends_with(' ') {
            return Err(NameError::TrailingSpace);
        }

        Ok(Self(name.to_string()))
    }

    pub fn initial() -> Self {
        Self(Self::INITIAL.to_string())
    }

    /// Parse a fixed-width wire field, trailing spaces are padding
    pub fn from_field(field: &[u8]) -> Result<Self, NameError> {
        let end = field
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |pos| pos + 1);
        let trimmed = std::str::from_utf8(&field[..end]).map_err(|_| NameError::NonPrintable)?;
        Self::new(trimmed)
    }

    /// Fixed-width wire field, padded with spaces and truncated
    pub fn to_field(&self) -> [u8; NAME_FIELD_LEN] {
        let mut field = [b' '; NAME_FIELD_LEN];
        for (dst, src) in field.iter_mut().zip(self.0.bytes()) {
            *dst = src;
        }
        field
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LaneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LaneName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl TryFrom<&str> for LaneName {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Roster entry: one live lane with name and gain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneInfo {
    pub lane_id: LaneId,
    pub name: LaneName,
    pub gain_db: f32,
}

impl LaneInfo {
    pub fn new(lane_id: LaneId, name: LaneName, gain_db: f32) -> Self {
        Self {
            lane_id,
            name,
            gain_db,
        }
    }
}

/// Loudness report entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneLoudness {
    pub lane_id: LaneId,
    pub loudness_dbfs: f32,
}

impl LaneLoudness {
    pub fn new(lane_id: LaneId, loudness_dbfs: f32) -> Self {
        Self {
            lane_id,
            loudness_dbfs,
        }
    }
}
