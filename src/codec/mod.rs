//! Binary packet codec
//!
//! Every packet starts with one type ID byte:
//!
//! | Kind                | ID   | Payload                                          |
//! |---------------------|------|--------------------------------------------------|
//! | audio               | 0x10 | name(3) + ext len(1) + ext + int16 LE samples    |
//! | silent audio        | 0x11 | name(3) + ext len(1) + ext                       |
//! | gain modify         | 0x20 | lane id(1) + gain(1)                             |
//! | lane roster         | 0x30 | repeated lane id(1) + name(3) + gain(1)          |
//! | lane created        | 0x31 | lane id(1) + name(3) + gain(1)                   |
//! | lane modified       | 0x32 | lane id(1) + name(3) + gain(1)                   |
//! | lane deleted        | 0x33 | lane id(1)                                       |
//! | lanes loudness      | 0x40 | repeated lane id(1) + loudness(1)                |
//!
//! Each kind module has `encode`, `decode`, `validate` and `is_packet`.
//! `validate` names the exact structural defect, `is_packet` only answers
//! yes or no. `decode` always validates first.

pub mod audio;
pub mod gain;
pub mod loudness;
pub mod notice;
pub mod roster;

pub use audio::AudioPacket;
pub use gain::GainModify;

use bytes::Bytes;

use crate::audio::GAIN_SCALE;
use crate::error::PacketError;
use crate::protocol::{LaneId, LaneInfo, LaneLoudness, LaneName, NAME_FIELD_LEN};

/// Size of one lane info record (id + name + gain)
pub const LANE_INFO_RECORD_LEN: usize = 1 + NAME_FIELD_LEN + 1;

/// Any decoded packet
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Audio(AudioPacket),
    GainModify(GainModify),
    LaneRoster(Vec<LaneInfo>),
    LaneCreated(LaneInfo),
    LaneModified(LaneInfo),
    LaneDeleted(LaneId),
    LanesLoudness(Vec<LaneLoudness>),
}

impl Packet {
    /// Decode any packet kind by its type ID
    pub fn decode(raw: &[u8]) -> Result<Self, PacketError> {
        let type_id = *raw.first().ok_or(PacketError::Empty)?;

        match type_id {
            audio::AUDIO_PACKET_TYPE_ID | audio::SILENT_AUDIO_PACKET_TYPE_ID => {
                audio::decode(raw).map(Packet::Audio)
            }
            gain::GAIN_MODIFY_PACKET_TYPE_ID => gain::decode(raw).map(Packet::GainModify),
            roster::LANE_ROSTER_PACKET_TYPE_ID => roster::decode(raw).map(Packet::LaneRoster),
            notice::LANE_CREATED_PACKET_TYPE_ID => {
                notice::decode_lane_created(raw).map(Packet::LaneCreated)
            }
            notice::LANE_MODIFIED_PACKET_TYPE_ID => {
                notice::decode_lane_modified(raw).map(Packet::LaneModified)
            }
            notice::LANE_DELETED_PACKET_TYPE_ID => {
                notice::decode_lane_deleted(raw).map(Packet::LaneDeleted)
            }
            loudness::LANES_LOUDNESS_PACKET_TYPE_ID => {
                loudness::decode(raw).map(Packet::LanesLoudness)
            }
            other => Err(PacketError::UnknownType(other)),
        }
    }

    /// Encode back to wire bytes
    ///
    /// Audio is re-encoded without silence substitution, except for an
    /// all-zero frame which always takes the silent form.
    pub fn encode(&self) -> Result<Bytes, PacketError> {
        match self {
            Packet::Audio(p) => audio::encode(&p.pcm, &p.name, &p.ext, f32::NEG_INFINITY),
            Packet::GainModify(g) => gain::encode(g.lane_id, g.gain_db),
            Packet::LaneRoster(lanes) => Ok(roster::encode(lanes)),
            Packet::LaneCreated(info) => Ok(notice::encode_lane_created(info)),
            Packet::LaneModified(info) => Ok(notice::encode_lane_modified(info)),
            Packet::LaneDeleted(id) => Ok(notice::encode_lane_deleted(*id)),
            Packet::LanesLoudness(lanes) => Ok(loudness::encode(lanes)),
        }
    }

    /// Type ID byte this packet encodes to
    pub fn type_id(&self) -> u8 {
        match self {
            Packet::Audio(p) if p.pcm.iter().all(|&s| s == 0.0) => {
                audio::SILENT_AUDIO_PACKET_TYPE_ID
            }
            Packet::Audio(_) => audio::AUDIO_PACKET_TYPE_ID,
            Packet::GainModify(_) => gain::GAIN_MODIFY_PACKET_TYPE_ID,
            Packet::LaneRoster(_) => roster::LANE_ROSTER_PACKET_TYPE_ID,
            Packet::LaneCreated(_) => notice::LANE_CREATED_PACKET_TYPE_ID,
            Packet::LaneModified(_) => notice::LANE_MODIFIED_PACKET_TYPE_ID,
            Packet::LaneDeleted(_) => notice::LANE_DELETED_PACKET_TYPE_ID,
            Packet::LanesLoudness(_) => loudness::LANES_LOUDNESS_PACKET_TYPE_ID,
        }
    }
}

/// Check the packet is non-empty and carries one of the expected type IDs
pub(crate) fn check_type_id(
    raw: &[u8],
    kind: &'static str,
    expected: &[u8],
) -> Result<u8, PacketError> {
    let type_id = *raw.first().ok_or(PacketError::Empty)?;

    if !expected.contains(&type_id) {
        let expected = expected
            .iter()
            .map(|id| format!("{:#04x}", id))
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(PacketError::TypeMismatch {
            kind,
            expected,
            actual: type_id,
        });
    }

    Ok(type_id)
}

/// Check the packet is exactly `expected` bytes long
pub(crate) fn check_exact_len(
    raw: &[u8],
    kind: &'static str,
    expected: usize,
) -> Result<(), PacketError> {
    let actual = raw.len();
    if actual < expected {
        return Err(PacketError::TooShort { kind, expected, actual });
    }
    if actual > expected {
        return Err(PacketError::TooLong { kind, expected, actual });
    }
    Ok(())
}

/// Check the payload after the type ID is a whole number of records
pub(crate) fn check_records(
    raw: &[u8],
    kind: &'static str,
    record_size: usize,
) -> Result<(), PacketError> {
    let payload = raw.len().saturating_sub(1);
    if payload % record_size != 0 {
        return Err(PacketError::MisalignedRecords {
            kind,
            record_size,
            payload,
        });
    }
    Ok(())
}

/// Lane info as one 5-byte record
pub(crate) fn lane_info_to_record(info: &LaneInfo) -> [u8; LANE_INFO_RECORD_LEN] {
    let name = info.name.to_field();
    [
        info.lane_id.get(),
        name[0],
        name[1],
        name[2],
        GAIN_SCALE.to_byte(info.gain_db),
    ]
}

/// Lane info from one 5-byte record, `record` length is checked by callers
pub(crate) fn lane_info_from_record(record: &[u8]) -> Result<LaneInfo, PacketError> {
    let name = LaneName::from_field(&record[1..1 + NAME_FIELD_LEN])?;
    Ok(LaneInfo::new(
        LaneId::new(record[0]),
        name,
        GAIN_SCALE.from_byte(record[1 + NAME_FIELD_LEN]),
    ))
}
