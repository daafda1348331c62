//! Lane lifecycle notices, pushed to the mixer client
//!
//! ```text
//! created:  [0x31][lane id][name x3][gain byte]
//! modified: [0x32][lane id][name x3][gain byte]
//! deleted:  [0x33][lane id]
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{
    check_exact_len, check_type_id, lane_info_from_record, lane_info_to_record, LANE_INFO_RECORD_LEN,
};
use crate::error::PacketError;
use crate::mixer::MixerEvent;
use crate::protocol::{LaneId, LaneInfo};

/// Packet type ID of lane created packet
pub const LANE_CREATED_PACKET_TYPE_ID: u8 = 0x31;

/// Packet type ID of lane modified packet
pub const LANE_MODIFIED_PACKET_TYPE_ID: u8 = 0x32;

/// Packet type ID of lane deleted packet
pub const LANE_DELETED_PACKET_TYPE_ID: u8 = 0x33;

const LANE_INFO_PACKET_LEN: usize = 1 + LANE_INFO_RECORD_LEN;
const LANE_DELETED_PACKET_LEN: usize = 2;

/// Encode a mixer lifecycle event as its notice packet
pub fn encode_event(event: &MixerEvent) -> Bytes {
    match event {
        MixerEvent::LaneCreated(info) => encode_lane_created(info),
        MixerEvent::LaneModified(info) => encode_lane_modified(info),
        MixerEvent::LaneDeleted(lane_id) => encode_lane_deleted(*lane_id),
    }
}

pub fn encode_lane_created(info: &LaneInfo) -> Bytes {
    encode_lane_info(LANE_CREATED_PACKET_TYPE_ID, info)
}

pub fn decode_lane_created(raw: &[u8]) -> Result<LaneInfo, PacketError> {
    validate_lane_created(raw)?;
    lane_info_from_record(&raw[1..])
}

pub fn validate_lane_created(raw: &[u8]) -> Result<(), PacketError> {
    check_type_id(raw, "lane created", &[LANE_CREATED_PACKET_TYPE_ID])?;
    check_exact_len(raw, "lane created", LANE_INFO_PACKET_LEN)
}

pub fn is_lane_created_packet(raw: &[u8]) -> bool {
    validate_lane_created(raw).is_ok()
}

pub fn encode_lane_modified(info: &LaneInfo) -> Bytes {
    encode_lane_info(LANE_MODIFIED_PACKET_TYPE_ID, info)
}

pub fn decode_lane_modified(raw: &[u8]) -> Result<LaneInfo, PacketError> {
    validate_lane_modified(raw)?;
    lane_info_from_record(&raw[1..])
}

pub fn validate_lane_modified(raw: &[u8]) -> Result<(), PacketError> {
    check_type_id(raw, "lane modified", &[LANE_MODIFIED_PACKET_TYPE_ID])?;
    check_exact_len(raw, "lane modified", LANE_INFO_PACKET_LEN)
}

pub fn is_lane_modified_packet(raw: &[u8]) -> bool {
    validate_lane_modified(raw).is_ok()
}

pub fn encode_lane_deleted(lane_id: LaneId) -> Bytes {
    Bytes::copy_from_slice(&[LANE_DELETED_PACKET_TYPE_ID, lane_id.get()])
}

pub fn decode_lane_deleted(raw: &[u8]) -> Result<LaneId, PacketError> {
    validate_lane_deleted(raw)?;
    Ok(LaneId::new(raw[1]))
}

pub fn validate_lane_deleted(raw: &[u8]) -> Result<(), PacketError> {
    check_type_id(raw, "lane deleted", &[LANE_DELETED_PACKET_TYPE_ID])?;
    check_exact_len(raw, "lane deleted", LANE_DELETED_PACKET_LEN)
}

pub fn is_lane_deleted_packet(raw: &[u8]) -> bool {
    validate_lane_deleted(raw).is_ok()
}

fn encode_lane_info(type_id: u8, info: &LaneInfo) -> Bytes {
    let mut packet = BytesMut::with_capacity(LANE_INFO_PACKET_LEN);
    packet.put_u8(type_id);
    packet.put_slice(&lane_info_to_record(info));
    packet.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LaneName;

    fn info(id: u8, name: &str, gain_db: f32) -> LaneInfo {
        LaneInfo::new(LaneId::new(id), LaneName::new(name).unwrap(), gain_db)
    }

    #[test]
    fn test_lane_created() {
        let raw = encode_lane_created(&info(4, "NEW", 0.0));
        assert_eq!(raw.len(), 6);
        assert!(is_lane_created_packet(&raw));
        assert!(!is_lane_modified_packet(&raw));

        let decoded = decode_lane_created(&raw).unwrap();
        assert_eq!(decoded.lane_id, LaneId::new(4));
        assert_eq!(decoded.name.as_str(), "NEW");
        assert!(decoded.gain_db.abs() <= 0.32);
    }

    #[test]
    fn test_lane_modified_boundaries() {
        for gain_db in [-80.0f32, 80.0] {
            let raw = encode_lane_modified(&info(0, "L0", gain_db));
            assert_eq!(decode_lane_modified(&raw).unwrap().gain_db, gain_db);
        }
    }

    #[test]
    fn test_lane_modified_keeps_leading_spaces() {
        for name in ["  B", " A", "A B"] {
            let raw = encode_lane_modified(&info(2, name, 0.0));
            assert_eq!(decode_lane_modified(&raw).unwrap().name.as_str(), name);
        }
    }

    #[test]
    fn test_lane_deleted() {
        let raw = encode_lane_deleted(LaneId::new(255));
        assert_eq!(&raw[..], &[0x33, 255]);
        assert_eq!(decode_lane_deleted(&raw).unwrap(), LaneId::new(255));
    }

    #[test]
    fn test_event_encoding() {
        let raw = encode_event(&MixerEvent::LaneDeleted(LaneId::new(1)));
        assert!(is_lane_deleted_packet(&raw));
        let raw = encode_event(&MixerEvent::LaneModified(info(1, "X", 3.0)));
        assert!(is_lane_modified_packet(&raw));
    }

    #[test]
    fn test_validate_defects() {
        assert_eq!(validate_lane_deleted(&[]), Err(PacketError::Empty));
        assert_eq!(
            validate_lane_deleted(&[0x33]),
            Err(PacketError::TooShort { kind: "lane deleted", expected: 2, actual: 1 })
        );
        assert_eq!(
            validate_lane_modified(&[0x32, 0, b'A', b'B', b'C', 0, 0]),
            Err(PacketError::TooLong { kind: "lane modified", expected: 6, actual: 7 })
        );
        assert!(matches!(
            validate_lane_created(&[0x32, 0, b'A', b'B', b'C', 0]),
            Err(PacketError::TypeMismatch { actual: 0x32, .. })
        ));
    }
}
