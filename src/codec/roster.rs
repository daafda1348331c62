//! Lane roster packet: every live lane with name and gain
//!
//! ```text
//! [0x30]([lane id][name x3][gain byte])*
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{
    check_records, check_type_id, lane_info_from_record, lane_info_to_record, LANE_INFO_RECORD_LEN,
};
use crate::error::PacketError;
use crate::protocol::LaneInfo;

/// Packet type ID of lane roster packet
pub const LANE_ROSTER_PACKET_TYPE_ID: u8 = 0x30;

/// Create a lane roster packet, an empty roster is just the type ID
pub fn encode(lanes: &[LaneInfo]) -> Bytes {
    let mut packet = BytesMut::with_capacity(1 + lanes.len() * LANE_INFO_RECORD_LEN);
    packet.put_u8(LANE_ROSTER_PACKET_TYPE_ID);
    for lane in lanes {
        packet.put_slice(&lane_info_to_record(lane));
    }
    packet.freeze()
}

/// Unpack a lane roster packet
pub fn decode(raw: &[u8]) -> Result<Vec<LaneInfo>, PacketError> {
    validate(raw)?;

    raw[1..]
        .chunks_exact(LANE_INFO_RECORD_LEN)
        .map(lane_info_from_record)
        .collect()
}

/// Verify the packet is a lane roster packet
///
/// Name fields are not checked here, `decode` rejects invalid names.
pub fn validate(raw: &[u8]) -> Result<(), PacketError> {
    check_type_id(raw, "lane roster", &[LANE_ROSTER_PACKET_TYPE_ID])?;
    check_records(raw, "lane roster", LANE_INFO_RECORD_LEN)
}

/// Whether the packet is a well-formed lane roster packet
pub fn is_packet(raw: &[u8]) -> bool {
    validate(raw).is_ok()
}
