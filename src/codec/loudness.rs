//! Lanes loudness packet, periodic meter report for the mixer client
//!
//! ```text
//! [0x40]([lane id][loudness byte])*
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::audio::LOUDNESS_SCALE;
use crate::codec::{check_records, check_type_id};
use crate::error::PacketError;
use crate::protocol::{LaneId, LaneLoudness};

/// Packet type ID of lanes loudness packet
pub const LANES_LOUDNESS_PACKET_TYPE_ID: u8 = 0x40;

const RECORD_LEN: usize = 2;

/// Create a lanes loudness packet
///
/// Loudness is clamped into -80 ~ 0 dBFS, so silence travels as -80.
pub fn encode(lanes: &[LaneLoudness]) -> Bytes {
    let mut packet = BytesMut::with_capacity(1 + lanes.len() * RECORD_LEN);
    packet.put_u8(LANES_LOUDNESS_PACKET_TYPE_ID);
    for lane in lanes {
        packet.put_u8(lane.lane_id.get());
        packet.put_u8(LOUDNESS_SCALE.to_byte(lane.loudness_dbfs));
    }
    packet.freeze()
}

/// Unpack a lanes loudness packet
pub fn decode(raw: &[u8]) -> Result<Vec<LaneLoudness>, PacketError> {
    validate(raw)?;

    Ok(raw[1..]
        .chunks_exact(RECORD_LEN)
        .map(|r| LaneLoudness::new(LaneId::new(r[0]), LOUDNESS_SCALE.from_byte(r[1])))
        .collect())
}

/// Verify the packet is a lanes loudness packet
pub fn validate(raw: &[u8]) -> Result<(), PacketError> {
    check_type_id(raw, "lanes loudness", &[LANES_LOUDNESS_PACKET_TYPE_ID])?;
    check_records(raw, "lanes loudness", RECORD_LEN)
}

/// Whether the packet is a well-formed lanes loudness packet
pub fn is_packet(raw: &[u8]) -> bool {
    validate(raw).is_ok()
}
