//! Gain modify packet, sent by the mixer client to change a lane gain
//!
//! ```text
//! [0x20][lane id][gain byte]
//! ```

use bytes::Bytes;

use crate::audio::GAIN_SCALE;
use crate::codec::{check_exact_len, check_type_id};
use crate::constants::{MAX_GAIN_DB, MIN_GAIN_DB};
use crate::error::PacketError;
use crate::protocol::LaneId;

/// Packet type ID of gain modify packet
pub const GAIN_MODIFY_PACKET_TYPE_ID: u8 = 0x20;

const PACKET_LEN: usize = 3;

/// Decoded gain modify command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainModify {
    pub lane_id: LaneId,
    pub gain_db: f32,
}

impl GainModify {
    pub fn new(lane_id: LaneId, gain_db: f32) -> Self {
        Self { lane_id, gain_db }
    }
}

/// Create a gain modify packet
///
/// Gain over 80 dB is rejected, gain under -80 dB is sent as -80 dB.
pub fn encode(lane_id: LaneId, gain_db: f32) -> Result<Bytes, PacketError> {
    if gain_db.is_nan() || gain_db > MAX_GAIN_DB {
        return Err(PacketError::GainOutOfRange(gain_db));
    }

    let gain_db = gain_db.max(MIN_GAIN_DB);
    Ok(Bytes::copy_from_slice(&[
        GAIN_MODIFY_PACKET_TYPE_ID,
        lane_id.get(),
        GAIN_SCALE.to_byte(gain_db),
    ]))
}

/// Unpack a gain modify packet
pub fn decode(raw: &[u8]) -> Result<GainModify, PacketError> {
    validate(raw)?;

    Ok(GainModify {
        lane_id: LaneId::new(raw[1]),
        gain_db: GAIN_SCALE.from_byte(raw[2]),
    })
}

/// Verify the packet is a gain modify packet
pub fn validate(raw: &[u8]) -> Result<(), PacketError> {
    check_type_id(raw, "gain modify", &[GAIN_MODIFY_PACKET_TYPE_ID])?;
    check_exact_len(raw, "gain modify", PACKET_LEN)
}

/// Whether the packet is a well-formed gain modify packet
pub fn is_packet(raw: &[u8]) -> bool {
    validate(raw).is_ok()
}
