//! Audio and silent audio packets
//!
//! ```text
//! audio:  [0x10][name x3][ext len][ext ...][int16 LE x FRAME_SAMPLES]
//! silent: [0x11][name x3][ext len][ext ...]
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::audio::loudness::loudness;
use crate::audio::pcm::{
    float_to_int16, int16_from_le_bytes, int16_to_float, put_int16_le, BYTES_PER_SAMPLE,
};
use crate::codec::{check_exact_len, check_type_id};
use crate::constants::FRAME_SAMPLES;
use crate::error::PacketError;
use crate::protocol::{LaneName, NAME_FIELD_LEN};

/// Packet type ID of audio packet
pub const AUDIO_PACKET_TYPE_ID: u8 = 0x10;

/// Packet type ID of silent audio packet
pub const SILENT_AUDIO_PACKET_TYPE_ID: u8 = 0x11;

/// Maximum ext bytes carried by one packet
pub const MAX_EXT_LEN: usize = u8::MAX as usize;

/// Header size: type ID, name field and ext length
const HEADER_LEN: usize = 1 + NAME_FIELD_LEN + 1;

/// Frame payload size of a non-silent packet
const PCM_PAYLOAD_LEN: usize = FRAME_SAMPLES * BYTES_PER_SAMPLE;

/// Decoded audio packet
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPacket {
    /// Float PCM, always `FRAME_SAMPLES` long
    pub pcm: Vec<f32>,
    /// Lane name of the sender, or echoed back by the server
    pub name: LaneName,
    /// Opaque side channel bytes
    pub ext: Bytes,
}

/// Create an audio packet
///
/// If the frame loudness is at or below `silent_threshold_dbfs`, the silent
/// form is produced and no samples are sent.
pub fn encode(
    pcm: &[f32],
    name: &LaneName,
    ext: &[u8],
    silent_threshold_dbfs: f32,
) -> Result<Bytes, PacketError> {
    if pcm.len() != FRAME_SAMPLES {
        return Err(PacketError::InvalidFrameSize {
            expected: FRAME_SAMPLES,
            actual: pcm.len(),
        });
    }
    if ext.len() > MAX_EXT_LEN {
        return Err(PacketError::ExtTooLong(ext.len()));
    }
    if !(silent_threshold_dbfs <= 0.0) {
        return Err(PacketError::InvalidSilentThreshold(silent_threshold_dbfs));
    }

    let silent = loudness(pcm)? <= silent_threshold_dbfs;
    let capacity = HEADER_LEN + ext.len() + if silent { 0 } else { PCM_PAYLOAD_LEN };
    let mut packet = BytesMut::with_capacity(capacity);

    packet.put_u8(if silent {
        SILENT_AUDIO_PACKET_TYPE_ID
    } else {
        AUDIO_PACKET_TYPE_ID
    });
    packet.put_slice(&name.to_field());
    packet.put_u8(ext.len() as u8);
    packet.put_slice(ext);
    if !silent {
        put_int16_le(&mut packet, &float_to_int16(pcm));
    }

    Ok(packet.freeze())
}

/// Unpack an audio packet
///
/// A silent packet decodes to `FRAME_SAMPLES` zeros.
pub fn decode(raw: &[u8]) -> Result<AudioPacket, PacketError> {
    validate(raw)?;

    let name = LaneName::from_field(&raw[1..1 + NAME_FIELD_LEN])?;
    let ext_len = raw[HEADER_LEN - 1] as usize;
    let ext = Bytes::copy_from_slice(&raw[HEADER_LEN..HEADER_LEN + ext_len]);

    let pcm = if raw[0] == SILENT_AUDIO_PACKET_TYPE_ID {
        vec![0.0; FRAME_SAMPLES]
    } else {
        let payload = &raw[HEADER_LEN + ext_len..];
        let samples = int16_from_le_bytes(payload).ok_or(PacketError::MisalignedRecords {
            kind: "audio",
            record_size: BYTES_PER_SAMPLE,
            payload: payload.len(),
        })?;
        int16_to_float(&samples)
    };

    Ok(AudioPacket { pcm, name, ext })
}

/// Verify the packet is an audio or silent audio packet
pub fn validate(raw: &[u8]) -> Result<(), PacketError> {
    let type_id = check_type_id(raw, "audio", &[AUDIO_PACKET_TYPE_ID, SILENT_AUDIO_PACKET_TYPE_ID])?;

    if raw.len() < HEADER_LEN {
        return Err(PacketError::MissingExtLength);
    }

    let ext_len = raw[HEADER_LEN - 1] as usize;
    let (kind, expected) = if type_id == AUDIO_PACKET_TYPE_ID {
        ("audio", HEADER_LEN + ext_len + PCM_PAYLOAD_LEN)
    } else {
        ("silent audio", HEADER_LEN + ext_len)
    };

    check_exact_len(raw, kind, expected)
}

/// Whether the packet is a well-formed audio or silent audio packet
pub fn is_packet(raw: &[u8]) -> bool {
    validate(raw).is_ok()
}

/// Whether the packet carries the silent form
pub fn is_silent(raw: &[u8]) -> bool {
    raw.first() == Some(&SILENT_AUDIO_PACKET_TYPE_ID)
}
