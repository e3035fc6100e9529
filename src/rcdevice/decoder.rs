//! # RCDevice Response Decoder
//!
//! Response completion detection, checksum validation and parsing of the
//! fixed-layout replies.

use super::crc::{crc8_dvb_s2, crc8_high_first};
use super::protocol::*;
use crate::error::{RcDeviceError, Result};

/// Outcome of inspecting a partially received response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Keep reading
    NeedMore,
    /// The buffer holds exactly one full response
    Complete,
    /// The bytes cannot form a valid response for this command
    Malformed,
}

/// Fixed total response length per command, header and crc included
///
/// Returns `None` for commands with a variable-length reply and for
/// commands the peripheral does not answer.
pub fn expected_response_len(command: u8) -> Option<usize> {
    match command {
        CMD_GET_DEVICE_INFO => Some(5),
        CMD_5KEY_SIMULATION_PRESS | CMD_5KEY_SIMULATION_RELEASE => Some(2),
        CMD_5KEY_CONNECTION => Some(3),
        CMD_WRITE_SETTING => Some(4),
        CMD_CADDX_HANDSHAKE => Some(3),
        CMD_CADDX_CAMERA_ACTION | CMD_CADDX_KEY_INSTRUCTION => Some(2),
        _ => None,
    }
}

/// Whether the command is answered with a chunked, length-prefixed reply
pub fn is_chunked_command(command: u8) -> bool {
    matches!(command, CMD_READ_SETTING_DETAIL | CMD_GET_SETTINGS)
}

/// Decide whether enough bytes have arrived to call the response complete
///
/// Chunked replies carry their payload length at index 2 and are complete
/// at `4 + declared_length` bytes. A declared length above 60 can only come
/// from a corrupt frame and aborts the read.
///
/// # Examples
///
/// ```
/// use rcdevice_bridge::rcdevice::decoder::{response_completion, Completion};
/// use rcdevice_bridge::rcdevice::protocol::CMD_READ_SETTING_DETAIL;
///
/// assert_eq!(response_completion(CMD_READ_SETTING_DETAIL, &[0xCC, 0x00]), Completion::NeedMore);
/// assert_eq!(response_completion(CMD_READ_SETTING_DETAIL, &[0xCC, 0x00, 0x00, 0x12]), Completion::Complete);
/// ```
pub fn response_completion(command: u8, received: &[u8]) -> Completion {
    let expected = if is_chunked_command(command) {
        if received.len() < 3 {
            return Completion::NeedMore;
        }

        let declared = received[2] as usize;
        if declared > RCDEVICE_MAX_CHUNK_DATA_SIZE {
            return Completion::Malformed;
        }

        RCDEVICE_CHUNK_ENVELOPE_SIZE + declared
    } else {
        match expected_response_len(command) {
            Some(len) => len,
            None => return Completion::Malformed,
        }
    };

    match received.len() {
        len if len < expected => Completion::NeedMore,
        len if len == expected => Completion::Complete,
        _ => Completion::Malformed,
    }
}

/// Verify header and checksum closure of a complete RCDEVICE response
///
/// # Errors
///
/// Returns `InvalidResponse` if the header is wrong or the CRC over all
/// bytes, trailing checksum included, is not zero.
pub fn verify_response(command: u8, data: &[u8]) -> Result<()> {
    if data.first() != Some(&RCDEVICE_HEADER) {
        return Err(RcDeviceError::InvalidResponse {
            command,
            reason: "missing header".to_string(),
        });
    }

    if crc8_dvb_s2(data) != 0 {
        return Err(RcDeviceError::InvalidResponse {
            command,
            reason: "checksum mismatch".to_string(),
        });
    }

    Ok(())
}

/// Validate a legacy RCSplit echo of `argument`
///
/// The checksum is recomputed over the first four bytes with the tail byte
/// moved into the crc position.
pub fn verify_rcsplit_response(data: &[u8], argument: u8) -> Result<()> {
    let invalid = |reason: &str| RcDeviceError::InvalidResponse {
        command: RCSPLIT_COMMAND_CTRL,
        reason: reason.to_string(),
    };

    if data.len() != RCSPLIT_PACKET_SIZE {
        return Err(invalid("wrong length"));
    }

    if data[0] != RCSPLIT_HEADER || data[4] != RCSPLIT_TAIL {
        return Err(invalid("bad header or tail"));
    }

    let crc = crc8_high_first(&[data[0], data[1], data[2], data[4]]);
    if crc != data[3] {
        return Err(invalid("checksum mismatch"));
    }

    if data[1] != RCSPLIT_COMMAND_CTRL || data[2] != argument {
        return Err(invalid("echo does not match request"));
    }

    Ok(())
}

/// Parse a GET_DEVICE_INFO reply: version at byte 1, little-endian feature
/// bitmask at bytes 2..4
pub fn decode_device_info(data: &[u8]) -> Result<DeviceInfo> {
    if data.len() < 5 {
        return Err(RcDeviceError::InvalidResponse {
            command: CMD_GET_DEVICE_INFO,
            reason: format!("device info too short: {} bytes", data.len()),
        });
    }

    Ok(DeviceInfo {
        family: ProtocolFamily::RcDevice,
        protocol_version: data[1],
        features: Features(u16::from_le_bytes([data[2], data[3]])),
    })
}

/// Unpack a 5-key connection ack into `(action_id, result_code)`
///
/// The action ID sits in the high nibble, the result in the low nibble.
pub fn decode_connection_ack(data: &[u8]) -> Option<(u8, u8)> {
    let packed = *data.get(1)?;
    Some(((packed & 0xF0) >> 4, packed & 0x0F))
}

/// One chunk of a chunked settings response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Chunks still to come after this one (meaningful on chunk 0)
    pub remaining: u8,
    /// Payload with the 4-byte envelope stripped
    pub payload: &'a [u8],
}

/// Split a complete chunked reply into its remaining count and payload
pub fn decode_chunk(command: u8, data: &[u8]) -> Result<Chunk<'_>> {
    if data.len() < RCDEVICE_CHUNK_ENVELOPE_SIZE {
        return Err(RcDeviceError::InvalidResponse {
            command,
            reason: "chunk shorter than envelope".to_string(),
        });
    }

    let declared = data[2] as usize;
    if data.len() != RCDEVICE_CHUNK_ENVELOPE_SIZE + declared {
        return Err(RcDeviceError::InvalidResponse {
            command,
            reason: format!("chunk declares {} bytes, frame is {}", declared, data.len()),
        });
    }

    Ok(Chunk {
        remaining: data[1],
        payload: &data[3..3 + declared],
    })
}
