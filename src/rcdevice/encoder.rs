//! # RCDevice Frame Encoder
//!
//! Builds request frames for both wire formats.

use bytes::{BufMut, Bytes, BytesMut};

use super::crc::{crc8_dvb_s2, crc8_high_first};
use super::protocol::*;
use crate::error::{RcDeviceError, Result};

/// Encode an RCDEVICE request frame
///
/// Layout: `[0xCC][command][payload..][crc8_dvb_s2]`, the checksum covering
/// every preceding byte.
///
/// # Errors
///
/// Returns `PayloadTooLarge` if the payload exceeds 61 bytes.
///
/// # Examples
///
/// ```
/// use rcdevice_bridge::rcdevice::encoder::encode_request;
/// use rcdevice_bridge::rcdevice::protocol::CMD_GET_DEVICE_INFO;
///
/// let frame = encode_request(CMD_GET_DEVICE_INFO, &[]).unwrap();
/// assert_eq!(frame.len(), 3);
/// assert_eq!(frame[0], 0xCC);
/// ```
pub fn encode_request(command: u8, payload: &[u8]) -> Result<Bytes> {
    if payload.len() > RCDEVICE_MAX_PAYLOAD_SIZE {
        return Err(RcDeviceError::PayloadTooLarge {
            size: payload.len(),
            max: RCDEVICE_MAX_PAYLOAD_SIZE,
        });
    }

    let mut frame = BytesMut::with_capacity(3 + payload.len());
    frame.put_u8(RCDEVICE_HEADER);
    frame.put_u8(command);
    frame.put_slice(payload);

    let crc = crc8_dvb_s2(&frame);
    frame.put_u8(crc);

    Ok(frame.freeze())
}

/// Encode a legacy RCSplit control frame
///
/// Layout: `[0x55][0x01][argument][crc][0xAA]`. The checksum is computed over
/// the frame with the tail byte standing in the crc position.
pub fn encode_rcsplit_frame(argument: u8) -> [u8; RCSPLIT_PACKET_SIZE] {
    let crc = crc8_high_first(&[RCSPLIT_HEADER, RCSPLIT_COMMAND_CTRL, argument, RCSPLIT_TAIL]);
    [RCSPLIT_HEADER, RCSPLIT_COMMAND_CTRL, argument, crc, RCSPLIT_TAIL]
}

/// Legacy argument for a camera button; the legacy space is the RCDEVICE
/// operation code shifted up by one
pub fn rcsplit_argument(operation: CameraOperation) -> Option<u8> {
    match operation {
        CameraOperation::SimulateWifiButton
        | CameraOperation::SimulatePowerButton
        | CameraOperation::ChangeMode => operation.rcdevice_code().map(|code| code + 1),
        _ => None,
    }
}
