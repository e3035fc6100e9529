//! # Camera Settings Encoding
//!
//! Chunk reassembly and the tagged-variant encoding used by the
//! settings-access commands (`GET_SETTINGS`, `READ_SETTING_DETAIL`,
//! `WRITE_SETTING`).
//!
//! ## Setting detail layout
//!
//! The first byte of the reassembled payload is the [`SettingType`] tag:
//!
//! | Type | Layout after the tag |
//! |------|----------------------|
//! | uint8 / int8 | value, min, max, step (1 byte each) |
//! | uint16 / int16 | value, min, max (2 bytes LE each), step (1 byte) |
//! | float | value, min, max (4 bytes LE each), decimal point (1), step (4) |
//! | text selection | current index (1), `;`-separated labels, NUL |
//! | string | NUL-terminated text, max editable length (1) |
//! | info | NUL-terminated text |
//! | folder | nothing |

use bytes::Buf;
use serde::Serialize;

use super::decoder::Chunk;
use super::protocol::*;
use crate::error::{RcDeviceError, Result};

/// Reassembly buffer: fixed capacity, tracked length
pub type AssembledBuffer = heapless::Vec<u8, RCDEVICE_MAX_ASSEMBLED_SIZE>;

/// Text selection label
pub type SelectionLabel = heapless::String<RCDEVICE_MAX_SETTING_VALUE_LENGTH>;

/// Inline text of string/info settings
pub type SettingText = heapless::String<RCDEVICE_MAX_STRING_LENGTH>;

/// Result code used until the peripheral reports otherwise
pub const WRITE_SETTING_FAILURE: u8 = 0x01;

/// Collects the chunks of one settings response in order
///
/// Chunk 0 announces how many chunks follow; every chunk's payload is
/// appended after checking it fits the buffer.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    buffer: AssembledBuffer,
    total_chunks: Option<u8>,
    received: u8,
}

impl ChunkAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the next chunk to request, `None` once all have arrived
    #[must_use]
    pub fn next_index(&self) -> Option<u8> {
        match self.total_chunks {
            None => Some(0),
            Some(total) if self.received < total => Some(self.received),
            Some(_) => None,
        }
    }

    /// Append one chunk
    ///
    /// # Errors
    ///
    /// - `ChunkOverflow` if chunk 0 declares too many remaining chunks
    /// - `InvalidResponse` if the payload would overflow the buffer
    pub fn push(&mut self, chunk: Chunk<'_>) -> Result<()> {
        if self.total_chunks.is_none() {
            if chunk.remaining >= RCDEVICE_MAX_CHUNKS_PER_RESPONSE {
                return Err(RcDeviceError::ChunkOverflow {
                    remaining: chunk.remaining,
                    max: RCDEVICE_MAX_CHUNKS_PER_RESPONSE - 1,
                });
            }
            self.total_chunks = Some(chunk.remaining + 1);
        }

        self.buffer
            .extend_from_slice(chunk.payload)
            .map_err(|()| RcDeviceError::InvalidResponse {
                command: CMD_READ_SETTING_DETAIL,
                reason: "assembled settings exceed buffer".to_string(),
            })?;
        self.received += 1;

        Ok(())
    }

    /// Take the assembled bytes
    #[must_use]
    pub fn finish(self) -> AssembledBuffer {
        self.buffer
    }
}

/// Type tag of a camera setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Float,
    TextSelection,
    String,
    Folder,
    Info,
    Unknown,
}

impl From<u8> for SettingType {
    fn from(tag: u8) -> Self {
        match tag {
            0 => SettingType::Uint8,
            1 => SettingType::Int8,
            2 => SettingType::Uint16,
            3 => SettingType::Int16,
            8 => SettingType::Float,
            9 => SettingType::TextSelection,
            10 => SettingType::String,
            11 => SettingType::Folder,
            12 => SettingType::Info,
            _ => SettingType::Unknown,
        }
    }
}

/// Full description of one setting as reported by the camera
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettingDetail {
    Uint8 { value: u8, min: u8, max: u8, step: u8 },
    Int8 { value: i8, min: i8, max: i8, step: u8 },
    Uint16 { value: u16, min: u16, max: u16, step: u8 },
    Int16 { value: i16, min: i16, max: i16, step: u8 },
    Float { value: u32, min: u32, max: u32, decimal_point: u8, step: u32 },
    TextSelection {
        value: u8,
        labels: heapless::Vec<SelectionLabel, RCDEVICE_MAX_TEXT_SELECTIONS>,
    },
    String { value: SettingText, max_length: u8 },
    Folder,
    Info { text: SettingText },
    Unknown { tag: u8 },
}

impl SettingDetail {
    #[must_use]
    pub fn setting_type(&self) -> SettingType {
        match self {
            SettingDetail::Uint8 { .. } => SettingType::Uint8,
            SettingDetail::Int8 { .. } => SettingType::Int8,
            SettingDetail::Uint16 { .. } => SettingType::Uint16,
            SettingDetail::Int16 { .. } => SettingType::Int16,
            SettingDetail::Float { .. } => SettingType::Float,
            SettingDetail::TextSelection { .. } => SettingType::TextSelection,
            SettingDetail::String { .. } => SettingType::String,
            SettingDetail::Folder => SettingType::Folder,
            SettingDetail::Info { .. } => SettingType::Info,
            SettingDetail::Unknown { .. } => SettingType::Unknown,
        }
    }
}

/// Peripheral's answer to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteSettingResponse {
    pub result_code: u8,
    pub needs_menu_refresh: bool,
}

impl Default for WriteSettingResponse {
    fn default() -> Self {
        Self {
            result_code: WRITE_SETTING_FAILURE,
            needs_menu_refresh: false,
        }
    }
}

impl WriteSettingResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result_code == WRITE_SETTING_SUCCESS
    }
}

/// One row of a settings folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingEntry {
    pub id: u8,
    pub name: heapless::String<RCDEVICE_MAX_SETTING_NAME_LENGTH>,
    pub value: heapless::String<RCDEVICE_MAX_SETTING_VALUE_LENGTH>,
}

fn truncated(what: &str) -> RcDeviceError {
    RcDeviceError::InvalidResponse {
        command: CMD_READ_SETTING_DETAIL,
        reason: format!("{} setting truncated", what),
    }
}

fn ensure(buf: &[u8], needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(truncated(what));
    }
    Ok(())
}

/// Bytes up to (not including) the first NUL, or the whole slice
fn until_nul(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == 0) {
        Some(end) => &data[..end],
        None => data,
    }
}

/// Copy text into a fixed-capacity string, dropping whatever does not fit
pub fn bounded_text<const N: usize>(data: &[u8]) -> heapless::String<N> {
    let mut text = heapless::String::new();
    for ch in String::from_utf8_lossy(data).chars() {
        if text.push(ch).is_err() {
            break;
        }
    }
    text
}

/// Split a `;`-separated label list into at most `N` non-empty slices
pub fn split_labels<const N: usize>(data: &[u8]) -> heapless::Vec<&[u8], N> {
    let mut labels = heapless::Vec::new();
    for label in until_nul(data).split(|&b| b == b';').filter(|l| !l.is_empty()) {
        if labels.push(label).is_err() {
            break;
        }
    }
    labels
}

/// Decode a reassembled READ_SETTING_DETAIL payload
///
/// # Errors
///
/// Returns `InvalidResponse` if the payload is empty or shorter than its
/// type's fixed layout.
pub fn decode_setting_detail(data: &[u8]) -> Result<SettingDetail> {
    let mut buf = data;
    ensure(buf, 1, "empty")?;
    let tag = buf.get_u8();

    let detail = match SettingType::from(tag) {
        SettingType::Uint8 => {
            ensure(buf, 4, "uint8")?;
            SettingDetail::Uint8 {
                value: buf.get_u8(),
                min: buf.get_u8(),
                max: buf.get_u8(),
                step: buf.get_u8(),
            }
        }
        SettingType::Int8 => {
            ensure(buf, 4, "int8")?;
            SettingDetail::Int8 {
                value: buf.get_i8(),
                min: buf.get_i8(),
                max: buf.get_i8(),
                step: buf.get_u8(),
            }
        }
        SettingType::Uint16 => {
            ensure(buf, 7, "uint16")?;
            SettingDetail::Uint16 {
                value: buf.get_u16_le(),
                min: buf.get_u16_le(),
                max: buf.get_u16_le(),
                step: buf.get_u8(),
            }
        }
        SettingType::Int16 => {
            ensure(buf, 7, "int16")?;
            SettingDetail::Int16 {
                value: buf.get_i16_le(),
                min: buf.get_i16_le(),
                max: buf.get_i16_le(),
                step: buf.get_u8(),
            }
        }
        SettingType::Float => {
            ensure(buf, 17, "float")?;
            SettingDetail::Float {
                value: buf.get_u32_le(),
                min: buf.get_u32_le(),
                max: buf.get_u32_le(),
                decimal_point: buf.get_u8(),
                step: buf.get_u32_le(),
            }
        }
        SettingType::TextSelection => {
            ensure(buf, 1, "text selection")?;
            let value = buf.get_u8();
            let mut labels = heapless::Vec::new();
            for label in split_labels::<RCDEVICE_MAX_TEXT_SELECTIONS>(buf) {
                // capacities match, push cannot fail
                let _ = labels.push(bounded_text(label));
            }
            SettingDetail::TextSelection { value, labels }
        }
        SettingType::String => {
            let text = until_nul(buf);
            let value = bounded_text(text);
            buf.advance((text.len() + 1).min(buf.remaining()));
            ensure(buf, 1, "string")?;
            SettingDetail::String {
                value,
                max_length: buf.get_u8(),
            }
        }
        SettingType::Info => SettingDetail::Info {
            text: bounded_text(until_nul(buf)),
        },
        SettingType::Folder => SettingDetail::Folder,
        SettingType::Unknown => SettingDetail::Unknown { tag },
    };

    Ok(detail)
}

/// Decode a reassembled GET_SETTINGS payload: repeated
/// `{id, name\0, value\0}` rows
pub fn decode_settings_list(data: &[u8]) -> heapless::Vec<SettingEntry, RCDEVICE_MAX_SETTINGS_PER_PAGE> {
    let mut entries = heapless::Vec::new();
    let mut buf = data;

    while buf.has_remaining() {
        let id = buf.get_u8();

        let name = until_nul(buf);
        let entry_name = bounded_text(name);
        buf.advance((name.len() + 1).min(buf.remaining()));

        let value = until_nul(buf);
        let entry_value = bounded_text(value);
        buf.advance((value.len() + 1).min(buf.remaining()));

        let entry = SettingEntry {
            id,
            name: entry_name,
            value: entry_value,
        };
        if entries.push(entry).is_err() {
            break;
        }
    }

    entries
}

/// Build a WRITE_SETTING payload; the value is cut so the whole payload
/// fits one frame
pub fn encode_write_payload(
    setting_id: u8,
    value: &[u8],
) -> heapless::Vec<u8, RCDEVICE_MAX_PAYLOAD_SIZE> {
    let mut payload = heapless::Vec::new();
    let _ = payload.push(setting_id);
    let len = value.len().min(RCDEVICE_MAX_PAYLOAD_SIZE - 1);
    // bounded by the capacity check above
    let _ = payload.extend_from_slice(&value[..len]);
    payload
}

/// Decode a WRITE_SETTING ack `[0xCC][result][needs_refresh][crc]`
pub fn decode_write_ack(data: &[u8]) -> WriteSettingResponse {
    match data {
        [_, result_code, refresh, _] => WriteSettingResponse {
            result_code: *result_code,
            needs_menu_refresh: *refresh != 0,
        },
        _ => WriteSettingResponse::default(),
    }
}
