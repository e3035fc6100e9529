//! # RCDevice Protocol Module
//!
//! Wire-level implementation of the RunCam device protocol family.
//!
//! This module handles:
//! - RCDEVICE frames (header 0xCC, CRC8-DVB-S2) and legacy RCSplit frames
//!   (header 0x55, tail 0xAA, CRC8 poly 0x31)
//! - Response completion detection for fixed and chunked replies
//! - Settings reassembly and the tagged-variant setting encoding

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
pub mod settings;
