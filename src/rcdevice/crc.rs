//! # Checksums
//!
//! The two CRC8 variants spoken by RunCam peripherals:
//!
//! - **CRC8-DVB-S2** (RCDEVICE/CADDX): polynomial 0xD5, initial value 0x00,
//!   computed over every byte of the frame including the header. Because it
//!   is a plain MSB-first CRC, running it over a frame *with* its trailing
//!   checksum yields zero.
//! - **CRC8 "high first"** (legacy RCSplit): polynomial 0x31, MSB-first,
//!   initial value 0x00.

/// CRC-8-DVB-S2 polynomial
const CRC8_DVB_S2_POLY: u8 = 0xD5;

/// Legacy RCSplit polynomial
const CRC8_RCSPLIT_POLY: u8 = 0x31;

/// Precomputed CRC8-DVB-S2 lookup table
const CRC8_DVB_S2_TABLE: [u8; 256] = generate_crc8_table(CRC8_DVB_S2_POLY);

/// Generate a CRC8 lookup table at compile time
const fn generate_crc8_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ poly;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Feed one byte into a running CRC8-DVB-S2
#[inline]
pub fn crc8_dvb_s2_update(crc: u8, byte: u8) -> u8 {
    CRC8_DVB_S2_TABLE[(crc ^ byte) as usize]
}

/// Calculate CRC8-DVB-S2 over a whole buffer
///
/// # Examples
///
/// ```
/// use rcdevice_bridge::rcdevice::crc::crc8_dvb_s2;
///
/// let frame = [0xCC, 0x00];
/// let crc = crc8_dvb_s2(&frame);
/// assert_eq!(crc8_dvb_s2(&[0xCC, 0x00, crc]), 0);
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    data.iter().fold(0, |crc, &byte| crc8_dvb_s2_update(crc, byte))
}

/// Calculate the legacy RCSplit CRC8 (poly 0x31, MSB first)
pub fn crc8_high_first(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_RCSPLIT_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

/// Bitwise CRC8-DVB-S2, used to check the table
#[cfg(test)]
fn crc8_dvb_s2_slow(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_DVB_S2_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
