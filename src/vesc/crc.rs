//! # CRC16 Implementation
//!
//! CRC-16 checksum used by the VESC packet format (CRC-16/XMODEM).
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0x0000
//!
//! Computed over the payload only, never over the header.

/// CRC-16 polynomial
const CRC16_POLY: u16 = 0x1021;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
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

/// Calculate the VESC CRC16 checksum using lookup table (fast)
///
/// # Arguments
///
/// * `data` - Payload bytes
///
/// # Returns
///
/// * `u16` - Calculated checksum, transmitted big-endian
///
/// # Examples
///
/// ```
/// use vesc_uart_emu::vesc::crc::crc16;
///
/// assert_eq!(crc16(b"123456789"), 0x31C3);
/// assert_eq!(crc16(&[]), 0x0000);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        let index = ((crc >> 8) as u8 ^ byte) as usize;
        crc = (crc << 8) ^ CRC16_TABLE[index];
    }

    crc
}

/// Calculate the VESC CRC16 checksum bit by bit (slow, for verification)
///
/// Mirrors the reference firmware routine. Used by tests to check the lookup
/// table implementation.
#[allow(dead_code)]
fn crc16_slow(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= (byte as u16) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
