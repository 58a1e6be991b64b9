//! # VESC Packet Encoder
//!
//! Wraps payloads into VESC frames and builds response payloads.
//!
//! All multi-byte fields are big-endian; `bytes::BufMut` writes big-endian by
//! default.

use bytes::BufMut;

use super::crc::crc16;
use super::protocol::*;

/// Encode a payload into a complete VESC frame
///
/// # Arguments
///
/// * `payload` - Command ID and body
///
/// # Returns
///
/// * `Vec<u8>` - start marker + length + payload + CRC16 + end marker
///
/// # Panics
///
/// Payloads longer than `u16::MAX` cannot be framed; passing one is a caller
/// bug and panics in debug builds.
///
/// # Examples
///
/// ```
/// use vesc_uart_emu::vesc::encoder::encode_frame;
///
/// let frame = encode_frame(&[30]);
/// assert_eq!(frame.len(), 6);
/// assert_eq!(frame[0], 0x02);
/// assert_eq!(frame[5], 0x03);
/// ```
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 6);
    encode_frame_into(payload, &mut frame);
    frame
}

/// Encode a payload into a caller-provided buffer
///
/// The buffer is cleared first so a single scratch buffer can be reused for
/// every outbound frame.
pub fn encode_frame_into(payload: &[u8], out: &mut Vec<u8>) {
    debug_assert!(
        payload.len() <= u16::MAX as usize,
        "payload of {} bytes cannot be framed",
        payload.len()
    );

    out.clear();

    if payload.len() <= VESC_SMALL_PAYLOAD_MAX {
        out.put_u8(VESC_PACKET_START_SMALL);
        out.put_u8(payload.len() as u8);
    } else {
        out.put_u8(VESC_PACKET_START_LARGE);
        out.put_u16(payload.len() as u16);
    }

    out.put_slice(payload);
    out.put_u16(crc16(payload));
    out.put_u8(VESC_PACKET_END);
}

/// Build the `COMM_FW_VERSION` response payload
///
/// Layout: command echo, major, minor, patch, hardware name (no terminator),
/// 12-byte zeroed UUID, paired flag.
pub fn encode_fw_version_payload(firmware: &FirmwareInfo) -> Vec<u8> {
    let mut payload = Vec::with_capacity(5 + firmware.hw_name.len() + VESC_UUID_LEN);

    payload.put_u8(CommPacketId::FwVersion.into());
    payload.put_u8(firmware.major);
    payload.put_u8(firmware.minor);
    payload.put_u8(firmware.patch);
    payload.put_slice(firmware.hw_name.as_bytes());
    payload.put_bytes(0, VESC_UUID_LEN);
    payload.put_u8(firmware.paired as u8);

    payload
}

/// Build the `COMM_GET_VALUES` response payload (59 bytes)
///
/// ```text
/// Offset  Size  Field
/// 0       1     command echo
/// 1       2     temp FET (×10)
/// 3       2     temp motor (×10)
/// 5       4     avg motor current (×100)
/// 9       4     avg input current (×100)
/// 13      4     avg Id (×100)
/// 17      4     avg Iq (×100)
/// 21      2     duty cycle (×1000)
/// 23      4     RPM
/// 27      2     input voltage (×10)
/// 29      24    Ah, Ah charged, Wh, Wh charged, tacho, tacho abs
/// 53      1     fault code
/// 54      4     PID position (×1000000)
/// 58      1     controller ID
/// ```
pub fn encode_values_payload(values: &Values) -> Vec<u8> {
    let mut payload = Vec::with_capacity(VESC_VALUES_PAYLOAD_SIZE);

    payload.put_u8(CommPacketId::GetValues.into());
    payload.put_i16(values.temp_fet);
    payload.put_i16(values.temp_motor);
    payload.put_i32(values.avg_motor_current);
    payload.put_i32(values.avg_input_current);
    payload.put_i32(0); // Id
    payload.put_i32(0); // Iq
    payload.put_i16(0); // duty
    payload.put_i32(values.rpm);
    payload.put_i16(values.input_voltage);
    for _ in 0..6 {
        // Ah, Ah charged, Wh, Wh charged, tacho, tacho abs
        payload.put_i32(0);
    }
    payload.put_u8(values.fault_code);
    payload.put_i32(0); // PID position
    payload.put_u8(values.controller_id);

    payload
}

/// Build a `COMM_SET_CURRENT` payload, as a VESC host would send it
pub fn encode_set_current_payload(amps: f32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(VESC_SET_CURRENT_PAYLOAD_SIZE);
    payload.put_u8(CommPacketId::SetCurrent.into());
    payload.put_f32(amps);
    payload
}
