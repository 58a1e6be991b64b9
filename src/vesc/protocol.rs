//! # VESC Protocol Constants and Types
//!
//! Core protocol definitions for the VESC UART packet format.

use crate::error::CommandError;

/// Start marker for frames with a 1-byte length header (payload ≤ 255 bytes)
pub const VESC_PACKET_START_SMALL: u8 = 0x02;

/// Start marker for frames with a 2-byte big-endian length header
pub const VESC_PACKET_START_LARGE: u8 = 0x03;

/// End marker closing every frame
pub const VESC_PACKET_END: u8 = 0x03;

/// Largest payload that fits the small header variant
pub const VESC_SMALL_PAYLOAD_MAX: usize = 255;

/// Bytes following the payload: CRC (2) + end marker (1)
pub const VESC_TRAILER_LEN: usize = 3;

/// Default receive window size in bytes
pub const VESC_RX_BUFFER_SIZE: usize = 256;

/// Default transmit timeout in milliseconds
pub const VESC_TX_TIMEOUT_MS: u64 = 100;

/// Length of the zeroed UUID field in the firmware response
pub const VESC_UUID_LEN: usize = 12;

/// Placeholder FET and motor temperature (25.0 °C, scaled ×10)
pub const VESC_PLACEHOLDER_TEMP: i16 = 250;

/// Controller ID reported in the live-values response
pub const VESC_CONTROLLER_ID: u8 = 1;

/// Live-values response payload size (command echo included)
pub const VESC_VALUES_PAYLOAD_SIZE: usize = 59;

/// Set-current payload size: command ID + f32
pub const VESC_SET_CURRENT_PAYLOAD_SIZE: usize = 5;

/// Length header size for a given start marker, or `None` if the byte is not a
/// start marker
pub fn header_len(start_marker: u8) -> Option<usize> {
    match start_marker {
        VESC_PACKET_START_SMALL => Some(2),
        VESC_PACKET_START_LARGE => Some(3),
        _ => None,
    }
}

/// Command IDs handled by the emulator
///
/// Values mirror `COMM_PACKET_ID` in the VESC firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommPacketId {
    /// Report firmware version
    FwVersion = 0,
    /// Report live telemetry
    GetValues = 4,
    /// Set target motor current
    SetCurrent = 6,
    /// Keep-alive
    Alive = 30,
}

impl TryFrom<u8> for CommPacketId {
    type Error = CommandError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FwVersion),
            4 => Ok(Self::GetValues),
            6 => Ok(Self::SetCurrent),
            30 => Ok(Self::Alive),
            other => Err(CommandError::Unknown(other)),
        }
    }
}

impl From<CommPacketId> for u8 {
    fn from(id: CommPacketId) -> Self {
        id as u8
    }
}

/// Identity reported in the firmware-version response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareInfo {
    /// Firmware major version
    pub major: u8,
    /// Firmware minor version
    pub minor: u8,
    /// Firmware patch version
    pub patch: u8,
    /// Hardware name, sent verbatim without terminator
    pub hw_name: String,
    /// Paired flag
    pub paired: bool,
}

impl Default for FirmwareInfo {
    fn default() -> Self {
        Self {
            major: 5,
            minor: 2,
            patch: 0,
            hw_name: "EBiCS".to_string(),
            paired: false,
        }
    }
}

/// Live telemetry in VESC wire units
///
/// Fields not listed here (Id, Iq, duty, energy counters, tachometer, PID
/// position) are always reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Values {
    /// FET temperature in °C ×10
    pub temp_fet: i16,
    /// Motor temperature in °C ×10
    pub temp_motor: i16,
    /// Average motor current in A ×100
    pub avg_motor_current: i32,
    /// Average input current in A ×100
    pub avg_input_current: i32,
    /// Electrical RPM
    pub rpm: i32,
    /// Input voltage in V ×10
    pub input_voltage: i16,
    /// Fault code
    pub fault_code: u8,
    /// Controller ID
    pub controller_id: u8,
}
