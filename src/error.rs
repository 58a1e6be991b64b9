//! # Error Types
//!
//! Custom error types for the VESC UART emulator using `thiserror`.

use thiserror::Error;

/// Main error type for the emulator
#[derive(Debug, Error)]
pub enum VescError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry record serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),
}

/// Reasons a byte span is rejected as a VESC frame
///
/// The stream framer recovers from every one of these by skipping a single
/// byte; they are only surfaced for logging and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Fewer bytes than the smallest possible frame
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    /// First byte is neither start marker
    #[error("invalid start marker: 0x{0:02X}")]
    InvalidStartMarker(u8),

    /// Declared payload length disagrees with the span length
    #[error("length mismatch: header declares {declared} bytes, frame holds {actual}")]
    LengthMismatch {
        /// Total frame length implied by the header
        declared: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Last byte is not the end marker
    #[error("invalid end marker: 0x{0:02X}")]
    InvalidEndMarker(u8),

    /// Received checksum does not match the payload
    #[error("CRC mismatch: expected 0x{expected:04X}, got 0x{received:04X}")]
    CrcMismatch {
        /// Checksum computed over the payload
        expected: u16,
        /// Checksum carried by the frame
        received: u16,
    },
}

/// Reasons a verified payload does not map to a handled command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Zero-length payload
    #[error("empty payload")]
    Empty,

    /// Command ID this emulator does not implement
    #[error("unknown command ID {0}")]
    Unknown(u8),

    /// Known command with a body shorter than it requires
    #[error("command {id} truncated: {len} bytes")]
    Truncated {
        /// Command ID byte
        id: u8,
        /// Full payload length including the ID byte
        len: usize,
    },
}

/// Result type alias for the emulator
pub type Result<T> = std::result::Result<T, VescError>;
