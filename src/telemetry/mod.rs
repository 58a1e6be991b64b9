//! # Telemetry Module
//!
//! Protocol statistics and their JSONL log.
//!
//! This module handles:
//! - Counting dispatched frames, resyncs and dropped commands
//! - Formatting snapshots as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Retaining only the last M files

pub mod logger;

use serde::Serialize;

/// Counters kept by the protocol engine
///
/// Malformed input never produces a response, so these counters are the only
/// place framing and command failures become visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolStats {
    /// Frames that passed CRC and end-marker checks
    pub frames_received: u64,
    /// Bytes skipped one at a time while resynchronizing
    pub resync_bytes: u64,
    /// Headers declaring a frame larger than the receive window
    pub oversize_lengths: u64,
    /// Frames rejected on checksum
    pub crc_errors: u64,
    /// Frames rejected on a missing end marker
    pub end_marker_errors: u64,
    /// Valid frames with an unhandled command ID
    pub unknown_commands: u64,
    /// Valid frames with an empty or truncated command body
    pub malformed_commands: u64,
    /// Response frames transmitted
    pub responses_sent: u64,
    /// Response frames that failed or timed out
    pub transmit_errors: u64,
    /// Receive calls that overwrote unread bytes
    pub rx_overruns: u64,
}
