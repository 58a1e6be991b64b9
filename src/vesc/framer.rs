//! # Stream Framer
//!
//! Extracts checksum-verified VESC frames from the circular receive window.
//!
//! The framer owns the scan cursor. Each pass works against a snapshot of the
//! write position taken by the caller, so bytes that land mid-pass are left
//! for the next pass. The framer never waits: an incomplete frame at the end
//! of the available bytes stays unconsumed until more bytes arrive.
//!
//! Any rejection (unknown byte, impossible length, bad end marker, CRC
//! mismatch) advances the cursor by exactly one byte. A false start marker
//! inside noise therefore never swallows a real frame that follows it.

use tracing::{debug, trace};

use super::decoder::{decode_frame, frame_len, parse_header};
use super::protocol::header_len;
use super::window::RxWindow;
use crate::error::FrameError;
use crate::telemetry::ProtocolStats;

/// Scan state over a receive window
#[derive(Debug, Clone)]
pub struct StreamFramer {
    /// Position of the next unread byte
    cursor: usize,
    /// Linear copy of the frame under inspection
    scratch: Vec<u8>,
}

impl StreamFramer {
    /// Create a framer for a window of `capacity` bytes, cursor at 0
    pub fn new(capacity: usize) -> Self {
        Self {
            cursor: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Position of the next unread byte
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Find the next valid frame in `[cursor, write_pos)`
    ///
    /// # Arguments
    ///
    /// * `window` - Receive window
    /// * `write_pos` - Write position snapshot for this pass
    /// * `stats` - Counters updated with every skip and rejection
    ///
    /// # Returns
    ///
    /// * `Option<&[u8]>` - Payload of the next valid frame, with the cursor
    ///   already moved past the whole frame; `None` once the available bytes
    ///   are exhausted or end in an incomplete frame
    pub fn next_frame(
        &mut self,
        window: &RxWindow,
        write_pos: usize,
        stats: &mut ProtocolStats,
    ) -> Option<&[u8]> {
        while self.cursor != write_pos {
            let start = self.cursor;

            let Some(header_len) = header_len(window.byte_at(start, 0)) else {
                trace!("Skipping non-start byte at {}", start);
                self.resync(window, stats);
                continue;
            };

            let available = window.distance(start, write_pos);
            let header_bytes = available.min(header_len);
            let mut header = [0u8; 3];
            for (offset, byte) in header[..header_bytes].iter_mut().enumerate() {
                *byte = window.byte_at(start, offset);
            }

            let Some((header_len, payload_len)) = parse_header(&header[..header_bytes]) else {
                trace!("Length header at {} not complete yet", start);
                return None;
            };

            let total_len = frame_len(header_len, payload_len);
            if total_len > window.max_readable() {
                debug!(
                    "Frame at {} declares {} bytes, more than the window can hold ({})",
                    start,
                    total_len,
                    window.max_readable()
                );
                stats.oversize_lengths += 1;
                self.resync(window, stats);
                continue;
            }

            if available < total_len {
                trace!(
                    "Frame at {} incomplete: {} of {} bytes",
                    start,
                    available,
                    total_len
                );
                return None;
            }

            window.copy_out(start, total_len, &mut self.scratch);

            match decode_frame(&self.scratch).map(|_| ()) {
                Ok(()) => {
                    self.cursor = window.advance(start, total_len);
                    stats.frames_received += 1;
                    return Some(&self.scratch[header_len..header_len + payload_len]);
                }
                Err(e) => {
                    debug!("Rejected frame at {}: {}", start, e);
                    match e {
                        FrameError::CrcMismatch { .. } => stats.crc_errors += 1,
                        FrameError::InvalidEndMarker(_) => stats.end_marker_errors += 1,
                        _ => {}
                    }
                    self.resync(window, stats);
                }
            }
        }

        None
    }

    /// Drain every complete frame available before `write_pos`
    ///
    /// # Returns
    ///
    /// * `usize` - Number of payloads passed to `on_payload`
    pub fn process<F>(
        &mut self,
        window: &RxWindow,
        write_pos: usize,
        stats: &mut ProtocolStats,
        mut on_payload: F,
    ) -> usize
    where
        F: FnMut(&[u8]),
    {
        let mut count = 0;
        while let Some(payload) = self.next_frame(window, write_pos, stats) {
            on_payload(payload);
            count += 1;
        }
        count
    }

    /// Skip one byte
    fn resync(&mut self, window: &RxWindow, stats: &mut ProtocolStats) {
        self.cursor = window.advance(self.cursor, 1);
        stats.resync_bytes += 1;
    }
}
