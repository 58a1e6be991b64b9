//! # Receive Window
//!
//! Fixed-capacity circular byte buffer filled by the transport.
//!
//! Positions are always kept in `0..capacity`. All wraparound arithmetic lives
//! in this type so the framer only deals with positions and distances.
//!
//! The writer never waits for the reader: if more bytes arrive than the
//! framer has drained, the oldest unread bytes are overwritten and lost.

/// Circular receive window
#[derive(Debug, Clone)]
pub struct RxWindow {
    /// Backing storage, written in place like a DMA ring
    buf: Vec<u8>,
    /// Next position the producer writes to
    write_pos: usize,
}

impl RxWindow {
    /// Create a zero-filled window
    ///
    /// # Arguments
    ///
    /// * `capacity` - Window size in bytes, at least 2
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "receive window needs at least 2 bytes");
        Self {
            buf: vec![0u8; capacity],
            write_pos: 0,
        }
    }

    /// Window size in bytes
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Most unread bytes the window can hold
    ///
    /// One slot stays free so that `cursor == write_position` means empty.
    pub fn max_readable(&self) -> usize {
        self.capacity() - 1
    }

    /// Position the next received byte will be stored at
    ///
    /// Equivalent to the running count of received bytes modulo capacity.
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Position `offset` bytes after `pos`, wrapping at capacity
    pub fn advance(&self, pos: usize, offset: usize) -> usize {
        (pos + offset % self.capacity()) % self.capacity()
    }

    /// Circular distance from `from` forward to `to`
    pub fn distance(&self, from: usize, to: usize) -> usize {
        if to >= from {
            to - from
        } else {
            self.capacity() - from + to
        }
    }

    /// Byte at `offset` bytes after `pos`
    pub fn byte_at(&self, pos: usize, offset: usize) -> u8 {
        self.buf[self.advance(pos, offset)]
    }

    /// Copy `len` bytes starting at `pos` into `out`, resolving wraparound
    ///
    /// `out` is cleared first.
    pub fn copy_out(&self, pos: usize, len: usize, out: &mut Vec<u8>) {
        out.clear();
        out.extend((0..len).map(|i| self.byte_at(pos, i)));
    }

    /// Store received bytes at the write position and advance it
    ///
    /// Bytes beyond one full window overwrite each other; only the last
    /// `capacity` bytes of `data` survive.
    pub fn write(&mut self, data: &[u8]) {
        for &byte in data {
            self.buf[self.write_pos] = byte;
            self.write_pos = self.advance(self.write_pos, 1);
        }
    }
}
