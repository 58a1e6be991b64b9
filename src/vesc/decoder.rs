//! # VESC Packet Decoder
//!
//! Validates a complete, linear VESC frame and extracts its payload.

use super::crc::crc16;
use super::protocol::*;
use crate::error::FrameError;

/// Smallest possible frame: start + 1-byte length + CRC + end (empty payload)
const MIN_FRAME_LEN: usize = 5;

/// Declared payload length carried by a frame header
///
/// # Arguments
///
/// * `header` - Frame bytes starting at the start marker; must hold at least
///   the full length header
///
/// # Returns
///
/// * `Option<(usize, usize)>` - `(header_len, payload_len)`, or `None` if the
///   first byte is not a start marker or the header is incomplete
pub fn parse_header(header: &[u8]) -> Option<(usize, usize)> {
    let header_len = header_len(*header.first()?)?;
    if header.len() < header_len {
        return None;
    }

    let payload_len = match header_len {
        2 => header[1] as usize,
        _ => u16::from_be_bytes([header[1], header[2]]) as usize,
    };

    Some((header_len, payload_len))
}

/// Total on-wire size of a frame with the given header and payload lengths
pub fn frame_len(header_len: usize, payload_len: usize) -> usize {
    header_len + payload_len + VESC_TRAILER_LEN
}

/// Decode a complete VESC frame
///
/// # Arguments
///
/// * `frame` - Exactly one frame (start marker through end marker)
///
/// # Returns
///
/// * `Result<&[u8], FrameError>` - The payload slice, or why the frame is invalid
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short
/// - Start marker is not recognized
/// - Header length disagrees with the frame size
/// - End marker is missing
/// - CRC check fails
///
/// # Examples
///
/// ```
/// use vesc_uart_emu::vesc::decoder::decode_frame;
/// use vesc_uart_emu::vesc::encoder::encode_frame;
///
/// let frame = encode_frame(&[4]);
/// assert_eq!(decode_frame(&frame), Ok(&[4u8][..]));
/// ```
pub fn decode_frame(frame: &[u8]) -> Result<&[u8], FrameError> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(FrameError::TooShort(frame.len()));
    }

    let (header_len, payload_len) =
        parse_header(frame).ok_or(FrameError::InvalidStartMarker(frame[0]))?;

    let declared = frame_len(header_len, payload_len);
    if declared != frame.len() {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: frame.len(),
        });
    }

    let end = frame[declared - 1];
    if end != VESC_PACKET_END {
        return Err(FrameError::InvalidEndMarker(end));
    }

    let payload = &frame[header_len..header_len + payload_len];
    let received = u16::from_be_bytes([frame[declared - 3], frame[declared - 2]]);
    let expected = crc16(payload);

    if expected != received {
        return Err(FrameError::CrcMismatch { expected, received });
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vesc::encoder::encode_frame;

    #[test]
    fn test_parse_header_small() {
        assert_eq!(parse_header(&[VESC_PACKET_START_SMALL, 59]), Some((2, 59)));
    }

    #[test]
    fn test_parse_header_large() {
        assert_eq!(
            parse_header(&[VESC_PACKET_START_LARGE, 0x01, 0x2C]),
            Some((3, 300))
        );
    }

    #[test]
    fn test_parse_header_incomplete_or_invalid() {
        assert_eq!(parse_header(&[]), None);
        assert_eq!(parse_header(&[VESC_PACKET_START_SMALL]), None);
        assert_eq!(parse_header(&[VESC_PACKET_START_LARGE, 0x01]), None);
        assert_eq!(parse_header(&[0x55, 0x01, 0x02]), None);
    }

    #[test]
    fn test_frame_len() {
        assert_eq!(frame_len(2, 0), 5);
        assert_eq!(frame_len(2, 59), 64);
        assert_eq!(frame_len(3, 300), 306);
    }

    #[test]
    fn test_decode_frame_too_short() {
        let frame = [VESC_PACKET_START_SMALL, 0x00, 0x00, 0x00];
        assert_eq!(decode_frame(&frame), Err(FrameError::TooShort(4)));
    }

    #[test]
    fn test_decode_frame_invalid_start() {
        let frame = [0xFF, 0x00, 0x00, 0x00, VESC_PACKET_END];
        assert_eq!(decode_frame(&frame), Err(FrameError::InvalidStartMarker(0xFF)));
    }

    #[test]
    fn test_decode_valid_frames() {
        let small = vec![4u8; 10];
        assert_eq!(decode_frame(&encode_frame(&small)), Ok(&small[..]));

        let large: Vec<u8> = (0..400u16).map(|i| (i % 251) as u8).collect();
        assert_eq!(decode_frame(&encode_frame(&large)), Ok(&large[..]));

        assert_eq!(decode_frame(&encode_frame(&[])), Ok(&[0u8; 0][..]));
    }

    #[test]
    fn test_decode_frame_length_mismatch() {
        let mut frame = encode_frame(&[0x04, 0x05]);
        frame.push(0x00);
        assert_eq!(
            decode_frame(&frame),
            Err(FrameError::LengthMismatch {
                declared: 7,
                actual: 8
            })
        );
    }

    #[test]
    fn test_decode_frame_bad_end_marker() {
        let mut frame = encode_frame(&[0x04]);
        let last = frame.len() - 1;
        frame[last] = 0x7E;
        assert_eq!(decode_frame(&frame), Err(FrameError::InvalidEndMarker(0x7E)));
    }

    #[test]
    fn test_decode_frame_crc_error() {
        let mut frame = encode_frame(&[0x04, 0x10, 0x20]);
        frame[3] ^= 0x01;

        match decode_frame(&frame) {
            Err(FrameError::CrcMismatch { expected, received }) => {
                assert_ne!(expected, received);
            }
            other => panic!("Expected CrcMismatch, got: {:?}", other),
        }
    }
}
