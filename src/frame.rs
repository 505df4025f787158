//! Length-prefixed framing for inbound TCP submissions.

use thiserror::Error;

/// Protocol id every client frame must carry; a mismatch marks the
/// connection hostile or stale. Deployment parameter shared with
/// clients.
pub const TX_PROTO_ID: u16 = 0x5054;

/// Header: `u16 size` (total frame bytes including the header, little
/// endian), `u16 proto_id`.
pub const TX_HDR_LEN: usize = 4;

/// Frames above this are a protocol violation.
pub const MAX_FRAME_LEN: usize = 16 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("unknown protocol id {0:#06x}")]
    BadProtoId(u16),
    #[error("frame size {0} out of range")]
    BadSize(usize),
}

/// Streaming frame parser over a per-connection buffer. Incomplete
/// frames leave the buffer untouched; complete frames are consumed; any
/// error means the connection must be torn down.
#[derive(Debug, Default)]
pub struct Framer {
    buf: Vec<u8>,
}

impl Framer {
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.buf.len() < TX_HDR_LEN {
            return Ok(None);
        }
        let size = u16::from_le_bytes([self.buf[0], self.buf[1]]) as usize;
        let proto_id = u16::from_le_bytes([self.buf[2], self.buf[3]]);
        if proto_id != TX_PROTO_ID {
            return Err(FrameError::BadProtoId(proto_id));
        }
        if size < TX_HDR_LEN || size > MAX_FRAME_LEN {
            return Err(FrameError::BadSize(size));
        }
        if self.buf.len() < size {
            return Ok(None);
        }
        let payload = self.buf[TX_HDR_LEN..size].to_vec();
        self.buf.drain(..size);
        Ok(Some(payload))
    }
}

/// Frame a payload for submission to the proxy port.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let size = payload.len() + TX_HDR_LEN;
    assert!(size <= MAX_FRAME_LEN, "payload too large to frame");
    let mut frame = Vec::with_capacity(size);
    frame.extend_from_slice(&(size as u16).to_le_bytes());
    frame.extend_from_slice(&TX_PROTO_ID.to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_header_yields() {
        let mut framer = Framer::default();
        framer.feed(&[8, 0, 0]);
        assert_eq!(framer.next_frame(), Ok(None));
        assert_eq!(framer.buffered(), 3);
    }

    #[test]
    fn test_incomplete_payload_yields() {
        let mut framer = Framer::default();
        let frame = encode_frame(&[1, 2, 3, 4]);
        framer.feed(&frame[..frame.len() - 1]);
        assert_eq!(framer.next_frame(), Ok(None));
        framer.feed(&frame[frame.len() - 1..]);
        assert_eq!(framer.next_frame(), Ok(Some(vec![1, 2, 3, 4])));
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_two_frames_in_one_read() {
        let mut framer = Framer::default();
        let mut bytes = encode_frame(b"first");
        bytes.extend_from_slice(&encode_frame(b"second"));
        framer.feed(&bytes);
        assert_eq!(framer.next_frame(), Ok(Some(b"first".to_vec())));
        assert_eq!(framer.next_frame(), Ok(Some(b"second".to_vec())));
        assert_eq!(framer.next_frame(), Ok(None));
    }

    #[test]
    fn test_empty_payload_frame() {
        let mut framer = Framer::default();
        framer.feed(&encode_frame(&[]));
        assert_eq!(framer.next_frame(), Ok(Some(vec![])));
    }

    #[test]
    fn test_bad_proto_id() {
        let mut framer = Framer::default();
        framer.feed(&[8, 0, 0xad, 0xde, 1, 2, 3, 4]);
        assert_eq!(framer.next_frame(), Err(FrameError::BadProtoId(0xdead)));
    }

    #[test]
    fn test_size_below_header() {
        let mut frame = encode_frame(&[1, 2]);
        frame[0] = 3;
        frame[1] = 0;
        let mut framer = Framer::default();
        framer.feed(&frame);
        assert_eq!(framer.next_frame(), Err(FrameError::BadSize(3)));
    }

    #[test]
    fn test_size_above_max() {
        let size = (MAX_FRAME_LEN + 1) as u16;
        let mut framer = Framer::default();
        framer.feed(&size.to_le_bytes());
        framer.feed(&TX_PROTO_ID.to_le_bytes());
        assert_eq!(
            framer.next_frame(),
            Err(FrameError::BadSize(MAX_FRAME_LEN + 1))
        );
    }
}
