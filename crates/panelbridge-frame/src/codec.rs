use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum;
use crate::error::{FrameError, Result};

/// Marker bytes opening every frame.
pub const MARKER: [u8; 2] = [0x55, 0xAA];

/// Bytes of overhead around the payload: marker (2) + length (1) + checksum (1).
pub const FRAME_OVERHEAD: usize = 4;

/// Maximum total frame size on the wire.
pub const MAX_FRAME_SIZE: usize = 256;

/// Maximum payload length representable within [`MAX_FRAME_SIZE`].
pub const MAX_PAYLOAD: usize = MAX_FRAME_SIZE - FRAME_OVERHEAD;

/// One complete, checksum-valid protocol message.
///
/// Wire format:
/// ```text
/// ┌─────────────┬───────────┬──────────────────┬──────────────┐
/// │ Marker (2B) │ Length    │ Payload          │ Checksum     │
/// │ 0x55 0xAA   │ (1B)      │ (Length bytes)   │ (1B)         │
/// └─────────────┴───────────┴──────────────────┴──────────────┘
/// ```
///
/// Immutable once assembled; cloning is cheap (shared byte buffer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Build a frame around a payload, computing length field and checksum.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + payload.len());
        encode_frame(payload, &mut buf)?;
        Ok(Self { bytes: buf.freeze() })
    }

    /// Wrap raw wire bytes that are already known to be a valid frame.
    ///
    /// Rejects byte sequences that fail the structural or checksum checks.
    pub fn from_wire(bytes: Bytes) -> Result<Self> {
        if bytes.len() < FRAME_OVERHEAD {
            return Err(FrameError::Malformed("shorter than minimum frame"));
        }
        if bytes[0..2] != MARKER {
            return Err(FrameError::Malformed("missing marker"));
        }
        if bytes.len() != bytes[2] as usize + FRAME_OVERHEAD {
            return Err(FrameError::Malformed("length field mismatch"));
        }
        if !checksum::validate(&bytes) {
            return Err(FrameError::Malformed("checksum mismatch"));
        }
        Ok(Self { bytes })
    }

    /// The full wire representation, marker through checksum.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared payload length from the length field.
    pub fn payload_len(&self) -> usize {
        self.bytes[2] as usize
    }

    /// The payload bytes between length field and checksum.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[3..self.bytes.len() - 1]
    }

    /// The trailing checksum byte.
    pub fn checksum_byte(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    /// Total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Display for Frame {
    /// Space-separated uppercase hex, the form used in diagnostic logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Encode a payload into the wire format, appending to `dst`.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let start = dst.len();
    dst.reserve(FRAME_OVERHEAD + payload.len());
    dst.put_slice(&MARKER);
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    let cs = checksum::checksum(&dst[start..]);
    dst.put_u8(cs);
    Ok(())
}
