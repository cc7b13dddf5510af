//! Length-prefixed, checksummed frame codec for the panel serial protocol.
//!
//! Every message on the wire is framed as:
//! - A 2-byte marker (0x55 0xAA) for stream synchronization
//! - A 1-byte payload length
//! - The payload
//! - A 1-byte additive checksum (whole frame sums to 0 mod 256)
//!
//! The [`FrameAssembler`] turns an unreliable byte stream into validated
//! frames, resynchronizing past garbage, corrupt frames, and abandoned
//! partials. No partial reads, no buffer management in user code.

pub mod assembler;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod writer;

pub use assembler::{AssemblerStats, FrameAssembler};
pub use checksum::{checksum, validate};
pub use codec::{encode_frame, Frame, FRAME_OVERHEAD, MARKER, MAX_FRAME_SIZE, MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use writer::FrameWriter;
