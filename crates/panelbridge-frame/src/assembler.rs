use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};

use crate::codec::{Frame, FRAME_OVERHEAD, MARKER, MAX_FRAME_SIZE};

/// Default receive timeout after which a partial frame is abandoned.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Diagnostic counters for one assembler instance.
///
/// None of these conditions is fatal; they exist for visibility only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Complete, checksum-valid frames emitted.
    pub frames: u64,
    /// Length-complete frames discarded for a bad checksum.
    pub checksum_failures: u64,
    /// Buffers discarded because they filled before length-completeness.
    pub overflows: u64,
    /// Partial buffers discarded by the receive timeout.
    pub timeouts: u64,
}

/// Incremental frame parser over an unreliable byte stream.
///
/// Feed bytes one at a time with [`push`](Self::push); complete validated
/// frames come back as they finish. Garbage between frames, corrupt
/// frames, and abandoned partials are discarded and the assembler
/// resynchronizes on the next marker byte.
///
/// One instance per monitored channel; state never crosses channels.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    last_byte_at: Option<Instant>,
    timeout: Duration,
    stats: AssemblerStats,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create an assembler with the default receive timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_RECEIVE_TIMEOUT)
    }

    /// Create an assembler with an explicit receive timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
            last_byte_at: None,
            timeout,
            stats: AssemblerStats::default(),
        }
    }

    /// Feed one received byte; returns a frame when one completes.
    ///
    /// While the buffer is empty, anything other than the first marker
    /// byte is dropped. A length-complete accumulation is validated
    /// immediately: valid frames are emitted, invalid ones discarded so
    /// the next marker byte starts fresh.
    pub fn push(&mut self, byte: u8, now: Instant) -> Option<Frame> {
        if self.buf.is_empty() && byte != MARKER[0] {
            return None;
        }

        self.buf.put_u8(byte);
        self.last_byte_at = Some(now);

        if self.is_length_complete() {
            return self.finish_frame();
        }

        if self.buf.len() >= MAX_FRAME_SIZE {
            tracing::warn!(
                discarded = self.buf.len(),
                "assembly buffer overflow before frame completed"
            );
            self.stats.overflows += 1;
            self.reset();
        }

        None
    }

    /// Discard a stale partial frame.
    ///
    /// Returns true if a partial was abandoned. Call once per poll cycle;
    /// without this a stuck partial would swallow the next frame's marker.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_byte_at else {
            return false;
        };
        if self.buf.is_empty() || now.duration_since(last) <= self.timeout {
            return false;
        }

        tracing::debug!(
            discarded = self.buf.len(),
            "partial frame abandoned after receive timeout"
        );
        self.stats.timeouts += 1;
        self.reset();
        true
    }

    /// Number of bytes accumulated toward the next frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    fn is_length_complete(&self) -> bool {
        self.buf.len() >= FRAME_OVERHEAD
            && self.buf.len() >= self.buf[2] as usize + FRAME_OVERHEAD
    }

    fn finish_frame(&mut self) -> Option<Frame> {
        let bytes = self.buf.split().freeze();
        self.reset();

        match Frame::from_wire(bytes) {
            Ok(frame) => {
                self.stats.frames += 1;
                tracing::trace!(frame = %frame, "frame assembled");
                Some(frame)
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding length-complete frame");
                self.stats.checksum_failures += 1;
                None
            }
        }
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.last_byte_at = None;
    }
}
