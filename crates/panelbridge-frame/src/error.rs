/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the maximum a 1-byte length field can carry
    /// within the 256-byte frame limit.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The byte sequence is not a well-formed frame.
    #[error("malformed frame: {0}")]
    Malformed(&'static str),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame could be written.
    #[error("stream closed (incomplete frame)")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
