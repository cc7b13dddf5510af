use std::fmt;
use std::io;

use panelbridge_frame::FrameError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => PORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn serial_error(context: &str, err: serialport::Error) -> CliError {
    let code = match err.kind() {
        serialport::ErrorKind::NoDevice => PORT_ERROR,
        serialport::ErrorKind::InvalidInput => FAILURE,
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
        _ => PORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::StreamClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_permission_maps_to_permission_code() {
        let err = io_error("open", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn frame_stream_closed_maps_to_failure() {
        let err = frame_error("write", FrameError::StreamClosed);
        assert_eq!(err.code, FAILURE);
        assert!(err.to_string().contains("write"));
    }

    #[test]
    fn frame_io_timeout_maps_to_timeout_code() {
        let err = frame_error(
            "read",
            FrameError::Io(io::Error::from(io::ErrorKind::TimedOut)),
        );
        assert_eq!(err.code, TIMEOUT);
    }
}
