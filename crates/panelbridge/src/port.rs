//! Serial port setup and non-blocking byte draining.

use std::io::{self, ErrorKind, Read};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};

/// Line rate used by both peers.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Read timeout on the port; the poll loops treat an expired read as
/// "no bytes available" rather than blocking a whole cycle.
const READ_POLL: Duration = Duration::from_millis(5);

/// Open a port at 8N1 with the short poll timeout applied.
pub fn open(path: &str, baud: u32) -> serialport::Result<Box<dyn SerialPort>> {
    serialport::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(READ_POLL)
        .open()
}

/// Read whatever is immediately available into `buf`.
///
/// Returns `Ok(0)` when nothing is pending (timeout, would-block,
/// interrupted, or a quiet line); real I/O failures propagate.
pub fn read_available<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    match reader.read(buf) {
        Ok(n) => Ok(n),
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
            ) =>
        {
            Ok(0)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneShotThenTimeout {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for OneShotThenTimeout {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() {
                return Err(io::Error::from(ErrorKind::TimedOut));
            }
            let n = (self.data.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn drains_data_then_reports_empty() {
        let mut reader = OneShotThenTimeout {
            data: vec![1, 2, 3],
            pos: 0,
        };
        let mut buf = [0u8; 8];

        assert_eq!(read_available(&mut reader, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(read_available(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn real_errors_propagate() {
        struct BrokenReader;
        impl Read for BrokenReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(ErrorKind::BrokenPipe))
            }
        }

        let err = read_available(&mut BrokenReader, &mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }
}
