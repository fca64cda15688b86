//! Serial transport over any `std::io::Read`
//!
//! On a host the sensor's UART shows up as a character device (a USB
//! adapter at `/dev/ttyUSB0`, say) configured for 9600 8N1 outside the
//! process, with `VTIME` set so a read returns 0 once the line has been
//! quiet for a moment. One sensor burst then arrives as several short reads
//! followed by a 0. Any reader works, which is also how tests and replays
//! feed recorded bytes in.

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use airguard_core::traits::SerialTransport;

/// Adapts a blocking reader to [`SerialTransport`]
#[derive(Debug)]
pub struct ReaderTransport<R: Read> {
    reader: R,
}

impl ReaderTransport<File> {
    /// Open a serial device node
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        File::open(path).map(Self::new)
    }
}

impl<R: Read> ReaderTransport<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> SerialTransport for ReaderTransport<R> {
    type Error = io::Error;

    /// Collect one burst: keep reading until the line goes quiet or `buf`
    /// is full
    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                // end of input or VTIME expiry
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
                Err(e) => return Err(nb::Error::Other(e)),
            }
        }

        if filled == 0 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(filled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airguard_core::frame::Frame;
    use std::io::Cursor;

    #[test]
    fn passes_bytes_through() {
        let mut transport = ReaderTransport::new(Cursor::new(Frame::encode(42).to_vec()));
        let mut buf = [0u8; 64];

        assert_eq!(transport.read(&mut buf).unwrap(), 20);
        assert_eq!(&buf[..20], &Frame::encode(42));
    }

    #[test]
    fn collects_a_burst_from_short_reads() {
        let bytes: Vec<u8> = [1u16, 2, 3].iter().flat_map(|&v| Frame::encode(v)).collect();
        let mut transport = ReaderTransport::new(Trickle(Cursor::new(bytes)));
        let mut buf = [0u8; 640];

        assert_eq!(transport.read(&mut buf).unwrap(), 60);
        assert_eq!(&buf[40..60], &Frame::encode(3));
    }

    /// Returns at most 7 bytes per read, like a slow UART
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(7);
            self.0.read(&mut buf[..len])
        }
    }

    #[test]
    fn end_of_input_is_would_block() {
        let mut transport = ReaderTransport::new(Cursor::new(Vec::new()));
        let mut buf = [0u8; 64];

        assert!(matches!(transport.read(&mut buf), Err(nb::Error::WouldBlock)));
    }

    struct Failing(ErrorKind);

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }
    }

    #[test]
    fn timeout_is_would_block_other_errors_pass() {
        let mut buf = [0u8; 8];

        let mut timed_out = ReaderTransport::new(Failing(ErrorKind::TimedOut));
        assert!(matches!(timed_out.read(&mut buf), Err(nb::Error::WouldBlock)));

        let mut broken = ReaderTransport::new(Failing(ErrorKind::BrokenPipe));
        assert!(matches!(broken.read(&mut buf), Err(nb::Error::Other(_))));
    }
}
