//! Serial Transport Trait
//!
//! The sensor talks 9600 baud, one way. A read blocks for at most the
//! transport's configured timeout, which must be longer than one sensor
//! reporting burst (~2 s) so a single read captures a whole burst.
//!
//! Reads use `nb::Result` with the usual two-level meaning:
//! - `nb::Error::WouldBlock` - nothing arrived within the timeout
//! - `nb::Error::Other(e)` - the transport itself failed
//!
//! ```rust
//! use airguard_core::traits::SerialTransport;
//!
//! struct Silent;
//!
//! impl SerialTransport for Silent {
//!     type Error = core::convert::Infallible;
//!
//!     fn read(&mut self, _buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
//!         Err(nb::Error::WouldBlock)
//!     }
//! }
//! ```

use core::fmt;

/// Byte source for sensor frames
pub trait SerialTransport {
    /// Transport failure
    type Error: fmt::Debug;

    /// Fill `buf` with the bytes received within one read timeout
    ///
    /// Returns the number of bytes written. `Ok(0)` is treated like
    /// `WouldBlock`.
    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error>;
}

impl<T: SerialTransport + ?Sized> SerialTransport for &mut T {
    type Error = T::Error;

    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
        (**self).read(buf)
    }
}
