//! Sensor Frame Decoder
//!
//! ## Overview
//!
//! One transport read returns whatever bytes arrived within the read
//! timeout: normally a burst of back-to-back 20-byte frames, sometimes
//! with a cut-off frame at the end, occasionally with corruption from a
//! missed bit on the software UART.
//!
//! [`decode`] walks the buffer in fixed 20-byte strides. Each stride must
//! carry the magic header and a valid checksum; if it does, its big-endian
//! value is appended to the batch, otherwise only that stride is dropped and
//! the scan continues with the next one.
//!
//! ## Known Limitation
//!
//! The decoder does not resynchronise on the magic header at arbitrary byte
//! offsets. If a byte is lost mid-burst every following stride is misaligned
//! and rejected, and the cycle typically ends up with too few values. The
//! next read starts aligned again.
//!
//! ## Example
//!
//! ```rust
//! use airguard_core::frame::{decode, Frame};
//!
//! let mut buf = Vec::new();
//! buf.extend_from_slice(&Frame::encode(23));
//! buf.extend_from_slice(&Frame::encode(25));
//!
//! let batch = decode(&buf);
//! assert_eq!(batch.values.as_slice(), &[23, 25]);
//! assert!(batch.report.is_clean());
//! ```

use heapless::Vec;

use crate::constants::frame::{
    CHECKSUM_OFFSET, FRAME_LEN, FRAME_MAGIC, MAX_BATCH_FRAMES, MAX_STRIDE_ISSUES, VALUE_OFFSET,
};
use crate::errors::FrameError;

/// Raw values decoded from one transport read, in arrival order
pub type RawBatch = Vec<u16, MAX_BATCH_FRAMES>;

/// One validated 20-byte sensor frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Validate a 20-byte stride
    ///
    /// The magic header is checked before the checksum, so a misaligned
    /// stride reports `BadMagic`.
    pub fn parse(stride: &[u8; FRAME_LEN]) -> Result<Self, FrameError> {
        if stride[..FRAME_MAGIC.len()] != FRAME_MAGIC {
            return Err(FrameError::BadMagic);
        }
        if checksum(stride) != 0 {
            return Err(FrameError::BadChecksum);
        }
        Ok(Self { bytes: *stride })
    }

    /// The particulate value carried in DF3/DF4
    pub fn value(&self) -> u16 {
        u16::from_be_bytes([self.bytes[VALUE_OFFSET], self.bytes[VALUE_OFFSET + 1]])
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Build a valid frame carrying `value`
    ///
    /// All data bytes other than the value are zero; the checksum byte is
    /// computed so the frame sums to 0 mod 256.
    pub fn encode(value: u16) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[..FRAME_MAGIC.len()].copy_from_slice(&FRAME_MAGIC);
        bytes[VALUE_OFFSET..VALUE_OFFSET + 2].copy_from_slice(&value.to_be_bytes());
        bytes[CHECKSUM_OFFSET] = 0u8.wrapping_sub(checksum(&bytes));
        bytes
    }
}

/// Sum of all bytes mod 256
fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A rejected stride and where it started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrideIssue {
    /// Byte offset of the stride within the read buffer
    pub offset: usize,
    /// Why it was rejected
    pub error: FrameError,
}

/// Malformed-input counters for one read
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    /// Strides with a wrong header
    pub bad_magic: usize,
    /// Strides with a wrong checksum
    pub bad_checksum: usize,
    /// Offset of a trailing partial frame, if the buffer had one
    pub partial_at: Option<usize>,
    /// Valid frames discarded because the batch was full (oldest first)
    pub overflowed: usize,
    /// First few rejected strides, for diagnostics
    pub issues: Vec<StrideIssue, MAX_STRIDE_ISSUES>,
}

impl DecodeReport {
    /// No stride was rejected and nothing was cut off
    pub fn is_clean(&self) -> bool {
        self.malformed() == 0
    }

    /// Total malformed segments (bad magic, bad checksum, partial trailer)
    pub fn malformed(&self) -> usize {
        self.bad_magic + self.bad_checksum + usize::from(self.partial_at.is_some())
    }

    fn record(&mut self, offset: usize, error: FrameError) {
        match error {
            FrameError::BadMagic => self.bad_magic += 1,
            FrameError::BadChecksum => self.bad_checksum += 1,
        }
        // Counters stay exact even once the issue list is full
        let _ = self.issues.push(StrideIssue { offset, error });
    }
}

/// Values and diagnostics from one read
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodedBatch {
    /// Decoded values, oldest first
    pub values: RawBatch,
    /// What was rejected along the way
    pub report: DecodeReport,
}

/// Decode a transport buffer into validated values
///
/// Never panics on malformed input; every rejected segment is counted in
/// the report. If more valid frames arrive than a batch holds, the oldest
/// are dropped so the batch always ends with the most recent frames.
pub fn decode(buf: &[u8]) -> DecodedBatch {
    let mut batch = DecodedBatch::default();

    let mut rest = buf;
    let mut offset = 0;
    while let Some((stride, tail)) = rest.split_first_chunk::<FRAME_LEN>() {
        match Frame::parse(stride) {
            Ok(frame) => {
                if batch.values.is_full() {
                    batch.values.remove(0);
                    batch.report.overflowed += 1;
                }
                // Cannot fail: a slot was freed above if needed
                let _ = batch.values.push(frame.value());
            }
            Err(error) => batch.report.record(offset, error),
        }
        rest = tail;
        offset += FRAME_LEN;
    }

    if !rest.is_empty() {
        batch.report.partial_at = Some(offset);
    }

    batch
}
