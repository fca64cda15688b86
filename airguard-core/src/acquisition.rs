//! Sensor Acquisition
//!
//! One blocking read per cycle, decoded into a batch. Reads that time out
//! empty (or with less than one frame) are counted; the count escalates the
//! log severity so a disconnected sensor shows up in the remote log without
//! flooding it:
//!
//! | consecutive failures | logged at |
//! |----------------------|-----------|
//! | 10                   | warning   |
//! | 20                   | error     |
//! | 30, 40, 50, ...      | critical  |
//!
//! Any successful read resets the count.

use crate::constants::frame::{FRAME_LEN, READ_BUFFER_LEN};
use crate::errors::{ConditioningError, ConditioningResult, FrameError};
use crate::frame::{decode, DecodedBatch};
use crate::logging::{LogSink, Severity};
use crate::traits::SerialTransport;

/// Severity at which the `count`-th consecutive failed read is reported
pub fn escalation_severity(count: u32) -> Option<Severity> {
    match count {
        10 => Some(Severity::Warning),
        20 => Some(Severity::Error),
        n if n >= 30 && n % 10 == 0 => Some(Severity::Critical),
        _ => None,
    }
}

/// Reads and decodes sensor bursts from a [`SerialTransport`]
pub struct Acquisition<T: SerialTransport> {
    transport: T,
    buf: [u8; READ_BUFFER_LEN],
    consecutive_failures: u32,
}

impl<T: SerialTransport> Acquisition<T> {
    /// Wrap a transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            buf: [0; READ_BUFFER_LEN],
            consecutive_failures: 0,
        }
    }

    /// Consecutive reads that returned less than one frame
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Read one burst and decode it
    ///
    /// Malformed strides are logged at warning and skipped; the returned
    /// batch may be empty.
    pub fn acquire<L: LogSink>(&mut self, log: &mut L) -> ConditioningResult<DecodedBatch> {
        log.debug(format_args!("Waiting for UART"));

        let len = match self.transport.read(&mut self.buf) {
            Ok(len) if len >= FRAME_LEN => len.min(READ_BUFFER_LEN),
            Ok(_) | Err(nb::Error::WouldBlock) => {
                self.record_failure(log);
                return Err(ConditioningError::NoData);
            }
            Err(nb::Error::Other(e)) => {
                log.critical(format_args!("Exception {:?} while reading UART", e));
                return Err(ConditioningError::TransportFailed);
            }
        };

        self.consecutive_failures = 0;
        log.debug(format_args!("Read from UART ({} bytes)", len));

        let batch = decode(&self.buf[..len]);
        report_issues(&batch, log);
        log.info(format_args!("UART readings are {:?}", batch.values.as_slice()));

        Ok(batch)
    }

    fn record_failure<L: LogSink>(&mut self, log: &mut L) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if let Some(severity) = escalation_severity(self.consecutive_failures) {
            log.emit(
                severity,
                format_args!("uart.read() failed {} times", self.consecutive_failures),
            );
        }
    }
}

fn report_issues<L: LogSink>(batch: &DecodedBatch, log: &mut L) {
    let report = &batch.report;
    for issue in &report.issues {
        let what = match issue.error {
            FrameError::BadMagic => "Bad magic",
            FrameError::BadChecksum => "Bad checksum",
        };
        log.warning(format_args!("{} at {}, ignoring reading", what, issue.offset));
    }

    let listed = report.issues.len();
    let rejected = report.bad_magic + report.bad_checksum;
    if rejected > listed {
        log.warning(format_args!("{} more malformed frames ignored", rejected - listed));
    }
    if let Some(offset) = report.partial_at {
        log.warning(format_args!("Partial frame at {}, ignoring reading", offset));
    }
    if report.overflowed > 0 {
        log.warning(format_args!("Read overflowed, {} oldest frames dropped", report.overflowed));
    }
}
