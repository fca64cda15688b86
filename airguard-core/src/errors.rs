//! Error Types for Decoding, Conditioning and Configuration
//!
//! ## Design Philosophy
//!
//! The node never stops because of an error. Every error here is a value
//! that a component returns and the outer loop turns into a log record:
//!
//! 1. **Small and `Copy`**: errors are returned on every cycle and carry
//!    only inline data, no `String`.
//! 2. **Carry their severity**: a rejected batch is routine, an unreadable
//!    transport is not. Each conditioning error knows the severity it is
//!    logged at so callers don't re-derive it.
//! 3. **Absent is not zero**: a cycle that produced no value says *why*
//!    through [`ConditioningError`] instead of a magic number.
//!
//! ## Error Categories
//!
//! ### Frame level
//! - [`FrameError::BadMagic`] / [`FrameError::BadChecksum`]: one 20-byte stride
//!   is discarded, decoding continues with the next stride.
//!
//! ### Batch level
//! - [`ConditioningError::NoFrames`], [`ConditioningError::TooVolatile`],
//!   [`ConditioningError::InsufficientData`]: the whole cycle is absent and the
//!   filter state resets.
//!
//! ### Transport level
//! - [`ConditioningError::TransportFailed`]: the read itself failed.
//! - [`ConditioningError::NoData`]: the read timed out empty; repeated
//!   occurrences escalate through the acquisition failure counter.
//!
//! ### Cycle level
//! - [`CycleError`]: a cycle stopped before finishing its work. The outer
//!   loop logs it at critical and starts the next cycle.
//!
//! ### Startup
//! - [`ConfigError`]: the configuration cannot be turned into a running node.

use thiserror_no_std::Error;

use crate::logging::Severity;

/// Result type for conditioning stages
pub type ConditioningResult<T> = Result<T, ConditioningError>;

/// Why one 20-byte stride was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The first three bytes are not `16 11 0B`
    #[error("bad magic")]
    BadMagic,

    /// The 20 bytes do not sum to 0 mod 256
    #[error("bad checksum")]
    BadChecksum,
}

/// Why an acquisition cycle produced no reading
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConditioningError {
    /// The transport read failed outright
    #[error("sensor transport read failed")]
    TransportFailed,

    /// Nothing (or less than one frame) arrived within the read timeout
    #[error("no data from sensor within read timeout")]
    NoData,

    /// The read returned data but no frame survived decoding
    #[error("no sensor readings found")]
    NoFrames,

    /// The retained values spread too far apart to be trusted
    #[error("sensor readings too volatile: {min}..{max}")]
    TooVolatile {
        /// Smallest retained raw value
        min: u16,
        /// Largest retained raw value
        max: u16,
    },

    /// Fewer usable values than the reduction needs
    #[error("sensor readings missing: need {required}, have {available}")]
    InsufficientData {
        /// Minimum number of values the reduction needs
        required: usize,
        /// Values actually retained
        available: usize,
    },
}

impl ConditioningError {
    /// Severity this condition is reported at
    pub fn severity(&self) -> Severity {
        match self {
            Self::TransportFailed => Severity::Critical,
            // Escalated separately by the acquisition failure counter
            Self::NoData => Severity::Debug,
            Self::NoFrames => Severity::Critical,
            Self::TooVolatile { .. } => Severity::Warning,
            Self::InsufficientData { .. } => Severity::Error,
        }
    }
}

/// Why a cycle ended before finishing its work
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleError {
    /// The offline sink refused the reading
    #[error("offline log write failed")]
    OfflineWrite,
}

/// Configuration rejected at startup
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Exponential smoothing coefficient outside `[0, 1)`
    #[error("smoothing coefficient {alpha} outside [0, 1)")]
    InvalidSmoothing {
        /// The rejected coefficient
        alpha: f32,
    },

    /// Adjustment constant is NaN or infinite
    #[error("adjustment {field} is not a finite number")]
    InvalidAdjustment {
        /// Which constant (`adjust_add` or `adjust_mul`)
        field: &'static str,
    },

    /// A required text field is empty
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// Serial read timeout too short to capture one sensor burst
    #[error("serial timeout {timeout_ms}ms is below the {min_ms}ms sensor cycle")]
    TimeoutTooShort {
        /// Configured timeout
        timeout_ms: u32,
        /// Smallest timeout accepted
        min_ms: u32,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConditioningError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::TransportFailed =>
                defmt::write!(fmt, "Transport read failed"),
            Self::NoData =>
                defmt::write!(fmt, "No data"),
            Self::NoFrames =>
                defmt::write!(fmt, "No frames"),
            Self::TooVolatile { min, max } =>
                defmt::write!(fmt, "Too volatile {}..{}", min, max),
            Self::InsufficientData { required, available } =>
                defmt::write!(fmt, "Need {} values, have {}", required, available),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FrameError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::BadMagic => defmt::write!(fmt, "Bad magic"),
            Self::BadChecksum => defmt::write!(fmt, "Bad checksum"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CycleError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::OfflineWrite => defmt::write!(fmt, "Offline write failed"),
        }
    }
}
