//! Conditioning Pipeline Constants
//!
//! Thresholds for turning a batch of raw sensor values into one reading,
//! plus the capacities of the history kept alongside.

// ===== SELECTION =====

/// Only the most recent values of a batch are kept for reduction.
pub const MAX_RETAINED_VALUES: usize = 6;

/// Fewer usable values than this is "insufficient data".
pub const MIN_USABLE_VALUES: usize = 3;

// ===== OUTLIER REJECTION =====

/// Spread (max - min, in raw sensor units) at which a batch is rejected.
///
/// The sensor's raw values are noisy but a spread of 100 units within a
/// single burst means the burst straddles a disturbance (door opened, fan
/// spin-up) and none of it is trustworthy.
pub const VOLATILITY_THRESHOLD: u16 = 100;

// ===== HISTORY =====

/// Capacity of the adjusted-reading ring buffer.
///
/// One sample every ~30 seconds, so 120 slots hold roughly one hour.
pub const HISTORY_CAPACITY: usize = 120;

/// Short aggregation window (entries).
pub const SHORT_WINDOW_LEN: usize = 3;

/// Medium aggregation window (entries).
pub const MEDIUM_WINDOW_LEN: usize = 10;

/// Long aggregation window (entries), the whole history.
pub const LONG_WINDOW_LEN: usize = HISTORY_CAPACITY;

// ===== OUTPUT =====

/// Decimal places in the published payload.
pub const PAYLOAD_DECIMALS: usize = 2;

/// Capacity of the formatted payload string (fits `f32::MAX` with two decimals).
pub const PAYLOAD_CAPACITY: usize = 48;

/// Metric label used in offline log lines unless configured otherwise.
pub const DEFAULT_METRIC: &str = "PMVT";
