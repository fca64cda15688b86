//! Connectivity Timings
//!
//! Timings for the link/session state machine. The node has one control
//! thread, so every delay here is time the sensor is not being read; they
//! are kept as short as the radio allows.

use super::time::MS_PER_SECOND;

/// Interval between link status polls while connecting.
pub const LINK_POLL_INTERVAL_MS: u32 = 1_000;

/// Largest number of polls granted to one connect attempt.
///
/// The budget starts at 1 and grows by one after every failed attempt,
/// wrapping back to 1 after this value.
pub const MAX_LINK_POLL_BUDGET: u8 = 5;

/// Pause after the link comes up before the first broker session attempt.
///
/// Some access points report association before DHCP and routing are usable.
pub const LINK_SETTLE_DELAY_MS: u32 = 5_000;

/// Without a successful publish or ping for this long, the session is
/// dropped so the next cycle builds a fresh one.
pub const SESSION_STALE_AFTER_MS: u64 = 100 * MS_PER_SECOND;

/// Without a successful publish or ping for this long, the link itself is
/// dropped.
pub const LINK_STALE_AFTER_MS: u64 = 200 * MS_PER_SECOND;

/// Default MQTT broker port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Default MQTT keep-alive in seconds.
pub const DEFAULT_KEEP_ALIVE_SECS: u16 = 60;

/// Default serial read timeout. Must exceed one sensor reporting burst (~2s).
pub const DEFAULT_SERIAL_TIMEOUT_MS: u32 = 3_000;

/// Shortest accepted serial read timeout: one full sensor reporting burst.
pub const MIN_SERIAL_TIMEOUT_MS: u32 = 2_000;
