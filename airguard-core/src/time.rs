//! Time management for the node
//!
//! Provides clock abstraction for the two things the control loop needs:
//! - "now", to judge how stale the broker session is
//! - blocking delays, for link polling and the post-connect settle time
//!
//! Both are injected so the connectivity timings can be tested without
//! sleeping: [`FixedTime`] advances itself when asked to delay.

/// Timestamp in milliseconds since epoch (or device boot for monotonic)
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs monotonic)
    fn is_wall_clock(&self) -> bool;
}

/// Blocking delay provider
pub trait Delay {
    /// Block the control thread for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Milliseconds from `earlier` to `later`, zero if the clock went backwards
pub fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

#[cfg(feature = "std")]
impl Delay for SystemTime {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// Fixed time source for testing and simulation
///
/// Delays advance the clock instead of blocking, so a test can step through
/// minutes of connectivity behaviour instantly.
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
    wall_clock: bool,
}

impl FixedTime {
    /// Monotonic clock starting at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp, wall_clock: false }
    }

    /// Wall clock starting at `timestamp` (ms since the Unix epoch)
    pub fn wall_clock(timestamp: Timestamp) -> Self {
        Self { timestamp, wall_clock: true }
    }

    /// Jump to an absolute time
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        self.wall_clock
    }
}

impl Delay for FixedTime {
    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn delay_advances_fixed_time() {
        let mut time = FixedTime::new(0);
        time.delay_ms(5_000);
        assert_eq!(time.now(), 5_000);
    }

    #[test]
    fn elapsed_saturates_on_backwards_clock() {
        assert_eq!(elapsed_ms(2000, 1500), 0);
        assert_eq!(elapsed_ms(1500, 2000), 500);
    }
}
