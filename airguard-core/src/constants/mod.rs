//! Constants for AirGuard Core
//!
//! Centralised numeric values used throughout the node. Every threshold or
//! timing used by the decoder, the conditioning pipeline and the connectivity
//! loop is defined here with its unit in the name.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Frame**: Sensor wire protocol layout
//! - **Conditioning**: Outlier rejection and history sizes
//! - **Connectivity**: Link/session timings and staleness limits
//! - **Offline**: Local log rotation
//! - **Time**: Unit conversions

/// Sensor frame layout (magic, length, value offset).
pub mod frame;

/// Conditioning pipeline thresholds and history capacities.
pub mod conditioning;

/// Link and session timings for the connectivity state machine.
pub mod connectivity;

/// Offline buffer rotation and file naming.
pub mod offline;

/// Time unit conversions.
pub mod time;

pub use frame::{FRAME_LEN, FRAME_MAGIC, MAX_BATCH_FRAMES};

pub use conditioning::{
    HISTORY_CAPACITY, MAX_RETAINED_VALUES, MIN_USABLE_VALUES, VOLATILITY_THRESHOLD,
};

pub use connectivity::{
    LINK_STALE_AFTER_MS, SESSION_STALE_AFTER_MS, LINK_SETTLE_DELAY_MS, MAX_LINK_POLL_BUDGET,
};

pub use time::MS_PER_SECOND;
