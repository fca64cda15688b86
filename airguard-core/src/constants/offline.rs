//! Offline Buffer Rotation
//!
//! Readings taken while the link is down are written to per-hour files
//! named `off_<sequence>_<hour>.log`. The sequence number advances once per
//! start, so the files of the last few runs survive a reboot.

/// Number of rotation sequences before a sequence number is reused.
pub const ROTATION_SEQUENCES: u8 = 10;

/// Hours per day; one file per hour per sequence.
pub const HOURS_PER_DAY: u8 = 24;

/// Name of the persisted rotation counter.
pub const SEQUENCE_FILE: &str = "offline.dat";

/// Prefix of every offline log file.
pub const LOG_FILE_PREFIX: &str = "off_";

/// Suffix of every offline log file.
pub const LOG_FILE_SUFFIX: &str = ".log";
