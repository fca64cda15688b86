//! Offline Storage Trait

use core::fmt;

use crate::time::Timestamp;

/// Append-only local store for readings taken while the link is down
///
/// Nothing written here is replayed by the node.
pub trait OfflineSink {
    /// Storage failure
    type Error: fmt::Debug;

    /// Append one reading taken at `at` (wall-clock ms since the Unix epoch)
    fn append(&mut self, at: Timestamp, metric: &str, value: f32) -> Result<(), Self::Error>;
}

/// Placeholder for nodes without local storage
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStorage;

impl OfflineSink for NoStorage {
    type Error = core::convert::Infallible;

    fn append(&mut self, _at: Timestamp, _metric: &str, _value: f32) -> Result<(), Self::Error> {
        Ok(())
    }
}
