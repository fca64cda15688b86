//! Core engine for AirGuard particulate sensor nodes
//!
//! Turns the raw serial output of a low-cost particulate sensor into one
//! trustworthy reading per cycle and keeps it flowing to a message broker
//! over an unreliable wireless link.
//!
//! Key constraints:
//! - Single control thread, blocking I/O
//! - No heap allocation in the per-cycle path (`heapless` buffers)
//! - Every collaborator (serial, radio, broker, clock, log, storage) is a trait
//!
//! ```rust
//! use airguard_core::frame::{decode, Frame};
//! use airguard_core::pipeline::{ConditioningPipeline, Reading};
//! use airguard_core::smoothing::{Adjustment, Smoothing};
//!
//! let mut bytes = [0u8; 60];
//! for (chunk, value) in bytes.chunks_exact_mut(20).zip([100, 110, 120]) {
//!     chunk.copy_from_slice(&Frame::encode(value));
//! }
//!
//! let batch = decode(&bytes);
//! let mut pipeline = ConditioningPipeline::new(Adjustment::IDENTITY, Smoothing::Disabled);
//! assert_eq!(pipeline.process(&batch.values), Reading::Value(110.0));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod acquisition;
pub mod aggregator;
pub mod buffer;
pub mod config;
pub mod connectivity;
pub mod constants;
pub mod errors;
pub mod frame;
pub mod logging;
pub mod node;
#[cfg(feature = "offline")]
pub mod offline;
pub mod pipeline;
pub mod smoothing;
pub mod time;
pub mod traits;

// Public API
pub use aggregator::{HistoryAggregator, Window};
pub use config::NodeConfig;
pub use connectivity::{ConnectionState, ConnectivityManager, PublishOutcome};
pub use errors::{ConditioningError, ConditioningResult, ConfigError, CycleError, FrameError};
pub use logging::{LogSink, Severity};
pub use node::{CycleReport, SensorNode};
pub use pipeline::{ConditioningPipeline, Reading};
pub use traits::{BrokerClient, OfflineSink, SerialTransport, WirelessLink};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
