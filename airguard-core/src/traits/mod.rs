//! External Collaborator Traits
//!
//! The core never talks to hardware or sockets directly. Everything outside
//! the node's own logic sits behind one of these traits:
//!
//! - [`transport`] - the serial line the sensor reports on
//! - [`network`] - the wireless link and the message broker session
//! - [`storage`] - the local append-only store used while offline
//!
//! Every trait carries an associated `Error` that only needs to be
//! `Debug`: the node never inspects a collaborator's error, it logs it and
//! carries on.
//!
//! Time is abstracted in [`crate::time`] ([`TimeSource`], [`Delay`]).

pub mod network;
pub mod storage;
pub mod transport;

pub use network::{BrokerClient, WirelessLink};
pub use storage::{NoStorage, OfflineSink};
pub use transport::SerialTransport;

pub use crate::time::{Delay, TimeSource};
