//! Network Link and Broker Session Traits
//!
//! The node distinguishes the *link* (association with the wireless access
//! point) from the *session* (an authenticated connection to the message
//! broker carried over the link). Either can be lost without the other
//! noticing immediately, which is why the connectivity manager tracks them
//! separately.
//!
//! All calls are blocking. The core enforces no timeout of its own; an
//! unresponsive broker stalls a cycle for as long as the client's own
//! timeout allows.

use core::fmt;

/// Wireless network interface
pub trait WirelessLink {
    /// Interface failure
    type Error: fmt::Debug;

    /// Power the interface up or down
    fn activate(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Start associating with `ssid`; completion is observed through
    /// [`is_connected`](Self::is_connected)
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Whether the link is associated and usable
    fn is_connected(&self) -> bool;

    /// Drop the association
    fn disconnect(&mut self) -> Result<(), Self::Error>;
}

/// Message broker client
///
/// Publishes are at-most-once: the node never queues a reading for retry.
pub trait BrokerClient {
    /// Client failure
    type Error: fmt::Debug;

    /// Open a session
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Close the session
    fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Publish `payload` to `topic`
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Liveness round-trip when there is nothing to publish
    fn ping(&mut self) -> Result<(), Self::Error>;

    /// Whether the client believes its session is open
    fn is_connected(&self) -> bool;
}

impl<L: WirelessLink + ?Sized> WirelessLink for &mut L {
    type Error = L::Error;

    fn activate(&mut self, active: bool) -> Result<(), Self::Error> {
        (**self).activate(active)
    }

    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        (**self).connect(ssid, password)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        (**self).disconnect()
    }
}

impl<B: BrokerClient + ?Sized> BrokerClient for &mut B {
    type Error = B::Error;

    fn connect(&mut self) -> Result<(), Self::Error> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        (**self).disconnect()
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        (**self).publish(topic, payload, retain)
    }

    fn ping(&mut self) -> Result<(), Self::Error> {
        (**self).ping()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
