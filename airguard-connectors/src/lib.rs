//! Host-Side Connectors for AirGuard Nodes
//!
//! ## Overview
//!
//! `airguard-core` talks to the outside world only through traits. This
//! crate implements them for a node running on an ordinary host (a Raspberry
//! Pi with a USB serial adapter, or a laptop during bring-up):
//!
//! | Core trait        | Connector                 | Backed by                 |
//! |-------------------|---------------------------|---------------------------|
//! | `BrokerClient`    | [`mqtt::MqttConnector`]   | `rumqttc` sync client     |
//! | `LogSink`         | [`syslog::SyslogSink`]    | RFC 5424 over UDP         |
//! | `SerialTransport` | [`serial::ReaderTransport`] | any `std::io::Read`     |
//! | `WirelessLink`    | [`link::HostLink`]        | the host's routing table  |
//!
//! ## MQTT
//!
//! Every publish is QoS 0 with the retain flag set, so a dashboard that
//! subscribes late still sees the last reading. The session is clean: the
//! node has nothing to resume after a reconnect.
//!
//! ## Syslog
//!
//! The remote log is best effort. A dropped datagram is not worth blocking
//! the sensor loop for; the sink recreates its socket after a send failure
//! and never reports an error to the caller.
//!
//! ## Example Usage
//!
//! ```no_run
//! use airguard_connectors::mqtt::{MqttConfig, MqttConnector};
//! use airguard_core::traits::BrokerClient;
//!
//! let config = MqttConfig::new("airguard-1", "broker.local", 1883);
//! let mut mqtt = MqttConnector::new(config);
//! mqtt.connect()?;
//! mqtt.publish("home/attic/pm", b"23.40", true)?;
//! # Ok::<(), airguard_connectors::ConnectorError>(())
//! ```

pub mod link;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod serial;
pub mod syslog;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttConnector};
pub use link::HostLink;
pub use serial::ReaderTransport;
pub use syslog::SyslogSink;

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
