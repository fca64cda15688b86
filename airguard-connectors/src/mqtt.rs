//! MQTT connector for AirGuard
//!
//! Blocking broker session on top of the `rumqttc` synchronous client. The
//! node's loop is single-threaded, so instead of a background thread the
//! connector drives the `rumqttc` event loop itself, just long enough to
//! see each request leave:
//!
//! - `connect` waits for the broker's CONNACK
//! - `publish` waits until the PUBLISH is written to the socket
//! - `ping` runs the event loop briefly; `rumqttc` sends PINGREQ whenever
//!   the keep-alive interval has passed, and a dead socket surfaces as an
//!   error here
//!
//! Any connection error ends the session; the state machine in
//! `airguard-core` decides when to build a new one.

use std::time::{Duration, Instant};

use airguard_core::config::BrokerConfig;
use airguard_core::traits::BrokerClient;
use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet, QoS,
    RecvTimeoutError,
};

use crate::ConnectorError;

/// Requests buffered between the client handle and its event loop
const REQUEST_CAPACITY: usize = 10;

/// MQTT session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
    /// Longest wait for CONNACK or for a publish to go out
    pub response_timeout: Duration,
    /// How long a ping drives the event loop
    pub ping_window: Duration,
}

impl MqttConfig {
    pub fn new(client_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            client_id: client_id.into(),
            host: host.into(),
            port,
            username: None,
            password: None,
            keep_alive: Duration::from_secs(60),
            response_timeout: Duration::from_secs(5),
            ping_window: Duration::from_millis(200),
        }
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or_default());
        }
        options
    }
}

impl From<&BrokerConfig> for MqttConfig {
    fn from(broker: &BrokerConfig) -> Self {
        let mut config = Self::new(&broker.client_id, &broker.host, broker.port);
        config.username = broker.username.clone();
        config.password = broker.password.clone();
        config.keep_alive = Duration::from_secs(u64::from(broker.keep_alive_secs));
        config
    }
}

/// Broker session driven from the caller's thread
pub struct MqttConnector {
    config: MqttConfig,
    session: Option<(Client, Connection)>,
}

impl MqttConnector {
    pub fn new(config: MqttConfig) -> Self {
        Self { config, session: None }
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    /// Run the event loop until `done` accepts an event
    ///
    /// With `until_quiet`, running out of time is success rather than a
    /// timeout. A connection error drops the session.
    fn pump(
        &mut self,
        what: &'static str,
        window: Duration,
        until_quiet: bool,
        mut done: impl FnMut(&Event) -> bool,
    ) -> Result<(), ConnectorError> {
        let Some((_, connection)) = self.session.as_mut() else {
            return Err(ConnectorError::NotConnected);
        };

        let deadline = Instant::now() + window;
        let result = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match connection.recv_timeout(remaining) {
                Ok(Ok(event)) if done(&event) => break Ok(()),
                Ok(Ok(event)) => log::trace!("MQTT event {:?}", event),
                Ok(Err(e)) => break Err(ConnectorError::ProtocolError(e.to_string())),
                Err(RecvTimeoutError::Timeout) if until_quiet => break Ok(()),
                Err(RecvTimeoutError::Timeout) => break Err(ConnectorError::Timeout(what)),
                Err(RecvTimeoutError::Disconnected) => break Err(ConnectorError::NotConnected),
            }
        };

        if result.is_err() {
            self.session = None;
        }
        result
    }
}

impl BrokerClient for MqttConnector {
    type Error = ConnectorError;

    fn connect(&mut self) -> Result<(), Self::Error> {
        let (client, connection) = Client::new(self.config.options(), REQUEST_CAPACITY);
        self.session = Some((client, connection));

        let mut refused = None;
        self.pump("CONNACK", self.config.response_timeout, false, |event| match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code != ConnectReturnCode::Success {
                    refused = Some(ack.code);
                }
                true
            }
            _ => false,
        })?;

        match refused {
            Some(code) => {
                self.session = None;
                Err(ConnectorError::ProtocolError(format!("connection refused: {:?}", code)))
            }
            None => Ok(()),
        }
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        let Some((client, _)) = self.session.as_mut() else {
            return Ok(());
        };
        let sent = client.disconnect();

        // Flush the DISCONNECT; the session ends either way
        if sent.is_ok() {
            let _ = self.pump("DISCONNECT", self.config.response_timeout, true, |event| {
                matches!(event, Event::Outgoing(Outgoing::Disconnect))
            });
        }
        self.session = None;
        sent.map_err(|e| ConnectorError::ProtocolError(e.to_string()))
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        let Some((client, _)) = self.session.as_mut() else {
            return Err(ConnectorError::NotConnected);
        };
        client
            .publish(topic, QoS::AtMostOnce, retain, payload.to_vec())
            .map_err(|e| ConnectorError::ProtocolError(e.to_string()))?;

        self.pump("PUBLISH", self.config.response_timeout, false, |event| {
            matches!(event, Event::Outgoing(Outgoing::Publish(_)))
        })
    }

    fn ping(&mut self) -> Result<(), Self::Error> {
        self.pump("PINGRESP", self.config.ping_window, true, |event| {
            matches!(event, Event::Incoming(Packet::PingResp))
        })
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_broker_settings() {
        let mut broker = BrokerConfig::new("10.0.0.2", "airguard-1", "home/attic/pm");
        broker.username = Some("node".to_string());
        broker.keep_alive_secs = 30;

        let config = MqttConfig::from(&broker);

        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id, "airguard-1");
        assert_eq!(config.username.as_deref(), Some("node"));
        assert_eq!(config.keep_alive, Duration::from_secs(30));
    }

    #[test]
    fn requests_without_session_fail() {
        let mut mqtt = MqttConnector::new(MqttConfig::new("id", "localhost", 1883));

        assert!(!mqtt.is_connected());
        assert!(matches!(
            mqtt.publish("t", b"1.00", true),
            Err(ConnectorError::NotConnected)
        ));
        assert!(matches!(mqtt.ping(), Err(ConnectorError::NotConnected)));
        assert!(mqtt.disconnect().is_ok());
    }

    #[test]
    fn unreachable_broker_fails_connect() {
        // port 1 on localhost refuses connections
        let mut config = MqttConfig::new("id", "127.0.0.1", 1);
        config.response_timeout = Duration::from_secs(2);
        let mut mqtt = MqttConnector::new(config);

        assert!(mqtt.connect().is_err());
        assert!(!mqtt.is_connected());
    }
}
