//! Scripted collaborators for integration tests
//!
//! Each mock records what the node asked of it and answers from a small
//! script, so a test can replay a flaky radio or a dead broker
//! deterministically against a [`FixedTime`] clock.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use airguard_core::config::{BrokerConfig, NodeConfig, SmoothingConfig, WifiConfig};
use airguard_core::frame::Frame;
use airguard_core::traits::{BrokerClient, SerialTransport, WirelessLink};

pub use airguard_core::time::FixedTime;

/// 2024-03-01T07:05:09Z
pub const MORNING: u64 = 1_709_276_709_000;

/// Topic used by [`sample_config`]
pub const TOPIC: &str = "home/attic/pm";

/// Valid configuration with pass-through smoothing
pub fn sample_config() -> NodeConfig {
    let mut config = NodeConfig::new(
        WifiConfig {
            ssid: "attic".to_string(),
            password: "hunter2".to_string(),
        },
        BrokerConfig::new("10.0.0.2", "airguard-test", TOPIC),
    );
    config.conditioning.smoothing = SmoothingConfig::Exponential { alpha: 0.0 };
    config
}

/// Concatenated valid frames carrying `values`
pub fn frames(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|&v| Frame::encode(v)).collect()
}

/// Serial line that replays a script; an exhausted script times out
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub script: VecDeque<nb::Result<Vec<u8>, &'static str>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// One burst carrying `values`
    pub fn burst(mut self, values: &[u16]) -> Self {
        self.script.push_back(Ok(frames(values)));
        self
    }

    /// One read that times out empty
    pub fn silence(mut self) -> Self {
        self.script.push_back(Err(nb::Error::WouldBlock));
        self
    }

    pub fn push_burst(&mut self, values: &[u16]) {
        self.script.push_back(Ok(frames(values)));
    }
}

impl SerialTransport for ScriptedTransport {
    type Error = &'static str;

    fn read(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
        let bytes = self.script.pop_front().unwrap_or(Err(nb::Error::WouldBlock))?;
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        Ok(len)
    }
}

/// Wireless link that associates after a number of status polls
#[derive(Debug)]
pub struct MockLink {
    /// Polls after a connect request before the link reports up; `None` never
    pub polls_to_associate: Option<u32>,
    pub fail_connect: bool,
    pub connected: Cell<bool>,
    pending: Option<Cell<u32>>,
    pub activations: u32,
    pub connect_calls: u32,
    pub disconnects: u32,
}

impl MockLink {
    pub fn associating_after(polls: u32) -> Self {
        Self {
            polls_to_associate: Some(polls),
            fail_connect: false,
            connected: Cell::new(false),
            pending: None,
            activations: 0,
            connect_calls: 0,
            disconnects: 0,
        }
    }

    pub fn never_associating() -> Self {
        Self {
            polls_to_associate: None,
            ..Self::associating_after(0)
        }
    }

    /// Simulate the access point going away
    pub fn drop_link(&mut self) {
        self.connected.set(false);
        self.pending = None;
    }
}

impl WirelessLink for MockLink {
    type Error = &'static str;

    fn activate(&mut self, active: bool) -> Result<(), Self::Error> {
        if active {
            self.activations += 1;
        }
        Ok(())
    }

    fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), Self::Error> {
        self.connect_calls += 1;
        if self.fail_connect {
            return Err("radio busy");
        }
        if let Some(polls) = self.polls_to_associate {
            self.pending = Some(Cell::new(polls));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if let Some(remaining) = &self.pending {
            if remaining.get() <= 1 {
                self.connected.set(true);
            } else {
                remaining.set(remaining.get() - 1);
            }
        }
        self.connected.get()
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.disconnects += 1;
        self.drop_link();
        Ok(())
    }
}

/// Broker that records every publish
#[derive(Debug, Default)]
pub struct MockBroker {
    pub connected: bool,
    pub fail_connect: bool,
    pub fail_publish: bool,
    pub fail_ping: bool,
    pub connect_calls: u32,
    pub disconnects: u32,
    pub pings: u32,
    /// (topic, payload, retain)
    pub published: Vec<(String, String, bool)>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<&str> {
        self.published.iter().map(|(_, p, _)| p.as_str()).collect()
    }
}

impl BrokerClient for MockBroker {
    type Error = &'static str;

    fn connect(&mut self) -> Result<(), Self::Error> {
        self.connect_calls += 1;
        if self.fail_connect {
            return Err("connection refused");
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.disconnects += 1;
        self.connected = false;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        if self.fail_publish {
            return Err("broken pipe");
        }
        self.published.push((
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
            retain,
        ));
        Ok(())
    }

    fn ping(&mut self) -> Result<(), Self::Error> {
        if self.fail_ping {
            return Err("broken pipe");
        }
        self.pings += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
