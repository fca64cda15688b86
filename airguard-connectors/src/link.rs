//! Network link backed by the host's own networking
//!
//! A host joins its wireless network outside the process, so "connecting"
//! only re-enables the link here and "connected" means the routing table
//! has a route to the broker (a UDP `connect`, which sends nothing).
//! Dropping the link disables it until the next connect request, which is
//! what the connectivity state machine expects after a forced drop.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use airguard_core::traits::WirelessLink;

use crate::ConnectorError;

/// [`WirelessLink`] for a host that manages its own network
#[derive(Debug)]
pub struct HostLink {
    probe: String,
    active: bool,
    enabled: bool,
}

impl HostLink {
    /// Link judged by reachability of `host:port`
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            probe: format!("{}:{}", host, port),
            active: false,
            enabled: false,
        }
    }

    fn route_exists(&self) -> bool {
        let Some(target) = self.probe.to_socket_addrs().ok().and_then(|mut a| a.next()) else {
            return false;
        };
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        UdpSocket::bind(local)
            .and_then(|socket| socket.connect(target))
            .is_ok()
    }
}

impl WirelessLink for HostLink {
    type Error = ConnectorError;

    fn activate(&mut self, active: bool) -> Result<(), Self::Error> {
        self.active = active;
        if !active {
            self.enabled = false;
        }
        Ok(())
    }

    fn connect(&mut self, ssid: &str, _password: &str) -> Result<(), Self::Error> {
        if !self.active {
            return Err(ConnectorError::NotConnected);
        }
        log::debug!("Network {:?} is managed by the host", ssid);
        self.enabled = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.enabled && self.route_exists()
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.enabled = false;
        Ok(())
    }
}
