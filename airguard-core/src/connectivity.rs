//! Connectivity Resilience State Machine
//!
//! ## Overview
//!
//! The node keeps two things alive: a wireless *link* and a broker
//! *session* over it. Both fail in ways that are not reported promptly: an
//! access point can keep the association while routing is gone, a broker
//! can keep the TCP socket while the session is dead. The manager therefore
//! judges health by results, not by status flags: the time since the last
//! successful publish or ping.
//!
//! ```text
//!             connect ok + settle            session connect ok
//! LinkDown ─► LinkConnecting ─────► LinkUpSessionDown ─────────► LinkUpSessionUp
//!    ▲              │  polls exhausted        ▲    │                   │
//!    │              └──────────────► LinkDown │    │ > 200 s           │ > 100 s without
//!    │                                        │    │ without success   │ success
//!    └────────────────────────────────────────┼────┘                   │
//!                                             └────────────────────────┘
//! ```
//!
//! ## Link Backoff
//!
//! Each outer-loop iteration that finds the link down spends a poll budget
//! of 1 to 5 one-second polls waiting for association. The budget grows by
//! one after each failed iteration and wraps from 5 back to 1; a connect
//! request is (re)issued whenever the budget is back at 1, otherwise the
//! pending association is given more time.
//!
//! ## Failure Handling
//!
//! No collaborator error escapes. Each is logged and the machine stays in
//! (or falls back one step from) its current state; the next outer-loop
//! iteration tries again.

use alloc::string::String;
use core::fmt::Write;

use heapless::String as InlineString;

use crate::constants::conditioning::{PAYLOAD_CAPACITY, PAYLOAD_DECIMALS};
use crate::constants::connectivity::{
    LINK_POLL_INTERVAL_MS, LINK_SETTLE_DELAY_MS, LINK_STALE_AFTER_MS, MAX_LINK_POLL_BUDGET,
    SESSION_STALE_AFTER_MS,
};
use crate::constants::time::MS_PER_SECOND;
use crate::logging::LogSink;
use crate::time::{elapsed_ms, Delay, TimeSource, Timestamp};
use crate::traits::{BrokerClient, WirelessLink};

/// Published payload text
pub type Payload = InlineString<PAYLOAD_CAPACITY>;

/// Link and session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No link; nothing can be sent
    LinkDown,
    /// Waiting for the link to associate
    LinkConnecting,
    /// Link usable, no broker session
    LinkUpSessionDown,
    /// Link and broker session both up
    LinkUpSessionUp,
}

impl ConnectionState {
    /// Whether the wireless link is believed usable
    pub fn link_up(self) -> bool {
        matches!(self, Self::LinkUpSessionDown | Self::LinkUpSessionUp)
    }

    /// Whether a broker session is believed open
    pub fn session_up(self) -> bool {
        self == Self::LinkUpSessionUp
    }
}

/// Result of one publish-or-ping step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The reading was published
    Published,
    /// No reading; a ping succeeded
    Pinged,
    /// The publish or ping failed; state is unchanged
    Failed,
    /// No session, nothing attempted
    NotConnected,
}

/// Credentials and timings for the connectivity manager
#[derive(Debug, Clone)]
pub struct ConnectivityConfig {
    /// Network name
    pub ssid: String,
    /// Network passphrase
    pub password: String,
    /// Drop the session after this long without a successful publish/ping
    pub session_stale_after_ms: u64,
    /// Drop the link after this long without a successful publish/ping
    pub link_stale_after_ms: u64,
    /// Pause between link status polls
    pub poll_interval_ms: u32,
    /// Pause after the link comes up, before the first session attempt
    pub settle_delay_ms: u32,
    /// Largest poll budget before wrapping back to 1
    pub max_poll_budget: u8,
}

impl ConnectivityConfig {
    /// Default timings for the given network
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
            session_stale_after_ms: SESSION_STALE_AFTER_MS,
            link_stale_after_ms: LINK_STALE_AFTER_MS,
            poll_interval_ms: LINK_POLL_INTERVAL_MS,
            settle_delay_ms: LINK_SETTLE_DELAY_MS,
            max_poll_budget: MAX_LINK_POLL_BUDGET,
        }
    }
}

/// Format a reading as the fixed two-decimal payload, e.g. `"23.40"`
pub fn format_payload(value: f32) -> Option<Payload> {
    let mut payload = Payload::new();
    write!(payload, "{:.*}", PAYLOAD_DECIMALS, value).ok()?;
    Some(payload)
}

/// Owns the link/session state machine
#[derive(Debug, Clone)]
pub struct ConnectivityManager {
    config: ConnectivityConfig,
    state: ConnectionState,
    last_success: Timestamp,
    poll_budget: u8,
}

impl ConnectivityManager {
    /// Manager starting with the link down; staleness is measured from `now`
    pub fn new(config: ConnectivityConfig, now: Timestamp) -> Self {
        Self {
            config,
            state: ConnectionState::LinkDown,
            last_success: now,
            poll_budget: 1,
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Time of the last successful publish or ping (or reset point)
    pub fn last_success(&self) -> Timestamp {
        self.last_success
    }

    /// Polls granted to the next link connect attempt
    pub fn poll_budget(&self) -> u8 {
        self.poll_budget
    }

    /// Active configuration
    pub fn config(&self) -> &ConnectivityConfig {
        &self.config
    }

    /// Run one outer-loop iteration of the state machine
    ///
    /// In order: reconcile with what the link and broker report, enforce
    /// staleness limits, bring the link up if it is down, then open a
    /// session if there is none. A staleness drop ends the iteration so the
    /// dropped state is visible for a full cycle before the next attempt.
    pub fn advance<W, B, C, L>(
        &mut self,
        link: &mut W,
        broker: &mut B,
        clock: &mut C,
        log: &mut L,
    ) -> ConnectionState
    where
        W: WirelessLink,
        B: BrokerClient,
        C: TimeSource + Delay,
        L: LogSink,
    {
        self.reconcile(link, broker, log);

        if self.enforce_staleness(clock.now(), link, broker, log) {
            return self.state;
        }

        if link.is_connected() {
            log.debug(format_args!("Already connected to network"));
        } else {
            self.connect_link(link, clock, log);
        }

        match self.state {
            ConnectionState::LinkUpSessionDown => self.connect_session(link, broker, log),
            ConnectionState::LinkUpSessionUp => log.debug(format_args!("Already connected to broker")),
            ConnectionState::LinkDown | ConnectionState::LinkConnecting => {
                log.warning(format_args!("Ignoring broker while not connected to network"));
            }
        }

        self.state
    }

    /// Publish the reading, or ping when there is none
    ///
    /// Success refreshes the staleness clock. Failure is logged and leaves
    /// the state alone; staleness handling decides when to give up on the
    /// session.
    pub fn publish_or_ping<B, C, L>(
        &mut self,
        topic: &str,
        reading: Option<f32>,
        broker: &mut B,
        clock: &C,
        log: &mut L,
    ) -> PublishOutcome
    where
        B: BrokerClient,
        C: TimeSource,
        L: LogSink,
    {
        if !self.state.session_up() {
            return PublishOutcome::NotConnected;
        }

        let outcome = match reading {
            Some(value) => {
                let Some(payload) = format_payload(value) else {
                    log.error(format_args!("Reading {} does not fit a payload", value));
                    return PublishOutcome::Failed;
                };
                log.info(format_args!("Publishing {} to {:?}", payload, topic));
                match broker.publish(topic, payload.as_bytes(), true) {
                    Ok(()) => PublishOutcome::Published,
                    Err(e) => {
                        log.critical(format_args!("Exception {:?} while publishing to {:?}", e, topic));
                        PublishOutcome::Failed
                    }
                }
            }
            None => {
                log.info(format_args!("Pinging broker"));
                match broker.ping() {
                    Ok(()) => PublishOutcome::Pinged,
                    Err(e) => {
                        log.critical(format_args!("Exception {:?} while pinging broker", e));
                        PublishOutcome::Failed
                    }
                }
            }
        };

        if outcome != PublishOutcome::Failed {
            self.last_success = clock.now();
        }
        outcome
    }

    /// Bring the believed state in line with what the collaborators report
    fn reconcile<W, B, L>(&mut self, link: &W, broker: &mut B, log: &mut L)
    where
        W: WirelessLink,
        B: BrokerClient,
        L: LogSink,
    {
        let link_up = link.is_connected();
        match self.state {
            state if state.link_up() && !link_up => {
                log.warning(format_args!("Network connection lost"));
                if broker.is_connected() {
                    if let Err(e) = broker.disconnect() {
                        log.debug(format_args!("Broker disconnect after link loss: {:?}", e));
                    }
                }
                self.state = ConnectionState::LinkDown;
            }
            ConnectionState::LinkUpSessionUp if !broker.is_connected() => {
                log.warning(format_args!("Broker session lost"));
                self.state = ConnectionState::LinkUpSessionDown;
            }
            ConnectionState::LinkDown | ConnectionState::LinkConnecting if link_up => {
                self.state = ConnectionState::LinkUpSessionDown;
            }
            _ => {}
        }
    }

    /// Drop the session or link if nothing has succeeded for too long
    ///
    /// Returns whether anything was dropped.
    fn enforce_staleness<W, B, L>(
        &mut self,
        now: Timestamp,
        link: &mut W,
        broker: &mut B,
        log: &mut L,
    ) -> bool
    where
        W: WirelessLink,
        B: BrokerClient,
        L: LogSink,
    {
        if !self.state.link_up() {
            return false;
        }

        let idle = elapsed_ms(self.last_success, now);

        if idle > self.config.link_stale_after_ms {
            log.error(format_args!(
                "No broker success for {}s, dropping network",
                idle / MS_PER_SECOND
            ));
            if let Err(e) = broker.disconnect() {
                log.debug(format_args!("Broker disconnect failed: {:?}", e));
            }
            if let Err(e) = link.disconnect() {
                log.warning(format_args!("Exception {:?} while disconnecting network", e));
            }
            self.state = ConnectionState::LinkDown;
            // Fresh grace period, otherwise the drop repeats every cycle
            self.last_success = now;
            return true;
        }

        if self.state.session_up() && idle > self.config.session_stale_after_ms {
            log.warning(format_args!(
                "No broker success for {}s, dropping session",
                idle / MS_PER_SECOND
            ));
            if let Err(e) = broker.disconnect() {
                log.debug(format_args!("Broker disconnect failed: {:?}", e));
            }
            self.state = ConnectionState::LinkUpSessionDown;
            return true;
        }

        false
    }

    fn connect_link<W, C, L>(&mut self, link: &mut W, clock: &mut C, log: &mut L)
    where
        W: WirelessLink,
        C: TimeSource + Delay,
        L: LogSink,
    {
        self.state = ConnectionState::LinkConnecting;

        if self.poll_budget == 1 {
            log.info(format_args!("Connecting to network {:?}", self.config.ssid));
            let requested = link
                .activate(true)
                .and_then(|()| link.connect(&self.config.ssid, &self.config.password));
            if let Err(e) = requested {
                log.critical(format_args!("Exception {:?} while connecting to network", e));
                self.state = ConnectionState::LinkDown;
                self.grow_poll_budget();
                return;
            }
        }

        for _ in 0..self.poll_budget {
            clock.delay_ms(self.config.poll_interval_ms);
            if link.is_connected() {
                log.info(format_args!("Connected to network {:?}", self.config.ssid));
                clock.delay_ms(self.config.settle_delay_ms);
                self.state = ConnectionState::LinkUpSessionDown;
                self.poll_budget = 1;
                self.last_success = clock.now();
                return;
            }
        }

        log.warning(format_args!(
            "Network not connected after {} polls",
            self.poll_budget
        ));
        self.state = ConnectionState::LinkDown;
        self.grow_poll_budget();
    }

    fn grow_poll_budget(&mut self) {
        self.poll_budget = (self.poll_budget % self.config.max_poll_budget.max(1)) + 1;
    }

    fn connect_session<W, B, L>(&mut self, link: &W, broker: &mut B, log: &mut L)
    where
        W: WirelessLink,
        B: BrokerClient,
        L: LogSink,
    {
        if !link.is_connected() {
            log.warning(format_args!("Ignoring broker while not connected to network"));
            return;
        }

        log.info(format_args!("Connecting to broker"));
        match broker.connect() {
            Ok(()) => {
                log.info(format_args!("Connected to broker"));
                self.state = ConnectionState::LinkUpSessionUp;
            }
            Err(e) => {
                log.critical(format_args!("Exception {:?} while connecting to broker", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_two_decimals() {
        assert_eq!(format_payload(23.4).unwrap().as_str(), "23.40");
        assert_eq!(format_payload(110.0).unwrap().as_str(), "110.00");
        assert_eq!(format_payload(0.006).unwrap().as_str(), "0.01");
        assert_eq!(format_payload(0.0).unwrap().as_str(), "0.00");
    }

    #[test]
    fn payload_fits_largest_reading() {
        assert!(format_payload(f32::MAX).is_some());
    }

    #[test]
    fn poll_budget_wraps_after_max() {
        let mut manager = ConnectivityManager::new(ConnectivityConfig::new("net", "pw"), 0);
        let mut budgets = [0u8; 6];
        for budget in budgets.iter_mut() {
            manager.grow_poll_budget();
            *budget = manager.poll_budget();
        }
        assert_eq!(budgets, [2, 3, 4, 5, 1, 2]);
    }

    #[test]
    fn state_predicates() {
        assert!(!ConnectionState::LinkConnecting.link_up());
        assert!(ConnectionState::LinkUpSessionDown.link_up());
        assert!(!ConnectionState::LinkUpSessionDown.session_up());
        assert!(ConnectionState::LinkUpSessionUp.session_up());
    }
}
