//! Integration tests for the link/session state machine
//!
//! Drives [`ConnectivityManager`] against scripted radios and brokers on a
//! fixed clock, so minutes of reconnect behaviour run instantly.

#![cfg(test)]

mod common;

use airguard_core::connectivity::{ConnectivityConfig, PublishOutcome};
use airguard_core::logging::MemorySink;
use airguard_core::time::TimeSource;
use airguard_core::{ConnectionState, ConnectivityManager, Severity};

use common::{FixedTime, MockBroker, MockLink, TOPIC};

struct Harness {
    manager: ConnectivityManager,
    link: MockLink,
    broker: MockBroker,
    clock: FixedTime,
    log: MemorySink,
}

impl Harness {
    fn new(link: MockLink) -> Self {
        Self {
            manager: ConnectivityManager::new(ConnectivityConfig::new("attic", "hunter2"), 0),
            link,
            broker: MockBroker::new(),
            clock: FixedTime::new(0),
            log: MemorySink::new(),
        }
    }

    fn advance(&mut self) -> ConnectionState {
        self.manager
            .advance(&mut self.link, &mut self.broker, &mut self.clock, &mut self.log)
    }

    fn publish(&mut self, value: Option<f32>) -> PublishOutcome {
        self.manager
            .publish_or_ping(TOPIC, value, &mut self.broker, &self.clock, &mut self.log)
    }

    fn connected() -> Self {
        let mut harness = Self::new(MockLink::associating_after(1));
        assert_eq!(harness.advance(), ConnectionState::LinkUpSessionUp);
        harness
    }
}

#[test]
fn test_first_advance_brings_everything_up() {
    let mut h = Harness::new(MockLink::associating_after(1));

    assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);

    assert_eq!(h.link.activations, 1);
    assert_eq!(h.link.connect_calls, 1);
    assert_eq!(h.broker.connect_calls, 1);
    // one 1 s poll then the 5 s settle delay
    assert_eq!(h.clock.now(), 6_000);
    assert_eq!(h.manager.last_success(), 6_000);
}

#[test]
fn test_poll_budget_grows_and_wraps() {
    let mut h = Harness::new(MockLink::never_associating());

    let mut budgets = Vec::new();
    for _ in 0..6 {
        budgets.push(h.manager.poll_budget());
        assert_eq!(h.advance(), ConnectionState::LinkDown);
    }

    assert_eq!(budgets, vec![1, 2, 3, 4, 5, 1]);
    // connect is only reissued when the budget is back at 1
    assert_eq!(h.link.connect_calls, 2);
    // 1 + 2 + 3 + 4 + 5 + 1 polls of one second each
    assert_eq!(h.clock.now(), 16_000);
    assert_eq!(h.broker.connect_calls, 0);
    assert!(h.log.contains(Severity::Warning, "Ignoring broker"));
}

#[test]
fn test_slow_association_is_picked_up_next_cycle() {
    let mut h = Harness::new(MockLink::associating_after(2));

    assert_eq!(h.advance(), ConnectionState::LinkDown);
    assert_eq!(h.manager.poll_budget(), 2);

    assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);
    assert_eq!(h.link.connect_calls, 1);
}

#[test]
fn test_link_connect_error_is_logged_and_retried() {
    let mut link = MockLink::associating_after(1);
    link.fail_connect = true;
    let mut h = Harness::new(link);

    assert_eq!(h.advance(), ConnectionState::LinkDown);
    assert!(h.log.contains(Severity::Critical, "radio busy"));
    assert_eq!(h.manager.poll_budget(), 2);
}

#[test]
fn test_session_failure_stays_session_down() {
    let mut h = Harness::new(MockLink::associating_after(1));
    h.broker.fail_connect = true;

    assert_eq!(h.advance(), ConnectionState::LinkUpSessionDown);
    assert!(h.log.contains(Severity::Critical, "connection refused"));

    h.broker.fail_connect = false;
    assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);
    assert_eq!(h.broker.connect_calls, 2);
}

#[test]
fn test_publish_uses_two_decimals_and_retain() {
    let mut h = Harness::connected();
    h.clock.advance(30_000);

    assert_eq!(h.publish(Some(23.4)), PublishOutcome::Published);

    assert_eq!(
        h.broker.published,
        vec![(TOPIC.to_string(), "23.40".to_string(), true)]
    );
    assert_eq!(h.manager.last_success(), 36_000);
}

#[test]
fn test_absent_reading_pings() {
    let mut h = Harness::connected();
    h.clock.advance(30_000);

    assert_eq!(h.publish(None), PublishOutcome::Pinged);
    assert_eq!(h.broker.pings, 1);
    assert!(h.broker.published.is_empty());
    assert_eq!(h.manager.last_success(), 36_000);
}

#[test]
fn test_publish_failure_keeps_state() {
    let mut h = Harness::connected();
    h.broker.fail_publish = true;
    h.clock.advance(30_000);

    assert_eq!(h.publish(Some(5.0)), PublishOutcome::Failed);
    assert_eq!(h.manager.state(), ConnectionState::LinkUpSessionUp);
    assert_eq!(h.manager.last_success(), 6_000);
    assert!(h.log.contains(Severity::Critical, "broken pipe"));
}

#[test]
fn test_nothing_published_without_session() {
    let mut h = Harness::new(MockLink::never_associating());
    h.advance();

    assert_eq!(h.publish(Some(5.0)), PublishOutcome::NotConnected);
    assert!(h.broker.published.is_empty());
}

#[test]
fn test_stale_session_is_dropped_then_rebuilt() {
    let mut h = Harness::connected();
    h.broker.fail_publish = true;

    // three failed publishes 30 s apart
    for _ in 0..3 {
        h.clock.advance(30_000);
        assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);
        assert_eq!(h.publish(Some(1.0)), PublishOutcome::Failed);
    }

    h.clock.advance(11_000);
    assert_eq!(h.advance(), ConnectionState::LinkUpSessionDown);
    assert_eq!(h.broker.disconnects, 1);
    assert_eq!(h.link.disconnects, 0);

    assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);
    assert_eq!(h.broker.connect_calls, 2);
}

#[test]
fn test_long_staleness_drops_link_and_resets_clock() {
    let mut h = Harness::connected();
    h.broker.fail_publish = true;

    h.clock.advance(150_000);
    assert_eq!(h.advance(), ConnectionState::LinkUpSessionDown);
    assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);
    assert_eq!(h.publish(Some(1.0)), PublishOutcome::Failed);

    h.clock.advance(60_000);
    assert_eq!(h.advance(), ConnectionState::LinkDown);
    assert_eq!(h.link.disconnects, 1);
    assert_eq!(h.manager.last_success(), h.clock.now());

    // next cycle reconnects from scratch
    h.broker.fail_publish = false;
    assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);
    assert_eq!(h.link.connect_calls, 2);
}

#[test]
fn test_lost_link_is_noticed_and_reconnected() {
    let mut h = Harness::connected();

    h.link.drop_link();
    assert_eq!(h.advance(), ConnectionState::LinkUpSessionUp);

    assert!(h.log.contains(Severity::Warning, "Network connection lost"));
    assert_eq!(h.link.connect_calls, 2);
    assert_eq!(h.broker.connect_calls, 2);
}

#[test]
fn test_lost_session_is_noticed() {
    let mut h = Harness::connected();

    h.broker.connected = false;
    h.broker.fail_connect = true;
    assert_eq!(h.advance(), ConnectionState::LinkUpSessionDown);
    assert!(h.log.contains(Severity::Warning, "Broker session lost"));
}
