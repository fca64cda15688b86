//! Sensor Node Control Loop
//!
//! One thread, one loop, strictly sequential:
//!
//! 1. block on the serial line for one sensor burst
//! 2. condition it into a [`Reading`] (or an absent cycle)
//! 3. advance the connectivity state machine
//! 4. with a session: publish the value, or ping when there is none;
//!    without a link: append the value to the offline log
//!
//! A cycle that stops early returns a [`CycleError`]; [`SensorNode::step`]
//! logs it at critical and the loop carries on with the next cycle.
//!
//! [`SensorNode`] owns every piece of state the loop touches. Nothing is
//! global and nothing is shared, so the whole loop can be driven from a
//! test with scripted collaborators and a [`FixedTime`](crate::time::FixedTime).

use alloc::string::String;

use crate::acquisition::Acquisition;
use crate::config::NodeConfig;
use crate::connectivity::{ConnectionState, ConnectivityManager, PublishOutcome};
use crate::errors::{ConfigError, CycleError};
use crate::logging::LogSink;
use crate::pipeline::{ConditioningPipeline, Reading};
use crate::time::{Delay, TimeSource};
use crate::traits::{BrokerClient, NoStorage, OfflineSink, SerialTransport, WirelessLink};

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// This cycle's reading
    pub reading: Reading,
    /// Connectivity state after advancing
    pub state: ConnectionState,
    /// Publish/ping result
    pub outcome: PublishOutcome,
    /// Whether the reading went to the offline log
    pub buffered: bool,
}

/// The node's collaborators and state
pub struct SensorNode<T, W, B, C, L, S = NoStorage>
where
    T: SerialTransport,
{
    acquisition: Acquisition<T>,
    pipeline: ConditioningPipeline,
    connectivity: ConnectivityManager,
    link: W,
    broker: B,
    clock: C,
    log: L,
    offline: Option<S>,
    topic: String,
    metric: String,
}

impl<T, W, B, C, L> SensorNode<T, W, B, C, L, NoStorage>
where
    T: SerialTransport,
    W: WirelessLink,
    B: BrokerClient,
    C: TimeSource + Delay,
    L: LogSink,
{
    /// Build a node from a validated configuration
    pub fn new(
        config: &NodeConfig,
        transport: T,
        link: W,
        broker: B,
        clock: C,
        log: L,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (adjustment, smoothing) = config.conditioning.resolve()?;
        let pipeline =
            ConditioningPipeline::new(adjustment, smoothing).with_output(config.conditioning.output);
        let connectivity = ConnectivityManager::new(config.connectivity(), clock.now());

        Ok(Self {
            acquisition: Acquisition::new(transport),
            pipeline,
            connectivity,
            link,
            broker,
            clock,
            log,
            offline: None,
            topic: config.broker.topic.clone(),
            metric: config.metric.clone(),
        })
    }
}

impl<T, W, B, C, L, S> SensorNode<T, W, B, C, L, S>
where
    T: SerialTransport,
    W: WirelessLink,
    B: BrokerClient,
    C: TimeSource + Delay,
    L: LogSink,
    S: OfflineSink,
{
    /// Buffer readings to `sink` while the link is down
    pub fn with_offline<S2: OfflineSink>(self, sink: S2) -> SensorNode<T, W, B, C, L, S2> {
        SensorNode {
            acquisition: self.acquisition,
            pipeline: self.pipeline,
            connectivity: self.connectivity,
            link: self.link,
            broker: self.broker,
            clock: self.clock,
            log: self.log,
            offline: Some(sink),
            topic: self.topic,
            metric: self.metric,
        }
    }

    /// Run one acquisition-to-publish cycle
    pub fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let reading = match self.acquisition.acquire(&mut self.log) {
            Ok(batch) => self.pipeline.process(&batch.values),
            Err(reason) => self.pipeline.record_absent(reason),
        };

        match reading {
            Reading::Value(value) => {
                self.log.info(format_args!("{} = {:.2}", self.metric, value));
            }
            Reading::Absent(reason) => {
                self.log.emit(reason.severity(), format_args!("{}", reason));
            }
        }

        let state = self.connectivity.advance(
            &mut self.link,
            &mut self.broker,
            &mut self.clock,
            &mut self.log,
        );

        let outcome = self.connectivity.publish_or_ping(
            &self.topic,
            reading.value(),
            &mut self.broker,
            &self.clock,
            &mut self.log,
        );

        let buffered = if state.link_up() {
            false
        } else {
            self.buffer_offline(reading)?
        };

        if let Some(average) = self.pipeline.hourly_average() {
            self.log.debug(format_args!("{} hourly average = {}", self.metric, average));
        }

        Ok(CycleReport { reading, state, outcome, buffered })
    }

    /// Run one cycle, logging a cycle that ended early at critical
    pub fn step(&mut self) -> Option<CycleReport> {
        match self.run_cycle() {
            Ok(report) => Some(report),
            Err(e) => {
                self.log.critical(format_args!("Exception {} in main loop", e));
                None
            }
        }
    }

    /// Run cycles until the device is reset
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    fn buffer_offline(&mut self, reading: Reading) -> Result<bool, CycleError> {
        let (Some(sink), Some(value)) = (self.offline.as_mut(), reading.value()) else {
            return Ok(false);
        };
        // hour-named files need calendar time
        if !self.clock.is_wall_clock() {
            self.log.debug(format_args!("No wall clock, not publishing to file"));
            return Ok(false);
        }
        match sink.append(self.clock.now(), &self.metric, value) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.log.error(format_args!("Exception {:?} while publishing to file", e));
                Err(CycleError::OfflineWrite)
            }
        }
    }

    /// Conditioning pipeline (history, aggregator)
    pub fn pipeline(&self) -> &ConditioningPipeline {
        &self.pipeline
    }

    /// Connectivity state machine
    pub fn connectivity(&self) -> &ConnectivityManager {
        &self.connectivity
    }

    /// Broker client
    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Serial transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.acquisition.transport_mut()
    }

    /// Log sink
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Offline sink, when buffering is enabled
    pub fn offline(&self) -> Option<&S> {
        self.offline.as_ref()
    }
}
