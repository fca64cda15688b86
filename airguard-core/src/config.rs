//! Node Configuration
//!
//! Everything site-specific: network credentials, broker, serial line,
//! calibration and where logs go. The configuration is plain data,
//! deserialised once at startup (JSON on a host build) and validated before
//! any component is built from it.
//!
//! ```json
//! {
//!   "wifi": { "ssid": "attic", "password": "hunter2" },
//!   "broker": { "host": "10.0.0.2", "client_id": "airguard-1", "topic": "home/attic/pm" },
//!   "serial": { "device": "/dev/ttyUSB0" },
//!   "conditioning": {
//!     "adjust_mul": 0.8,
//!     "smoothing": { "strategy": "exponential", "alpha": 0.5 }
//!   },
//!   "remote_log": { "address": "10.0.0.2:514" },
//!   "offline_dir": "/var/lib/airguard"
//! }
//! ```
//!
//! Omitted fields take the defaults in [`crate::constants`].

use alloc::string::String;

use crate::connectivity::ConnectivityConfig;
use crate::constants::conditioning::DEFAULT_METRIC;
use crate::constants::connectivity::{
    DEFAULT_BROKER_PORT, DEFAULT_KEEP_ALIVE_SECS, DEFAULT_SERIAL_TIMEOUT_MS, MIN_SERIAL_TIMEOUT_MS,
};
use crate::errors::ConfigError;
use crate::pipeline::OutputMode;
use crate::smoothing::{Adjustment, Smoothing};

/// Complete node configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeConfig {
    /// Wireless network
    pub wifi: WifiConfig,
    /// Message broker
    pub broker: BrokerConfig,
    /// Sensor serial line
    #[cfg_attr(feature = "serde", serde(default))]
    pub serial: SerialConfig,
    /// Calibration and smoothing
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditioning: ConditioningConfig,
    /// Remote syslog collector; console logging when absent
    #[cfg_attr(feature = "serde", serde(default))]
    pub remote_log: Option<RemoteLogConfig>,
    /// Root directory for offline logs; no offline buffering when absent
    #[cfg_attr(feature = "serde", serde(default))]
    pub offline_dir: Option<String>,
    /// Metric label written to offline logs
    #[cfg_attr(feature = "serde", serde(default = "default_metric"))]
    pub metric: String,
}

/// Wireless network credentials
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// Network name
    pub ssid: String,
    /// Passphrase
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: String,
}

/// Broker endpoint and session settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrokerConfig {
    /// Host name or address
    pub host: String,
    /// TCP port
    #[cfg_attr(feature = "serde", serde(default = "default_broker_port"))]
    pub port: u16,
    /// Client identifier, unique per node
    pub client_id: String,
    /// Optional user name
    #[cfg_attr(feature = "serde", serde(default))]
    pub username: Option<String>,
    /// Optional password
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: Option<String>,
    /// Topic every reading is published to
    pub topic: String,
    /// Session keep-alive
    #[cfg_attr(feature = "serde", serde(default = "default_keep_alive"))]
    pub keep_alive_secs: u16,
}

/// Sensor serial line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialConfig {
    /// Receive pin on boards that route the UART
    pub rx_pin: Option<u8>,
    /// Device path on hosts (e.g. `/dev/ttyUSB0`)
    pub device: Option<String>,
    /// Blocking read timeout, longer than one sensor burst
    pub timeout_ms: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            rx_pin: None,
            device: None,
            timeout_ms: DEFAULT_SERIAL_TIMEOUT_MS,
        }
    }
}

/// Smoothing as written in the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "strategy", rename_all = "snake_case"))]
pub enum SmoothingConfig {
    /// No smoothing
    #[default]
    Disabled,
    /// Exponential smoothing with coefficient `alpha` in `[0, 1)`
    Exponential {
        /// Weight of the previous output
        alpha: f32,
    },
    /// Running mean since the last gap
    Mean,
}

/// Calibration and smoothing settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConditioningConfig {
    /// Offset added after scaling
    pub adjust_add: Option<f32>,
    /// Scale factor
    pub adjust_mul: Option<f32>,
    /// Smoothing strategy
    pub smoothing: SmoothingConfig,
    /// Which value each cycle publishes
    pub output: OutputMode,
}

impl ConditioningConfig {
    /// Resolve into the runtime adjustment and smoothing strategy
    pub fn resolve(&self) -> Result<(Adjustment, Smoothing), ConfigError> {
        check_finite(self.adjust_add, "adjust_add")?;
        check_finite(self.adjust_mul, "adjust_mul")?;

        let smoothing = match self.smoothing {
            SmoothingConfig::Disabled => Smoothing::Disabled,
            SmoothingConfig::Exponential { alpha } => {
                if !(0.0..1.0).contains(&alpha) {
                    return Err(ConfigError::InvalidSmoothing { alpha });
                }
                Smoothing::Exponential(alpha)
            }
            SmoothingConfig::Mean => Smoothing::Mean,
        };

        Ok((Adjustment::new(self.adjust_add, self.adjust_mul), smoothing))
    }
}

fn check_finite(value: Option<f32>, field: &'static str) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_finite() => Err(ConfigError::InvalidAdjustment { field }),
        _ => Ok(()),
    }
}

/// Remote syslog collector
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteLogConfig {
    /// `host` or `host:port`; port 514 when omitted
    pub address: String,
    /// Host name reported in each record; the client id when absent
    #[cfg_attr(feature = "serde", serde(default))]
    pub hostname: Option<String>,
    /// Application name reported in each record
    #[cfg_attr(feature = "serde", serde(default))]
    pub ident: Option<String>,
}

impl NodeConfig {
    /// Configuration with default optional sections
    pub fn new(wifi: WifiConfig, broker: BrokerConfig) -> Self {
        Self {
            wifi,
            broker,
            serial: SerialConfig::default(),
            conditioning: ConditioningConfig::default(),
            remote_log: None,
            offline_dir: None,
            metric: String::from(DEFAULT_METRIC),
        }
    }

    /// Reject configurations the node cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.wifi.ssid, "wifi.ssid")?;
        require(&self.broker.host, "broker.host")?;
        require(&self.broker.client_id, "broker.client_id")?;
        require(&self.broker.topic, "broker.topic")?;
        require(&self.metric, "metric")?;
        if let Some(remote) = &self.remote_log {
            require(&remote.address, "remote_log.address")?;
        }

        if self.serial.timeout_ms < MIN_SERIAL_TIMEOUT_MS {
            return Err(ConfigError::TimeoutTooShort {
                timeout_ms: self.serial.timeout_ms,
                min_ms: MIN_SERIAL_TIMEOUT_MS,
            });
        }

        self.conditioning.resolve().map(|_| ())
    }

    /// Connectivity settings with default timings
    pub fn connectivity(&self) -> ConnectivityConfig {
        ConnectivityConfig::new(self.wifi.ssid.clone(), self.wifi.password.clone())
    }
}

impl BrokerConfig {
    /// Broker on the default port and keep-alive
    pub fn new(host: impl Into<String>, client_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_BROKER_PORT,
            client_id: client_id.into(),
            username: None,
            password: None,
            topic: topic.into(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(field))
    } else {
        Ok(())
    }
}

#[cfg(feature = "serde")]
fn default_metric() -> String {
    String::from(DEFAULT_METRIC)
}

#[cfg(feature = "serde")]
fn default_broker_port() -> u16 {
    DEFAULT_BROKER_PORT
}

#[cfg(feature = "serde")]
fn default_keep_alive() -> u16 {
    DEFAULT_KEEP_ALIVE_SECS
}
