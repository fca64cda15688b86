//! AirGuard node for hosts
//!
//! Usage: `airguard-node [config.json]` (default `airguard.json`).
//!
//! Reads the sensor from `serial.device`, publishes over MQTT and logs to
//! the remote syslog collector when one is configured, to the console
//! otherwise (`RUST_LOG` controls the console level).

use std::env;
use std::fs;
use std::process::ExitCode;

use airguard_connectors::mqtt::{MqttConfig, MqttConnector};
use airguard_connectors::{ConnectorError, HostLink, ReaderTransport, SyslogSink};
use airguard_core::logging::{LogFacade, LogSink};
use airguard_core::offline::OfflineBuffer;
use airguard_core::time::SystemTime;
use airguard_core::{NodeConfig, SensorNode};

const DEFAULT_CONFIG_PATH: &str = "airguard.json";

fn load_config(path: &str) -> Result<NodeConfig, ConnectorError> {
    let text = fs::read_to_string(path)?;
    let config: NodeConfig = serde_json::from_str(&text)
        .map_err(|e| ConnectorError::ConfigError(format!("{}: {}", path, e)))?;
    config
        .validate()
        .map_err(|e| ConnectorError::ConfigError(format!("{}: {}", path, e)))?;
    Ok(config)
}

fn start<L: LogSink>(config: &NodeConfig, mut sink: L) -> ExitCode {
    let Some(device) = config.serial.device.as_deref() else {
        log::error!("serial.device is required on a host");
        return ExitCode::FAILURE;
    };
    let transport = match ReaderTransport::open(device) {
        Ok(transport) => transport,
        Err(e) => {
            log::error!("Cannot open {}: {}", device, e);
            return ExitCode::FAILURE;
        }
    };

    let offline = match config.offline_dir.as_deref().map(|dir| OfflineBuffer::activate(dir)) {
        Some(Ok(buffer)) => buffer,
        Some(Err(e)) => {
            sink.critical(format_args!("Exception {} while opening offline storage", e));
            None
        }
        None => None,
    };
    if let Some(buffer) = &offline {
        sink.info(format_args!("Offline logging to sequence {}", buffer.sequence()));
    }

    let link = HostLink::new(&config.broker.host, config.broker.port);
    let broker = MqttConnector::new(MqttConfig::from(&config.broker));

    let node = match SensorNode::new(config, transport, link, broker, SystemTime, sink) {
        Ok(node) => node,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match offline {
        Some(buffer) => node.with_offline(buffer).run(),
        None => {
            let mut node = node;
            node.run()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("AirGuard {} starting as {}", airguard_core::VERSION, config.broker.client_id);

    match &config.remote_log {
        Some(remote) => match SyslogSink::from_config(remote, &config.broker.client_id) {
            Ok(sink) => start(&config, sink),
            Err(e) => {
                log::error!("Remote log unavailable ({}), logging to console", e);
                start(&config, LogFacade)
            }
        },
        None => start(&config, LogFacade),
    }
}
