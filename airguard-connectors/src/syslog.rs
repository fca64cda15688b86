//! Remote syslog over UDP
//!
//! Records go out as minimal RFC 5424 messages, one datagram each:
//!
//! ```text
//! <14>1 - airguard-1 airguard - - - PMVT = 23.40
//!  │  │ │ │          │        └─┴─┴── no procid, msgid, structured data
//!  │  │ │ │          └ app name
//!  │  │ │ └ host name
//!  │  │ └ no timestamp: the collector stamps on receipt
//!  │  └ version
//!  └ facility * 8 + severity
//! ```
//!
//! Warnings and worse are echoed to stderr so they show on a console too.
//! Sending never fails towards the caller; after a send error the socket is
//! rebound for the next record.

use std::io::{self, Write as _};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Mutex;

use airguard_core::config::RemoteLogConfig;
use airguard_core::logging::{LogSink, Severity};

use crate::ConnectorError;

/// Default syslog port
pub const DEFAULT_SYSLOG_PORT: u16 = 514;

/// `user` facility
pub const FACILITY_USER: u8 = 1;

/// Default app name
pub const DEFAULT_IDENT: &str = "airguard";

/// Lowest severity also written to stderr
const ECHO_FROM: Severity = Severity::Warning;

/// Format one record
pub fn format_record(facility: u8, severity: Severity, hostname: &str, ident: &str, message: &str) -> String {
    let pri = u16::from(facility) * 8 + u16::from(severity.syslog_priority());
    format!("<{}>1 - {} {} - - - {}", pri, hostname, ident, message)
}

/// Closest node severity for a `log` level
pub fn severity_for(level: log::Level) -> Severity {
    match level {
        log::Level::Error => Severity::Error,
        log::Level::Warn => Severity::Warning,
        log::Level::Info => Severity::Info,
        log::Level::Debug | log::Level::Trace => Severity::Debug,
    }
}

/// Sends severity-tagged records to a syslog collector
#[derive(Debug)]
pub struct SyslogSink {
    target: SocketAddr,
    hostname: String,
    ident: String,
    facility: u8,
    min_severity: Severity,
    socket: Mutex<Option<UdpSocket>>,
}

impl SyslogSink {
    /// Sink for `address` (`host` or `host:port`)
    pub fn new(address: &str, hostname: impl Into<String>) -> Result<Self, ConnectorError> {
        let target = resolve(address)?;
        Ok(Self {
            target,
            hostname: hostname.into(),
            ident: DEFAULT_IDENT.to_string(),
            facility: FACILITY_USER,
            min_severity: Severity::Debug,
            socket: Mutex::new(bind(target).ok()),
        })
    }

    /// Sink from the node's remote-log settings
    ///
    /// The host name falls back to `default_hostname` (the client id).
    pub fn from_config(config: &RemoteLogConfig, default_hostname: &str) -> Result<Self, ConnectorError> {
        let hostname = config.hostname.as_deref().unwrap_or(default_hostname);
        let mut sink = Self::new(&config.address, hostname)?;
        if let Some(ident) = &config.ident {
            sink.ident = ident.clone();
        }
        Ok(sink)
    }

    /// Send under `facility` instead of `user`
    pub fn with_facility(mut self, facility: u8) -> Self {
        self.facility = facility;
        self
    }

    /// Drop records below `severity`
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn send(&self, severity: Severity, message: &str) {
        if severity < self.min_severity {
            return;
        }

        if severity >= ECHO_FROM {
            let _ = writeln!(io::stderr(), "[{}] {}", severity.label(), message);
        }

        let record = format_record(self.facility, severity, &self.hostname, &self.ident, message);
        let Ok(mut socket) = self.socket.lock() else {
            return;
        };

        if socket.is_none() {
            *socket = bind(self.target).ok();
        }
        let sent = socket
            .as_ref()
            .map(|s| s.send_to(record.as_bytes(), self.target));
        if !matches!(sent, Some(Ok(_))) {
            // rebound on the next record
            *socket = None;
        }
    }
}

fn resolve(address: &str) -> Result<SocketAddr, ConnectorError> {
    let resolved = if address.contains(':') {
        address.to_socket_addrs()
    } else {
        (address, DEFAULT_SYSLOG_PORT).to_socket_addrs()
    };
    resolved?
        .next()
        .ok_or_else(|| ConnectorError::ConfigError(format!("cannot resolve syslog address {}", address)))
}

fn bind(target: SocketAddr) -> io::Result<UdpSocket> {
    let local: SocketAddr = if target.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    UdpSocket::bind(local)
}

impl LogSink for SyslogSink {
    fn emit(&mut self, severity: Severity, args: std::fmt::Arguments<'_>) {
        self.send(severity, &args.to_string());
    }
}

impl log::Log for SyslogSink {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        severity_for(metadata.level()) >= self.min_severity
    }

    fn log(&self, record: &log::Record<'_>) {
        self.send(severity_for(record.level()), &record.args().to_string());
    }

    fn flush(&self) {}
}
