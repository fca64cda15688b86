//! Injected Logging Capability
//!
//! Components never reach for a global logger. The node owns one
//! [`LogSink`] and lends it to each component that needs to report
//! something, so the same code logs to a UDP syslog collector on the device,
//! to the `log` facade on a host, or into memory under test.
//!
//! A sink must never fail on the caller: `emit` returns nothing and
//! implementations swallow their own transport errors.
//!
//! ```rust
//! use airguard_core::logging::{LogSink, NullSink, Severity};
//!
//! fn report(log: &mut impl LogSink, offset: usize) {
//!     log.warning(format_args!("Bad magic at {}, ignoring reading", offset));
//! }
//!
//! report(&mut NullSink, 40);
//! ```

use core::fmt;

/// Log severities used by the node, most verbose first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Per-cycle chatter
    Debug,
    /// Normal progress (connected, publishing)
    Info,
    /// Recoverable oddities (bad frame, volatile batch)
    Warning,
    /// A cycle's worth of work lost
    Error,
    /// Something the operator should look at
    Critical,
}

impl Severity {
    /// Syslog priority number (RFC 5424 §6.2.1)
    pub const fn syslog_priority(self) -> u8 {
        match self {
            Self::Debug => 7,
            Self::Info => 6,
            Self::Warning => 4,
            Self::Error => 3,
            Self::Critical => 2,
        }
    }

    /// Lower-case label, as used in console prefixes
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Closest `log` crate level (`log` has no critical)
    #[cfg(feature = "log")]
    pub const fn as_level(self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error | Self::Critical => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Destination for severity-tagged log records
pub trait LogSink {
    /// Record one message. Must not panic or report failure.
    fn emit(&mut self, severity: Severity, args: fmt::Arguments<'_>);

    /// Record at debug severity
    fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Debug, args);
    }

    /// Record at info severity
    fn info(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Info, args);
    }

    /// Record at warning severity
    fn warning(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Warning, args);
    }

    /// Record at error severity
    fn error(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Error, args);
    }

    /// Record at critical severity
    fn critical(&mut self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Critical, args);
    }
}

impl<L: LogSink + ?Sized> LogSink for &mut L {
    fn emit(&mut self, severity: Severity, args: fmt::Arguments<'_>) {
        (**self).emit(severity, args);
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&mut self, _severity: Severity, _args: fmt::Arguments<'_>) {}
}

/// Sink forwarding to the `log` facade
///
/// Records go to target `airguard`. Critical records are logged at
/// `Error` with a `CRITICAL:` prefix so they stay searchable.
#[cfg(feature = "log")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

#[cfg(feature = "log")]
impl LogSink for LogFacade {
    fn emit(&mut self, severity: Severity, args: fmt::Arguments<'_>) {
        if severity == Severity::Critical {
            log::log!(target: "airguard", severity.as_level(), "CRITICAL: {}", args);
        } else {
            log::log!(target: "airguard", severity.as_level(), "{}", args);
        }
    }
}

/// Sink that keeps every record in memory
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: std::vec::Vec<(Severity, std::string::String)>,
}

#[cfg(feature = "std")]
impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, oldest first
    pub fn records(&self) -> &[(Severity, std::string::String)] {
        &self.records
    }

    /// Whether any record at `severity` contains `needle`
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.records
            .iter()
            .any(|(s, msg)| *s == severity && msg.contains(needle))
    }

    /// Number of records at `severity`
    pub fn count(&self, severity: Severity) -> usize {
        self.records.iter().filter(|(s, _)| *s == severity).count()
    }

    /// Drop all records
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(feature = "std")]
impl LogSink for MemorySink {
    fn emit(&mut self, severity: Severity, args: fmt::Arguments<'_>) {
        self.records.push((severity, std::format!("{}", args)));
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn severities_order_by_impact() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn syslog_priorities() {
        assert_eq!(Severity::Critical.syslog_priority(), 2);
        assert_eq!(Severity::Warning.syslog_priority(), 4);
        assert_eq!(Severity::Debug.syslog_priority(), 7);
    }

    #[test]
    fn memory_sink_records_through_reference() {
        fn report<L: LogSink>(mut log: L) {
            log.warning(format_args!("Bad checksum at {}", 20));
        }

        let mut sink = MemorySink::new();
        report(&mut sink);
        assert!(sink.contains(Severity::Warning, "Bad checksum at 20"));
        assert_eq!(sink.count(Severity::Warning), 1);
    }
}
