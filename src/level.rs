use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Local log level.
///
/// Ordered numerically. Values outside the named constants are valid
/// levels the severity mapper does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub i8);

impl Level {
    pub const TRACE: Level = Level(-2);
    pub const DEBUG: Level = Level(-1);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(1);
    pub const ERROR: Level = Level(2);
    pub const DPANIC: Level = Level(3);
    pub const PANIC: Level = Level(4);
    pub const FATAL: Level = Level(5);

    pub fn as_str(&self) -> &'static str {
        match *self {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
            Level::DPANIC => "dpanic",
            Level::PANIC => "panic",
            Level::FATAL => "fatal",
            _ => "unknown",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::ERROR
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            "unknown" => write!(f, "Level({})", self.0),
            s => f.write_str(s),
        }
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" | "warning" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            "dpanic" => Ok(Level::DPANIC),
            "panic" => Ok(Level::PANIC),
            "fatal" => Ok(Level::FATAL),
            _ => Err(ConfigError::InvalidLevel(s.to_string())),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::TRACE,
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::WARN => Level::WARN,
            _ => Level::ERROR,
        }
    }
}

/// Backend severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

/// Map a local level onto the backend severity scale.
///
/// Anything past `ERROR`, and any level not recognized, is reported as
/// fatal so it never goes unnoticed.
pub fn severity(level: Level) -> Severity {
    match level {
        Level::TRACE | Level::DEBUG => Severity::Debug,
        Level::INFO => Severity::Info,
        Level::WARN => Severity::Warning,
        Level::ERROR => Severity::Error,
        Level::DPANIC | Level::PANIC | Level::FATAL => Severity::Fatal,
        _ => Severity::Fatal,
    }
}
