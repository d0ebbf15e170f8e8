//! Logging priorities and level gating.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// A logging priority. Higher levels are more important.
///
/// Only the six associated constants are legal; other raw values can be built with
/// [`Level::from_i8`] but are never enabled by any core.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Level(i8);

impl Level {
    /// Verbose output, usually disabled in production.
    pub const DEBUG: Level = Level(-1);
    /// The default priority.
    pub const INFO: Level = Level(0);
    /// More important than info, but doesn't need individual attention.
    pub const WARN: Level = Level(1);
    /// High-priority entries. Writing one forces a sync of syncable sinks.
    pub const ERROR: Level = Level(2);
    /// Logs the entry, then panics.
    pub const PANIC: Level = Level(3);
    /// Logs the entry, then exits the process with status 1.
    pub const FATAL: Level = Level(4);

    pub const MIN: Level = Level::DEBUG;
    pub const MAX: Level = Level::FATAL;

    pub const fn from_i8(raw: i8) -> Level {
        Level(raw)
    }

    pub const fn as_i8(self) -> i8 {
        self.0
    }

    /// Whether this is one of the six defined levels.
    pub const fn is_valid(self) -> bool {
        self.0 >= Level::MIN.0 && self.0 <= Level::MAX.0
    }

    /// Lower-case name, as used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self.0 {
            -1 => "debug",
            0 => "info",
            1 => "warn",
            2 => "error",
            3 => "panic",
            4 => "fatal",
            _ => "invalid",
        }
    }

    /// Upper-case name, as written by the encoders.
    pub const fn capital_str(self) -> &'static str {
        match self.0 {
            -1 => "DEBUG",
            0 => "INFO",
            1 => "WARN",
            2 => "ERROR",
            3 => "PANIC",
            4 => "FATAL",
            _ => "INVALID",
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.pad(self.as_str())
        } else {
            write!(f, "Level({})", self.0)
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.write_str(self.capital_str())
        } else {
            write!(f, "Level({})", self.0)
        }
    }
}

/// Returned when a string names no level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized level: {0:?}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring ASCII case. `warning` is accepted for `warn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_ascii_lowercase().as_str() {
            "debug" => Level::DEBUG,
            "info" | "" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            "panic" => Level::PANIC,
            "fatal" => Level::FATAL,
            _ => return Err(ParseLevelError(s.to_string())),
        };
        Ok(level)
    }
}

impl TryFrom<String> for Level {
    type Error = ParseLevelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Decides whether entries at a level should be logged.
///
/// Implemented by [`Level`] itself (a minimum level) and by any `Fn(Level) -> bool`.
pub trait LevelEnabler: Send + Sync {
    fn enabled(&self, level: Level) -> bool;
}

impl LevelEnabler for Level {
    fn enabled(&self, level: Level) -> bool {
        level.is_valid() && level >= *self
    }
}

impl<F> LevelEnabler for F
where
    F: Fn(Level) -> bool + Send + Sync,
{
    fn enabled(&self, level: Level) -> bool {
        level.is_valid() && self(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Level::DEBUG < Level::INFO);
        assert!(Level::PANIC < Level::FATAL);
        assert_eq!(Level::MIN, Level::DEBUG);
    }

    #[test]
    fn test_out_of_range_never_enabled() {
        let bogus = Level::from_i8(42);
        assert!(!bogus.is_valid());
        assert!(!Level::DEBUG.enabled(bogus));
        assert!(!(|_: Level| true).enabled(Level::from_i8(-7)));
        assert_eq!(bogus.to_string(), "Level(42)");
    }

    #[test]
    fn test_parse() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::WARN);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::WARN);
        assert!("loud".parse::<Level>().is_err());
    }
}
