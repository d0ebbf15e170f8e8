//! Declarative logger setup.
//!
//! ```toml
//! level = "debug"
//! encoding = "json"
//! flags = ["shortfile", "utc"]
//! outputs = ["stderr", "/var/log/app.log"]
//! name = "app"
//! caller = true
//! ```

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::core::{tee, Core, WriteCore};
use crate::encoder::{ConsoleEncoder, Encoder, Flags, JsonEncoder};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::logger::Logger;
use crate::sink::{Locked, Sink};

/// Environment variable that overrides the configured level.
pub const LEVEL_ENV: &str = "BYTELOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Console,
    Json,
}

/// Names accepted in the `flags` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagName {
    Date,
    Time,
    Microseconds,
    #[serde(alias = "long_file")]
    LongFile,
    #[serde(alias = "short_file")]
    ShortFile,
    Utc,
    Std,
}

impl From<FlagName> for Flags {
    fn from(name: FlagName) -> Flags {
        match name {
            FlagName::Date => Flags::DATE,
            FlagName::Time => Flags::TIME,
            FlagName::Microseconds => Flags::MICROSECONDS,
            FlagName::LongFile => Flags::LONG_FILE,
            FlagName::ShortFile => Flags::SHORT_FILE,
            FlagName::Utc => Flags::UTC,
            FlagName::Std => Flags::STD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum enabled level.
    pub level: Level,
    pub encoding: Encoding,
    pub flags: Vec<FlagName>,
    /// `stdout`, `stderr` or a file path opened for appending.
    pub outputs: Vec<String>,
    pub name: String,
    /// Record the file and line of each logging call.
    pub caller: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            encoding: Encoding::Console,
            flags: vec![FlagName::Std],
            outputs: vec!["stderr".to_string()],
            name: String::new(),
            caller: false,
        }
    }
}

impl LogConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Loads a TOML file. The level may be overridden with `BYTELOG_LEVEL`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Applies `BYTELOG_LEVEL` when it is set.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var(LEVEL_ENV) {
            self.level = level
                .parse()
                .map_err(|e| Error::Config(format!("{}: {}", LEVEL_ENV, e)))?;
        }
        Ok(())
    }

    /// The encoder option mask.
    pub fn flags(&self) -> Flags {
        let mut flags = self.flags.iter().fold(Flags::empty(), |acc, &f| acc | Flags::from(f));
        if self.caller && !flags.intersects(Flags::LONG_FILE | Flags::SHORT_FILE) {
            flags |= Flags::SHORT_FILE;
        }
        flags
    }

    /// Opens every output and assembles the logger.
    pub fn build(&self) -> Result<Logger> {
        if !self.level.is_valid() {
            return Err(Error::Config(format!("invalid level {}", self.level)));
        }

        let flags = self.flags();
        let mut cores: Vec<Arc<dyn Core>> = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let sink = open_output(output)?;
            let core = match self.encoding {
                Encoding::Console => new_core(ConsoleEncoder::new(flags), sink, self.level),
                Encoding::Json => new_core(JsonEncoder::new(flags), sink, self.level),
            };
            cores.push(core);
        }

        Ok(Logger::new(tee(cores))
            .named(&self.name)
            .with_caller(self.caller))
    }
}

fn new_core<E: Encoder + 'static>(encoder: E, sink: Box<dyn Sink>, level: Level) -> Arc<dyn Core> {
    Arc::new(WriteCore::new(encoder, sink, level))
}

fn open_output(output: &str) -> Result<Box<dyn Sink>> {
    match output {
        "stdout" => Ok(Box::new(Locked::new(io::stdout()))),
        "stderr" => Ok(Box::new(Locked::new(io::stderr()))),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::Config(format!("cannot open {}: {}", path, e)))?;
            Ok(Box::new(file))
        }
    }
}
