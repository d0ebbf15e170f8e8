//! Routes records from the `log` crate into a [`Logger`].
//!
//! Libraries that log through the `log` facade end up in the same cores as the rest of the
//! application. The record's target is attached as a `target` field.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::entry::CallSite;
use crate::field::Field;
use crate::level::Level;
use crate::logger::Logger;

/// A [`log::Log`] implementation backed by a [`Logger`].
#[derive(Debug, Clone)]
pub struct LogBridge {
    logger: Logger,
}

impl LogBridge {
    pub fn new(logger: Logger) -> Self {
        LogBridge { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

/// `Trace` has no counterpart and maps to `DEBUG`.
pub fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::ERROR,
        log::Level::Warn => Level::WARN,
        log::Level::Info => Level::INFO,
        log::Level::Debug | log::Level::Trace => Level::DEBUG,
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.logger.level_enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let level = map_level(record.level());
        if !self.logger.level_enabled(level) {
            return;
        }
        let site = match (record.file_static(), record.line()) {
            (Some(file), Some(line)) => CallSite::new(file, line, record.module_path_static()),
            _ => CallSite::unknown(),
        };
        let fields = [Field::new("target", record.target().to_string())];
        self.logger.log_args(level, *record.args(), &fields, site);
    }

    fn flush(&self) {
        if let Err(err) = self.logger.sync() {
            tracing::warn!(target: "bytelog", "failed to flush bridged logger: {:#}", err);
        }
    }
}

/// Installs a bridge to `logger` as the `log` crate's global logger.
///
/// Fails if another `log` logger has already been installed.
pub fn install(logger: Logger, max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(max_level);
    Ok(())
}
