//! The process-wide logger.
//!
//! Until replaced, the global logger writes console lines with the date and time to locked
//! stderr at `INFO` and above.

use std::io;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::core::WriteCore;
use crate::encoder::{ConsoleEncoder, Flags};
use crate::field::Field;
use crate::level::Level;
use crate::logger::Logger;
use crate::sink::Locked;

lazy_static! {
    static ref GLOBAL_LOGGER: RwLock<Arc<Logger>> = RwLock::new(Arc::new(default_logger()));
}

fn default_logger() -> Logger {
    let core = WriteCore::new(
        ConsoleEncoder::new(Flags::STD),
        Locked::new(io::stderr()),
        Level::INFO,
    );
    Logger::new(Arc::new(core))
}

/// Returns the global logger.
pub fn logger() -> Arc<Logger> {
    GLOBAL_LOGGER.read().clone()
}

/// Installs `logger` as the global logger and returns a closure that puts the previous one
/// back.
///
/// ```
/// use std::sync::Arc;
/// use bytelog::{global, Logger};
///
/// let restore = global::replace_global(Arc::new(Logger::nop().named("quiet")));
/// assert_eq!(global::logger().name(), "quiet");
/// restore();
/// assert_eq!(global::logger().name(), "");
/// ```
pub fn replace_global(logger: Arc<Logger>) -> impl FnOnce() {
    let prev = std::mem::replace(&mut *GLOBAL_LOGGER.write(), logger);
    move || {
        *GLOBAL_LOGGER.write() = prev;
    }
}

#[track_caller]
pub fn debug(msg: &str, fields: &[Field]) {
    logger().debug(msg, fields);
}

#[track_caller]
pub fn info(msg: &str, fields: &[Field]) {
    logger().info(msg, fields);
}

#[track_caller]
pub fn warn(msg: &str, fields: &[Field]) {
    logger().warn(msg, fields);
}

#[track_caller]
pub fn error(msg: &str, fields: &[Field]) {
    logger().error(msg, fields);
}

/// Logs at `PANIC` through the global logger, then panics.
#[track_caller]
pub fn panic(msg: &str, fields: &[Field]) {
    logger().panic(msg, fields);
}

/// Logs at `FATAL` through the global logger, then exits with status 1.
#[track_caller]
pub fn fatal(msg: &str, fields: &[Field]) {
    logger().fatal(msg, fields);
}
