//! The user-facing logger.

use std::fmt;
use std::sync::Arc;

use chrono::Local;

use crate::core::{Core, NopCore};
use crate::entry::{CallSite, Entry, EntryCaller};
use crate::error::Result;
use crate::field::Field;
use crate::level::Level;

/// Fast, leveled, structured logging on top of a [`Core`].
///
/// Cloning is cheap: the core and the inherited fields are shared. Every method can be called
/// from any thread.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use bytelog::{ConsoleEncoder, Field, Flags, Level, Locked, Logger, WriteCore};
///
/// let out = Arc::new(Locked::new(Vec::new()));
/// let core = WriteCore::new(ConsoleEncoder::new(Flags::empty()), out.clone(), Level::INFO);
/// let log = Logger::new(Arc::new(core))
///     .named("db")
///     .with_fields(vec![Field::new("shard", 3)]);
///
/// log.debug("skipped", &[]);
/// log.info("connected", &[Field::new("ms", 12)]);
///
/// let text = String::from_utf8(out.lock().clone()).unwrap();
/// assert_eq!(text, "INFO db: connected\n -  {\"shard\":3,\"ms\":12}\n");
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<dyn Core>,
    name: String,
    context: Arc<[Field]>,
    add_caller: bool,
}

impl Logger {
    pub fn new(core: Arc<dyn Core>) -> Self {
        Logger {
            core,
            name: String::new(),
            context: Arc::from(Vec::new()),
            add_caller: false,
        }
    }

    /// A logger that discards everything.
    pub fn nop() -> Self {
        Logger::new(Arc::new(NopCore))
    }

    /// Appends a segment to the logger's name. Segments are joined with `.`; an empty
    /// segment leaves the name as it is.
    pub fn named(mut self, segment: &str) -> Self {
        if segment.is_empty() {
            return self;
        }
        if !self.name.is_empty() {
            self.name.push('.');
        }
        self.name.push_str(segment);
        self
    }

    /// Adds fields written with every entry of this logger, before the call-site fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut context = self.context.to_vec();
        context.extend(fields);
        self.context = Arc::from(context);
        self
    }

    /// Annotates entries with the file and line of the logging call.
    pub fn with_caller(mut self, add_caller: bool) -> Self {
        self.add_caller = add_caller;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &[Field] {
        &self.context
    }

    pub fn core(&self) -> &Arc<dyn Core> {
        &self.core
    }

    pub fn level_enabled(&self, level: Level) -> bool {
        level.is_valid() && self.core.enabled(level)
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, fields: &[Field]) {
        self.log_at(Level::DEBUG, msg, fields, CallSite::here());
    }

    #[track_caller]
    pub fn info(&self, msg: &str, fields: &[Field]) {
        self.log_at(Level::INFO, msg, fields, CallSite::here());
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, fields: &[Field]) {
        self.log_at(Level::WARN, msg, fields, CallSite::here());
    }

    #[track_caller]
    pub fn error(&self, msg: &str, fields: &[Field]) {
        self.log_at(Level::ERROR, msg, fields, CallSite::here());
    }

    /// Logs at `PANIC`, then panics with `msg`, even when `PANIC` is disabled.
    #[track_caller]
    pub fn panic(&self, msg: &str, fields: &[Field]) {
        self.log_at(Level::PANIC, msg, fields, CallSite::here());
    }

    /// Logs at `FATAL`, syncs, then exits the process with status 1, even when `FATAL` is
    /// disabled.
    #[track_caller]
    pub fn fatal(&self, msg: &str, fields: &[Field]) {
        self.log_at(Level::FATAL, msg, fields, CallSite::here());
    }

    /// Logs with an explicit call site. The level methods and macros all end up here.
    pub fn log_at(&self, level: Level, msg: &str, fields: &[Field], site: CallSite) {
        if self.level_enabled(level) {
            let caller = if self.add_caller {
                site.resolve()
            } else {
                EntryCaller::undefined()
            };
            let entry = Entry {
                level,
                time: Local::now().fixed_offset(),
                caller,
                message: msg,
                fields,
                logger_name: &self.name,
                context: &self.context,
            };
            if let Err(err) = self.core.write(&entry) {
                tracing::warn!(
                    target: "bytelog",
                    level = %level,
                    "failed to write log entry: {:#}",
                    err
                );
            }
        }

        if level == Level::PANIC {
            panic!("{}", msg);
        }
        if level == Level::FATAL {
            if let Err(err) = self.core.sync() {
                tracing::warn!(target: "bytelog", "failed to sync before exit: {:#}", err);
            }
            std::process::exit(1);
        }
    }

    /// Like [`log_at`](Logger::log_at) with a formatted message. The message is only
    /// rendered when it will be used.
    pub fn log_args(
        &self,
        level: Level,
        args: fmt::Arguments<'_>,
        fields: &[Field],
        site: CallSite,
    ) {
        if !self.level_enabled(level) && level < Level::PANIC {
            return;
        }
        match args.as_str() {
            Some(msg) => self.log_at(level, msg, fields, site),
            None => self.log_at(level, &args.to_string(), fields, site),
        }
    }

    /// Whether a log call at `level` does anything at all: either the entry is written or
    /// the call panics or exits.
    pub fn needs(&self, level: Level) -> bool {
        level >= Level::PANIC || self.level_enabled(level)
    }

    /// Flushes buffered entries in every sink of the core.
    pub fn sync(&self) -> Result<()> {
        self.core.sync()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("add_caller", &self.add_caller)
            .finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::nop()
    }
}

/// Logs a record at an explicit level.
///
/// Takes a logger, a level, a format string with its arguments, and optionally a `;`
/// followed by `key => value` fields. Nothing is evaluated when the level is disabled.
///
/// ```
/// # use bytelog::{log_record, Level, Logger};
/// let log = Logger::nop();
/// let port = 8080;
/// log_record!(log, Level::INFO, "listening on {}", port; "tls" => true, "backlog" => 128);
/// log_record!(log, Level::DEBUG, "no fields");
/// ```
#[macro_export]
macro_rules! log_record {
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(; $($key:expr => $value:expr),+ $(,)?)?) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::Level = $level;
        if logger.needs(level) {
            logger.log_args(
                level,
                ::std::format_args!($fmt $(, $arg)*),
                &[$($($crate::Field::new($key, $value)),+)?],
                $crate::CallSite::new(
                    ::std::file!(),
                    ::std::line!(),
                    ::std::option::Option::Some(::std::module_path!()),
                ),
            );
        }
    }};
}

/// Logs at `DEBUG`. See [`log_record!`] for the syntax.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_record!($logger, $crate::Level::DEBUG, $($rest)+)
    };
}

/// Logs at `INFO`. See [`log_record!`] for the syntax.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_record!($logger, $crate::Level::INFO, $($rest)+)
    };
}

/// Logs at `WARN`. See [`log_record!`] for the syntax.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_record!($logger, $crate::Level::WARN, $($rest)+)
    };
}

/// Logs at `ERROR`. See [`log_record!`] for the syntax.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_record!($logger, $crate::Level::ERROR, $($rest)+)
    };
}
