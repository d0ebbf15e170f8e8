//! The data captured at a log call site.

use std::panic::Location;

use chrono::{DateTime, FixedOffset, Local};

use crate::caller_cache;
use crate::field::Field;
use crate::level::Level;

/// Source location of a logging call, as written to log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryCaller {
    pub defined: bool,
    /// Crate-qualified file (`bytelog/core.rs`) when the module was known, otherwise the
    /// path the compiler reported.
    pub file: &'static str,
    pub line: u32,
}

impl EntryCaller {
    /// Builds a caller for `file:line`, qualifying the file with the crate named at the head
    /// of `module_path` when one is given.
    pub fn new(file: &'static str, line: u32, module_path: Option<&str>) -> Self {
        let file = match module_path {
            Some(module) => caller_cache::qualified_file(file, module),
            None => file,
        };
        EntryCaller {
            defined: true,
            file,
            line,
        }
    }

    /// A caller whose location could not be determined. Renders as `???:0`.
    pub const fn unknown() -> Self {
        EntryCaller {
            defined: true,
            file: "???",
            line: 0,
        }
    }

    /// A caller that was not captured. Encoders skip it.
    pub const fn undefined() -> Self {
        EntryCaller {
            defined: false,
            file: "",
            line: 0,
        }
    }

    /// The last path component of the file.
    pub fn short_file(&self) -> &'static str {
        caller_cache::short_file(self.file)
    }
}

impl Default for EntryCaller {
    fn default() -> Self {
        EntryCaller::undefined()
    }
}

/// An unresolved source location, as handed to the logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub module_path: Option<&'static str>,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32, module_path: Option<&'static str>) -> Self {
        CallSite {
            file,
            line,
            module_path,
        }
    }

    /// The location of the caller of the function this is called from.
    #[track_caller]
    pub fn here() -> Self {
        Location::caller().into()
    }

    pub const fn unknown() -> Self {
        CallSite {
            file: "???",
            line: 0,
            module_path: None,
        }
    }

    pub fn resolve(&self) -> EntryCaller {
        if self.line == 0 && self.file == "???" {
            return EntryCaller::unknown();
        }
        EntryCaller::new(self.file, self.line, self.module_path)
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(loc: &'static Location<'static>) -> Self {
        CallSite::new(loc.file(), loc.line(), None)
    }
}

/// One log event. Borrowed from the logging call and immutable while cores process it.
#[derive(Clone, Debug)]
pub struct Entry<'a> {
    pub level: Level,
    pub time: DateTime<FixedOffset>,
    pub caller: EntryCaller,
    pub message: &'a str,
    /// Fields passed at the call site.
    pub fields: &'a [Field],
    /// Dot-separated logger name, empty for the root logger.
    pub logger_name: &'a str,
    /// Fields inherited from the logger. Rendered before `fields`.
    pub context: &'a [Field],
}

impl<'a> Entry<'a> {
    /// An entry stamped with the current local time and no caller, name or fields.
    pub fn new(level: Level, message: &'a str) -> Self {
        Entry {
            level,
            time: Local::now().fixed_offset(),
            caller: EntryCaller::undefined(),
            message,
            fields: &[],
            logger_name: "",
            context: &[],
        }
    }

    pub fn with_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.time = time;
        self
    }

    pub fn with_caller(mut self, caller: EntryCaller) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_fields(mut self, fields: &'a [Field]) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_logger_name(mut self, name: &'a str) -> Self {
        self.logger_name = name;
        self
    }

    pub fn with_context(mut self, context: &'a [Field]) -> Self {
        self.context = context;
        self
    }
}
