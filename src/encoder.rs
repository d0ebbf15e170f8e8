//! Entry renderers.
//!
//! An [`Encoder`] turns one [`Entry`] into one or two complete lines in a [`Buffer`]. Two
//! layouts ship with the crate:
//!
//! * [`ConsoleEncoder`]: `INFO 2009-01-23 01:23:23 name:file.rs:23: message` followed, when
//!   the entry carries fields, by an indented ` -  {...}` line.
//! * [`JsonEncoder`]: one JSON object per line with `level`, `time`, optional `logger` and
//!   `caller`, `msg`, then every field flattened into the object.

use chrono::Utc;

use crate::buffer::Buffer;
use crate::entry::{Entry, EntryCaller};
use crate::error::Result;
use crate::field::FieldWriter;
use crate::flags::flag_set;
use crate::timefmt::TimeFlags;

flag_set! {
    /// Controls which prefix pieces an encoder writes.
    ///
    /// The pieces always appear in the order listed here, whichever way the set is built.
    pub struct Flags: u16 {
        /// The date: `2009-01-23`.
        const DATE = 1 << 0;
        /// The time: `01:23:23`.
        const TIME = 1 << 1;
        /// Microsecond resolution: `01:23:23.123123`.
        const MICROSECONDS = 1 << 2;
        /// Caller file as captured, with its line: `bytelog/core.rs:23`.
        ///
        /// The crate-qualified form needs the caller's module path, which only the logging
        /// macros (`info!` and friends) capture. Calls through `Logger::info` and the other
        /// level methods print the path the compiler reports, such as `src/core.rs:23`.
        const LONG_FILE = 1 << 3;
        /// Final file name element and line: `core.rs:23`. Overrides `LONG_FILE`.
        const SHORT_FILE = 1 << 4;
        /// Render the time in UTC instead of the entry's own offset.
        const UTC = 1 << 5;
        /// `DATE | TIME`
        const STD = (1 << 0) | (1 << 1);
    }
}

impl Flags {
    /// The console timestamp layout selected by these flags.
    pub fn time_flags(self) -> TimeFlags {
        let mut t = TimeFlags::empty();
        if self.contains(Flags::DATE) {
            t |= TimeFlags::DATE;
        }
        if self.contains(Flags::TIME) {
            t |= TimeFlags::TIME;
        }
        if self.contains(Flags::MICROSECONDS) {
            t |= TimeFlags::MICROS;
        }
        t
    }

    fn wants_caller(self) -> bool {
        self.intersects(Flags::LONG_FILE.union(Flags::SHORT_FILE))
    }

    fn caller_file(self, caller: &EntryCaller) -> &'static str {
        if self.contains(Flags::SHORT_FILE) {
            caller.short_file()
        } else {
            caller.file
        }
    }
}

/// Renders entries into bytes.
pub trait Encoder: Send + Sync {
    /// Appends the rendering of `entry` to `buf`.
    ///
    /// The line is always completed. Fields that fail to render are left out and the
    /// failures returned.
    fn encode(&self, buf: &mut Buffer, entry: &Entry<'_>) -> Result<()>;
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&self, buf: &mut Buffer, entry: &Entry<'_>) -> Result<()> {
        (**self).encode(buf, entry)
    }
}

/// Human-oriented layout.
///
/// # Examples
///
/// ```
/// use bytelog::{Buffer, ConsoleEncoder, Encoder, Entry, Field, Flags, Level};
///
/// let fields = [Field::new("port", 8080)];
/// let entry = Entry::new(Level::WARN, "listening").with_fields(&fields);
/// let mut buf = Buffer::new();
/// ConsoleEncoder::new(Flags::empty()).encode(&mut buf, &entry).unwrap();
/// assert_eq!(buf.as_str().unwrap(), "WARN listening\n -  {\"port\":8080}\n");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsoleEncoder {
    flags: Flags,
}

impl ConsoleEncoder {
    pub const fn new(flags: Flags) -> Self {
        ConsoleEncoder { flags }
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }
}

impl Encoder for ConsoleEncoder {
    fn encode(&self, buf: &mut Buffer, entry: &Entry<'_>) -> Result<()> {
        let flags = self.flags;
        buf.push_str(entry.level.capital_str());

        let time_flags = flags.time_flags();
        buf.push_byte(b' ');
        if !time_flags.is_empty() {
            if flags.contains(Flags::UTC) {
                buf.append_time(&entry.time.with_timezone(&Utc), time_flags);
            } else {
                buf.append_time(&entry.time, time_flags);
            }
            buf.push_byte(b' ');
        }

        let mut prefixed = false;
        if !entry.logger_name.is_empty() {
            buf.push_str(entry.logger_name);
            prefixed = true;
        }
        if flags.wants_caller() && entry.caller.defined {
            if prefixed {
                buf.push_byte(b':');
            }
            buf.push_str(flags.caller_file(&entry.caller));
            buf.push_byte(b':');
            buf.append_uint(u64::from(entry.caller.line));
            prefixed = true;
        }
        if prefixed {
            buf.push_str(": ");
        }
        buf.push_str(entry.message);
        buf.push_byte(b'\n');

        if entry.context.is_empty() && entry.fields.is_empty() {
            return Ok(());
        }
        buf.push_str(" -  {");
        let mut w = FieldWriter::new(buf, false);
        w.write_all(entry.context);
        w.write_all(entry.fields);
        let result = w.finish();
        buf.push_str("}\n");
        result
    }
}

/// Machine-oriented layout: one JSON object per line.
///
/// Keys are not de-duplicated; a field named `msg` is written after the message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonEncoder {
    flags: Flags,
}

impl JsonEncoder {
    pub const fn new(flags: Flags) -> Self {
        JsonEncoder { flags }
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, buf: &mut Buffer, entry: &Entry<'_>) -> Result<()> {
        let flags = self.flags;
        buf.push_str("{\"level\":\"");
        buf.push_str(entry.level.capital_str());

        buf.push_str("\",\"time\":\"");
        if flags.contains(Flags::UTC) {
            buf.append_time(&entry.time.with_timezone(&Utc), TimeFlags::RFC3339_NANO);
        } else {
            buf.append_time(&entry.time, TimeFlags::RFC3339_NANO);
        }
        buf.push_byte(b'"');

        if !entry.logger_name.is_empty() {
            buf.push_str(",\"logger\":");
            buf.append_html_quote(entry.logger_name);
        }

        if flags.wants_caller() && entry.caller.defined {
            buf.push_str(",\"caller\":\"");
            buf.append_html_escaped(flags.caller_file(&entry.caller));
            buf.push_byte(b':');
            buf.append_uint(u64::from(entry.caller.line));
            buf.push_byte(b'"');
        }

        buf.push_str(",\"msg\":");
        buf.append_html_quote(entry.message);

        let mut w = FieldWriter::new(buf, true);
        w.write_all(entry.context);
        w.write_all(entry.fields);
        let result = w.finish();
        buf.push_str("}\n");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_flags_mapping() {
        assert_eq!(Flags::STD.time_flags(), TimeFlags::DATETIME);
        assert_eq!(
            (Flags::STD | Flags::MICROSECONDS).time_flags(),
            TimeFlags::DATETIME_MICROS
        );
        assert!(Flags::SHORT_FILE.time_flags().is_empty());
    }

    #[test]
    fn test_short_file_overrides_long() {
        let caller = EntryCaller {
            defined: true,
            file: "bytelog/encoder.rs",
            line: 3,
        };
        let both = Flags::LONG_FILE | Flags::SHORT_FILE;
        assert_eq!(both.caller_file(&caller), "encoder.rs");
        assert_eq!(Flags::LONG_FILE.caller_file(&caller), "bytelog/encoder.rs");
    }
}
