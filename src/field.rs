//! Key/value pairs attached to log entries.

use std::borrow::Cow;
use std::fmt;
use std::mem;

use serde::Serialize;

use crate::buffer::Buffer;
use crate::error::{combine, Error, Result};
use crate::value::Value;

/// A key paired with a [`Value`].
///
/// # Examples
///
/// ```
/// use bytelog::Field;
///
/// let f = Field::new("attempt", 3);
/// assert_eq!(f.to_string(), r#""attempt":3"#);
///
/// let nested = Field::new("req", vec![Field::new("id", 7), Field::new("path", "/")]);
/// assert_eq!(nested.to_string(), r#""req":{"id":7,"path":"/"}"#);
/// ```
#[derive(Clone, Debug)]
pub struct Field {
    key: Cow<'static, str>,
    value: Value,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Field {
        Field {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A field rendered through the generic structural encoder.
    pub fn any<T>(key: impl Into<Cow<'static, str>>, value: T) -> Field
    where
        T: Serialize + Send + Sync + 'static,
    {
        Field::new(key, Value::any(value))
    }

    /// A field holding the message of `err`.
    pub fn error(key: impl Into<Cow<'static, str>>, err: &dyn std::error::Error) -> Field {
        Field::new(key, Value::error(err))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Appends `"key":value`.
    ///
    /// If the value fails to render, everything written for this field is removed and the
    /// error comes back tagged with the key.
    pub fn append_to(&self, buf: &mut Buffer) -> Result<()> {
        let start = buf.len();
        buf.append_quote(&self.key);
        buf.push_byte(b':');
        self.value.append_json(buf).map_err(|source| {
            buf.truncate(start);
            Error::Encode {
                key: self.key.to_string(),
                source: Box::new(source),
            }
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Buffer::new();
        // A failed value leaves nothing behind, so there is nothing to print.
        let _ = self.append_to(&mut buf);
        f.write_str(&String::from_utf8_lossy(buf.as_bytes()))
    }
}

/// Writes a comma-separated run of fields, dropping any field that fails to render together
/// with the comma written for it, and remembering every failure.
pub(crate) struct FieldWriter<'b> {
    buf: &'b mut Buffer,
    need_comma: bool,
    result: Result<()>,
}

impl<'b> FieldWriter<'b> {
    /// `need_comma` is true when the buffer already holds a member of the enclosing object.
    pub(crate) fn new(buf: &'b mut Buffer, need_comma: bool) -> Self {
        FieldWriter {
            buf,
            need_comma,
            result: Ok(()),
        }
    }

    pub(crate) fn write_all(&mut self, fields: &[Field]) {
        for field in fields {
            self.write(field);
        }
    }

    pub(crate) fn write(&mut self, field: &Field) {
        let start = self.buf.len();
        if self.need_comma {
            self.buf.push_byte(b',');
        }
        match field.append_to(self.buf) {
            Ok(()) => self.need_comma = true,
            Err(err) => {
                self.buf.truncate(start);
                let prev = mem::replace(&mut self.result, Ok(()));
                self.result = combine(prev, Err(err));
            }
        }
    }

    /// Whether at least one member has been written so far.
    pub(crate) fn wrote_any(&self) -> bool {
        self.need_comma
    }

    pub(crate) fn finish(self) -> Result<()> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("broken"))
        }
    }

    #[test]
    fn test_failed_field_leaves_no_trace() {
        let mut buf = Buffer::new();
        buf.push_byte(b'{');
        let mut w = FieldWriter::new(&mut buf, false);
        w.write(&Field::new("a", 1));
        w.write(&Field::any("b", Broken));
        w.write(&Field::new("c", 2));
        let err = w.finish().unwrap_err();
        buf.push_byte(b'}');

        assert_eq!(buf.as_str().unwrap(), r#"{"a":1,"c":2}"#);
        match err {
            Error::Encode { key, .. } => assert_eq!(key, "b"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_leading_failure_keeps_comma_state() {
        let mut buf = Buffer::new();
        let mut w = FieldWriter::new(&mut buf, false);
        w.write(&Field::any("x", Broken));
        assert!(!w.wrote_any());
        w.write(&Field::new("y", true));
        assert!(w.finish().is_err());
        assert_eq!(buf.as_str().unwrap(), r#""y":true"#);
    }
}
