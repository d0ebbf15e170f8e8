//! Typed field values and their JSON rendering.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, TimeDelta, TimeZone, Utc};
use serde::Serialize;

use crate::buffer::Buffer;
use crate::error::Result;
use crate::field::Field;
use crate::json::encode_any;
use crate::timefmt::{delta_nanos, TimeFlags};

/// A value rendered through the generic structural encoder.
///
/// Implemented for every `Serialize + Send + Sync` type; wrap values with [`Value::any`].
pub trait Structural: Send + Sync {
    fn encode(&self, buf: &mut Buffer) -> std::result::Result<(), serde_json::Error>;
}

impl<T> Structural for T
where
    T: Serialize + Send + Sync,
{
    fn encode(&self, buf: &mut Buffer) -> std::result::Result<(), serde_json::Error> {
        encode_any(buf, self)
    }
}

/// The value half of a [`Field`].
///
/// Every common type has its own variant and is rendered by a dedicated append operation;
/// anything else goes through [`Value::Any`]. Slices wrapped in `Option` render `null` when
/// absent, while an empty slice renders `[]`.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// Raw address, rendered as unquoted `0x` hex.
    Pointer(usize),
    F32(f32),
    F64(f64),
    Complex64(f32, f32),
    Complex128(f64, f64),
    Str(Cow<'static, str>),
    /// Signed nanoseconds, rendered as a quoted humane duration.
    Duration(i64),
    /// Rendered as a quoted RFC 3339 timestamp with nanoseconds.
    Time(DateTime<FixedOffset>),
    /// The message of an error.
    Error(String),
    /// Rendered as a quoted base64 string.
    Bytes(Vec<u8>),
    Bools(Vec<bool>),
    Ints(Vec<i64>),
    Uints(Vec<u64>),
    F32s(Vec<f32>),
    F64s(Vec<f64>),
    Complex64s(Vec<(f32, f32)>),
    Complex128s(Vec<(f64, f64)>),
    Strs(Vec<Cow<'static, str>>),
    /// Nested fields, rendered as `{...}`.
    Object(Vec<Field>),
    /// A list of nested objects, rendered as `[{...},...]`.
    Objects(Vec<Vec<Field>>),
    /// A single nested field, rendered as `{"key":value}`.
    Field(Box<Field>),
    Any(Arc<dyn Structural>),
}

impl Value {
    /// Wraps any serializable value.
    ///
    /// Timestamps passed here directly become [`Value::Time`]. Inside a structure they need
    /// `#[serde(serialize_with = "bytelog::json::rfc3339_nano")]` to render the same way.
    pub fn any<T>(value: T) -> Value
    where
        T: Serialize + Send + Sync + 'static,
    {
        let any: &dyn Any = &value;
        if let Some(t) = any.downcast_ref::<DateTime<Utc>>() {
            return Value::Time(t.fixed_offset());
        }
        if let Some(t) = any.downcast_ref::<DateTime<FixedOffset>>() {
            return Value::Time(*t);
        }
        if let Some(t) = any.downcast_ref::<DateTime<Local>>() {
            return Value::Time(t.fixed_offset());
        }
        Value::Any(Arc::new(value))
    }

    pub fn error(err: &dyn std::error::Error) -> Value {
        Value::Error(err.to_string())
    }

    pub fn complex64(re: f32, im: f32) -> Value {
        Value::Complex64(re, im)
    }

    pub fn complex128(re: f64, im: f64) -> Value {
        Value::Complex128(re, im)
    }

    pub fn pointer<T: ?Sized>(ptr: *const T) -> Value {
        Value::Pointer(ptr.cast::<()>() as usize)
    }

    /// Appends the JSON rendering of this value.
    ///
    /// Only [`Value::Any`] and containers holding one can fail. On failure the buffer may
    /// hold a partial rendering; [`Field::append_to`] removes it.
    pub fn append_json(&self, buf: &mut Buffer) -> Result<()> {
        match self {
            Value::Null => buf.push_str("null"),
            Value::Bool(v) => buf.append_bool(*v),
            Value::Int(v) => buf.append_int(*v),
            Value::Uint(v) => buf.append_uint(*v),
            Value::Pointer(v) => buf.append_uintptr(*v),
            Value::F32(v) => buf.append_f32(*v),
            Value::F64(v) => buf.append_f64(*v),
            Value::Complex64(re, im) => quote(buf, |buf| buf.append_complex64(*re, *im)),
            Value::Complex128(re, im) => quote(buf, |buf| buf.append_complex128(*re, *im)),
            Value::Str(s) => buf.append_html_quote(s),
            Value::Duration(d) => quote(buf, |buf| buf.append_duration(*d)),
            Value::Time(t) => quote(buf, |buf| buf.append_time(t, TimeFlags::RFC3339_NANO)),
            Value::Error(msg) => buf.append_html_quote(msg),
            Value::Bytes(v) => quote(buf, |buf| buf.append_base64(v)),
            Value::Bools(v) => append_list(buf, v, |buf, e| buf.append_bool(*e)),
            Value::Ints(v) => append_list(buf, v, |buf, e| buf.append_int(*e)),
            Value::Uints(v) => append_list(buf, v, |buf, e| buf.append_uint(*e)),
            Value::F32s(v) => append_list(buf, v, |buf, e| buf.append_f32(*e)),
            Value::F64s(v) => append_list(buf, v, |buf, e| buf.append_f64(*e)),
            Value::Complex64s(v) => append_list(buf, v, |buf, (re, im)| {
                quote(buf, |buf| buf.append_complex64(*re, *im))
            }),
            Value::Complex128s(v) => append_list(buf, v, |buf, (re, im)| {
                quote(buf, |buf| buf.append_complex128(*re, *im))
            }),
            Value::Strs(v) => append_list(buf, v, |buf, e| buf.append_html_quote(e)),
            Value::Object(fields) => append_object(buf, fields)?,
            Value::Objects(objects) => {
                buf.push_byte(b'[');
                for (i, fields) in objects.iter().enumerate() {
                    if i > 0 {
                        buf.push_byte(b',');
                    }
                    append_object(buf, fields)?;
                }
                buf.push_byte(b']');
            }
            Value::Field(field) => {
                buf.push_byte(b'{');
                field.append_to(buf)?;
                buf.push_byte(b'}');
            }
            Value::Any(v) => v.encode(buf)?,
        }
        Ok(())
    }
}

#[inline]
fn quote(buf: &mut Buffer, body: impl FnOnce(&mut Buffer)) {
    buf.push_byte(b'"');
    body(buf);
    buf.push_byte(b'"');
}

fn append_list<T>(buf: &mut Buffer, items: &[T], mut each: impl FnMut(&mut Buffer, &T)) {
    buf.push_byte(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push_byte(b',');
        }
        each(buf, item);
    }
    buf.push_byte(b']');
}

fn append_object(buf: &mut Buffer, fields: &[Field]) -> Result<()> {
    buf.push_byte(b'{');
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buf.push_byte(b',');
        }
        field.append_to(buf)?;
    }
    buf.push_byte(b'}');
    Ok(())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Any(_) => f.write_str("Any(..)"),
            other => {
                let mut buf = Buffer::new();
                match other.append_json(&mut buf) {
                    Ok(()) => f.write_str(&String::from_utf8_lossy(buf.as_bytes())),
                    Err(_) => f.write_str("<unencodable>"),
                }
            }
        }
    }
}

macro_rules! from_scalar {
    ($variant:ident($target:ty): $($src:ty),+) => {
        $(
            impl From<$src> for Value {
                #[inline]
                fn from(v: $src) -> Value {
                    Value::$variant(v as $target)
                }
            }

            impl From<&$src> for Value {
                #[inline]
                fn from(v: &$src) -> Value {
                    Value::$variant(*v as $target)
                }
            }
        )+
    };
}

from_scalar!(Int(i64): i8, i16, i32, i64, isize);
from_scalar!(Uint(u64): u8, u16, u32, u64, usize);
from_scalar!(F32(f32): f32);
from_scalar!(F64(f64): f64);

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<&bool> for Value {
    fn from(v: &bool) -> Value {
        Value::Bool(*v)
    }
}

macro_rules! from_slice {
    ($variant:ident($target:ty): $($src:ty),+) => {
        $(
            impl From<Vec<$src>> for Value {
                fn from(v: Vec<$src>) -> Value {
                    Value::$variant(v.into_iter().map(|e| e as $target).collect())
                }
            }

            impl From<&[$src]> for Value {
                fn from(v: &[$src]) -> Value {
                    Value::$variant(v.iter().map(|&e| e as $target).collect())
                }
            }
        )+
    };
}

from_slice!(Ints(i64): i8, i16, i32, i64, isize);
from_slice!(Uints(u64): u16, u32, u64, usize);
from_slice!(F32s(f32): f32);
from_slice!(F64s(f64): f64);

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Value {
        Value::Bools(v)
    }
}

impl From<&[bool]> for Value {
    fn from(v: &[bool]) -> Value {
        Value::Bools(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Value {
        Value::Bytes(v.to_vec())
    }
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Value {
        Value::Str(Cow::Borrowed(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(Cow::Owned(v))
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Value {
        Value::Str(Cow::Owned(v.clone()))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(v: Cow<'static, str>) -> Value {
        Value::Str(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Value {
        Value::Strs(v.into_iter().map(Cow::Owned).collect())
    }
}

impl From<Vec<&'static str>> for Value {
    fn from(v: Vec<&'static str>) -> Value {
        Value::Strs(v.into_iter().map(Cow::Borrowed).collect())
    }
}

impl From<&[&'static str]> for Value {
    fn from(v: &[&'static str]) -> Value {
        Value::Strs(v.iter().map(|&s| Cow::Borrowed(s)).collect())
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Value {
        Value::Duration(delta_nanos(v))
    }
}

impl From<std::time::Duration> for Value {
    fn from(v: std::time::Duration) -> Value {
        Value::Duration(i64::try_from(v.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Value {
        Value::Time(v.fixed_offset())
    }
}

impl<Tz: TimeZone> From<&DateTime<Tz>> for Value {
    fn from(v: &DateTime<Tz>) -> Value {
        Value::Time(v.fixed_offset())
    }
}

impl From<Field> for Value {
    fn from(v: Field) -> Value {
        Value::Field(Box::new(v))
    }
}

impl From<Vec<Field>> for Value {
    fn from(v: Vec<Field>) -> Value {
        Value::Object(v)
    }
}

impl From<Vec<Vec<Field>>> for Value {
    fn from(v: Vec<Vec<Field>>) -> Value {
        Value::Objects(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(v: impl Into<Value>) -> String {
        let mut buf = Buffer::new();
        v.into().append_json(&mut buf).unwrap();
        String::from_utf8(buf.into_inner()).unwrap()
    }

    #[test]
    fn test_nil_and_empty_slices() {
        assert_eq!(render(None::<Vec<i32>>), "null");
        assert_eq!(render(Vec::<i32>::new()), "[]");
        assert_eq!(render(vec![1i8, -2]), "[1,-2]");
    }

    #[test]
    fn test_bytes_are_base64() {
        assert_eq!(render(b"hello".as_slice()), r#""aGVsbG8=""#);
        assert_eq!(render(7u8), "7");
    }

    #[test]
    fn test_pointer_unquoted() {
        assert_eq!(render(Value::Pointer(0xdead)), "0xdead");
    }
}
