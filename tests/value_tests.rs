use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use bytelog::{Buffer, Error, Field, Value};
use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Timelike, Utc};
use serde::Serialize;

fn render(v: impl Into<Value>) -> String {
    let mut buf = Buffer::new();
    v.into().append_json(&mut buf).unwrap();
    String::from_utf8(buf.into_inner()).unwrap()
}

#[derive(Serialize)]
struct Emb {
    #[serde(rename = "F")]
    f: f64,
}

#[derive(Serialize)]
struct Age {
    #[serde(rename = "Year")]
    year: u32,
}

#[derive(Serialize)]
struct Person {
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    nick: Option<&'static str>,
    emb: Emb,
    #[serde(rename = "Emb2")]
    emb2: Emb,
    #[serde(flatten)]
    age: Age,
    #[serde(rename = "Son")]
    son: Age,
    #[serde(skip)]
    #[allow(dead_code)]
    password: String,
    #[serde(rename = "F64", serialize_with = "bytelog::json::quoted")]
    f64: f64,
}

fn person() -> Person {
    Person {
        name: "chj",
        nick: None,
        emb: Emb { f: 1.1 },
        emb2: Emb { f: 9.9 },
        age: Age { year: 45 },
        son: Age { year: 17 },
        password: "hunter2".to_string(),
        f64: 2.1,
    }
}

struct Broken;

impl Serialize for Broken {
    fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cannot encode Broken"))
    }
}

#[derive(Debug)]
struct Refused;

impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection <refused> & closed")
    }
}

impl std::error::Error for Refused {}

#[test]
fn test_scalar_values() {
    assert_eq!(render(Value::Null), "null");
    assert_eq!(render(true), "true");
    assert_eq!(render(-8i8), "-8");
    assert_eq!(render(i64::MIN), "-9223372036854775808");
    assert_eq!(render(65535u16), "65535");
    assert_eq!(render(u64::MAX), "18446744073709551615");
    assert_eq!(render(12usize), "12");
    assert_eq!(render(3.2f32), "3.2");
    assert_eq!(render(6.4f64), "6.4");
    assert_eq!(render(1e21f64), "1e+21");
    assert_eq!(render(Value::complex64(3.2, 3.3)), r#""3.2+3.3i""#);
    assert_eq!(render(Value::complex128(1.5, 0.25)), r#""1.5+0.25i""#);
    assert_eq!(render(Value::Pointer(0xc000010000)), "0xc000010000");
}

#[test]
fn test_pointer_from_reference() {
    let x = 42u32;
    let ptr: *const u32 = &x;
    let want = format!("{:#x}", ptr as usize);
    assert_eq!(render(Value::pointer(ptr)), want);
}

#[test]
fn test_strings_are_html_safe() {
    assert_eq!(render("plain"), r#""plain""#);
    assert_eq!(render(String::from("tab\tend")), r#""tab\tend""#);
    assert_eq!(
        render("<script>&"),
        r#""\u003cscript\u003e\u0026""#
    );
    let owned = String::from("borrowed");
    assert_eq!(render(&owned), r#""borrowed""#);
    assert_eq!(render(Cow::Borrowed("cow")), r#""cow""#);
}

#[test]
fn test_byte_values_are_base64() {
    assert_eq!(render(vec![100u8, 110, 120]), r#""ZG54""#);
    assert_eq!(
        render(&[0x45u8, 0x56, 0x99, 0xf8, 0xff, 0x00][..]),
        r#""RVaZ+P8A""#
    );
    assert_eq!(
        render(b"any + old & data".to_vec()),
        r#""YW55ICsgb2xkICYgZGF0YQ==""#
    );
}

#[test]
fn test_durations_and_times() {
    assert_eq!(render(Value::Duration(99_988_834_500)), r#""1m39.9888345s""#);
    assert_eq!(render(Duration::from_millis(1500)), r#""1.5s""#);
    assert_eq!(render(TimeDelta::microseconds(-20)), r#""-20µs""#);

    let utc = Utc
        .with_ymd_and_hms(2019, 1, 18, 12, 0, 35)
        .unwrap()
        .with_nanosecond(9876)
        .unwrap();
    assert_eq!(render(utc), r#""2019-01-18T12:00:35.000009876Z""#);

    let shanghai = FixedOffset::east_opt(8 * 3600)
        .unwrap()
        .with_ymd_and_hms(2019, 1, 18, 20, 0, 35)
        .unwrap();
    assert_eq!(render(&shanghai), r#""2019-01-18T20:00:35+08:00""#);
}

#[derive(Serialize)]
struct Audit {
    #[serde(serialize_with = "bytelog::json::rfc3339_nano")]
    at: DateTime<Utc>,
    #[serde(serialize_with = "bytelog::json::rfc3339_nano")]
    local: DateTime<FixedOffset>,
}

#[test]
fn test_times_inside_structures_match_time_fields() {
    let at = Utc
        .with_ymd_and_hms(2019, 1, 18, 12, 0, 35)
        .unwrap()
        .with_nanosecond(120_000_000)
        .unwrap();
    let local = at.with_timezone(&FixedOffset::east_opt(8 * 3600).unwrap());

    assert_eq!(render(at), r#""2019-01-18T12:00:35.12Z""#);
    assert_eq!(render(Value::any(at)), render(at));
    assert_eq!(
        render(Value::any(Audit { at, local })),
        r#"{"at":"2019-01-18T12:00:35.12Z","local":"2019-01-18T20:00:35.12+08:00"}"#
    );
}

#[test]
fn test_slices() {
    assert_eq!(render(vec![true, false]), "[true,false]");
    assert_eq!(render(&[1i32, -2, 3][..]), "[1,-2,3]");
    assert_eq!(render(vec![7u32, 8]), "[7,8]");
    assert_eq!(render(vec![0.5f32, 3.2]), "[0.5,3.2]");
    assert_eq!(render(vec![1e-7f64, 2.0]), "[1e-7,2]");
    assert_eq!(
        render(Value::Complex64s(vec![(1.0, 2.0), (3.5, 4.0)])),
        r#"["1+2i","3.5+4i"]"#
    );
    assert_eq!(render(vec!["a", "<b>"]), r#"["a","\u003cb\u003e"]"#);
    assert_eq!(render(vec![String::from("x")]), r#"["x"]"#);
    assert_eq!(render(Vec::<f64>::new()), "[]");
    assert_eq!(render(None::<Vec<bool>>), "null");
    assert_eq!(render(Some(5i64)), "5");
}

#[test]
fn test_nested_fields() {
    let object = vec![Field::new("id", 7), Field::new("ok", true)];
    assert_eq!(render(object), r#"{"id":7,"ok":true}"#);

    let objects = vec![
        vec![Field::new("n", 1)],
        vec![Field::new("n", 2), Field::new("tag", "b")],
        vec![],
    ];
    assert_eq!(render(objects), r#"[{"n":1},{"n":2,"tag":"b"},{}]"#);

    assert_eq!(render(Field::new("inner", "v")), r#"{"inner":"v"}"#);

    let deep = Field::new(
        "outer",
        vec![Field::new("mid", vec![Field::new("leaf", 1.5)])],
    );
    assert_eq!(deep.to_string(), r#""outer":{"mid":{"leaf":1.5}}"#);
}

#[test]
fn test_structural_values() {
    assert_eq!(
        render(Value::any(person())),
        r#"{"name":"chj","emb":{"F":1.1},"Emb2":{"F":9.9},"Year":45,"Son":{"Year":17},"F64":"2.1"}"#
    );

    let mut map = BTreeMap::new();
    map.insert("b", vec![1, 2]);
    map.insert("a&", vec![]);
    assert_eq!(render(Value::any(map)), r#"{"a\u0026":[],"b":[1,2]}"#);

    assert_eq!(render(Value::any(())), "null");
    assert_eq!(render(Value::any(0.0000001f64)), "1e-7");
}

#[test]
fn test_error_values() {
    assert_eq!(
        render(Value::error(&Refused)),
        r#""connection \u003crefused\u003e \u0026 closed""#
    );
    assert_eq!(
        Field::error("err", &Refused).to_string(),
        r#""err":"connection \u003crefused\u003e \u0026 closed""#
    );
}

#[test]
fn test_field_keys_use_plain_quoting() {
    assert_eq!(Field::new("a<b", 1).to_string(), r#""a<b":1"#);
    assert_eq!(Field::new("line\nbreak", 1).to_string(), r#""line\nbreak":1"#);
    assert_eq!(Field::new(String::from("owned"), 2).key(), "owned");
}

#[test]
fn test_failed_value_is_removed() {
    let mut buf = Buffer::new();
    buf.push_str("prefix,");
    let err = Field::any("bad", Broken).append_to(&mut buf).unwrap_err();
    assert_eq!(buf.as_str().unwrap(), "prefix,");
    match err {
        Error::Encode { key, source } => {
            assert_eq!(key, "bad");
            assert!(matches!(*source, Error::Json(_)));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(Field::any("bad", Broken).to_string(), "");
}

#[test]
fn test_non_finite_floats_are_rejected() {
    let mut buf = Buffer::new();
    buf.push_str("{");
    let err = Field::any("x", vec![1.0, f64::NAN]).append_to(&mut buf).unwrap_err();
    assert_eq!(buf.as_str().unwrap(), "{");
    match err {
        Error::Encode { key, source } => {
            assert_eq!(key, "x");
            assert!(source.to_string().contains("unsupported value: NaN"));
        }
        other => panic!("unexpected error {:?}", other),
    }

    let mut buf = Buffer::new();
    assert!(Value::any(f32::INFINITY).append_json(&mut buf).is_err());
    assert!(buf.is_empty());
    assert!(Value::any(Some(f64::NEG_INFINITY)).append_json(&mut buf).is_err());
    assert!(buf.is_empty());

    // Dedicated float variants are unaffected.
    assert_eq!(render(f64::NAN), "NaN");
}

#[test]
fn test_failure_inside_object_drops_whole_object() {
    let nested = Field::new(
        "req",
        vec![Field::new("id", 1), Field::any("body", Broken)],
    );
    let mut buf = Buffer::new();
    let err = nested.append_to(&mut buf).unwrap_err();
    assert!(buf.is_empty());
    match err {
        Error::Encode { key, source } => {
            assert_eq!(key, "req");
            assert!(matches!(*source, Error::Encode { ref key, .. } if key == "body"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_debug_shows_json() {
    assert_eq!(format!("{:?}", Value::from("hi")), r#""hi""#);
    assert_eq!(format!("{:?}", Value::from(vec![1u16, 2])), "[1,2]");
    assert_eq!(format!("{:?}", Value::any(1)), "Any(..)");
}
