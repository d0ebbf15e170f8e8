//! # bytelog
//!
//! A structured logging library built around a reusable byte buffer and specialized,
//! reflection-free encoders:
//!
//! * **Fast rendering**: integers, floats, timestamps, durations and escaped strings are
//!   appended straight into a pooled buffer with no intermediate allocation
//! * **Typed fields**: key/value pairs whose values are dispatched through a closed enum, with a
//!   serde fallback for arbitrary structured data
//! * **Composable output**: level-gated cores pair an encoder with a sink and can be teed
//!   into one
//!
//! ## Main Components
//!
//! * `Buffer`: Growable byte accumulator with the append operations
//! * `Value` / `Field`: Typed field values and their JSON rendering
//! * `ConsoleEncoder` / `JsonEncoder`: Entry layouts
//! * `WriteCore` / `tee`: Level-gated writing and fan-out
//! * `Logger`: Leveled façade with named loggers, inherited fields and caller capture
//! * `global`, `config`, `bridge`: Process-wide logger, TOML setup and the `log` crate bridge
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use bytelog::{info, ConsoleEncoder, Flags, Level, Locked, Logger, WriteCore};
//!
//! let out = Arc::new(Locked::new(Vec::new()));
//! let core = WriteCore::new(ConsoleEncoder::new(Flags::empty()), out.clone(), Level::INFO);
//! let logger = Logger::new(Arc::new(core)).named("api");
//!
//! info!(logger, "served {} requests", 3; "status" => 200, "path" => "/health");
//!
//! let text = String::from_utf8(out.lock().clone()).unwrap();
//! assert_eq!(
//!     text,
//!     "INFO api: served 3 requests\n -  {\"status\":200,\"path\":\"/health\"}\n"
//! );
//! ```

mod flags;

pub mod bridge;
pub mod buffer;
pub mod caller_cache;
pub mod config;
pub mod core;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod field;
pub mod global;
pub mod json;
pub mod level;
pub mod logger;
pub mod pool;
pub mod sink;
pub mod timefmt;
pub mod value;

pub use buffer::Buffer;
pub use config::LogConfig;
pub use crate::core::{tee, Core, FanoutCore, NopCore, WriteCore};
pub use encoder::{ConsoleEncoder, Encoder, Flags, JsonEncoder};
pub use entry::{CallSite, Entry, EntryCaller};
pub use error::{Error, MultiError, Result};
pub use field::Field;
pub use level::{Level, LevelEnabler, ParseLevelError};
pub use logger::Logger;
pub use pool::{BufferPool, PooledBuffer};
pub use sink::{Discard, Locked, MultiSink, Sink};
pub use timefmt::TimeFlags;
pub use value::{Structural, Value};
