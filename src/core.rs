//! Level-gated rendering and writing.
//!
//! A [`Core`] is the minimal logging interface the [`Logger`](crate::Logger) façade is built
//! on: it answers whether a level is enabled, and renders and writes entries it is handed.
//! [`WriteCore`] pairs one encoder with one sink; [`tee`] combines several cores into one.

use std::sync::Arc;

use crate::encoder::Encoder;
use crate::entry::Entry;
use crate::error::{combine, Error, Result};
use crate::level::{Level, LevelEnabler};
use crate::pool;
use crate::sink::Sink;

/// A level-gated destination for entries.
pub trait Core: LevelEnabler {
    /// Renders and writes `entry`.
    ///
    /// Always writes; callers are expected to have checked [`enabled`](LevelEnabler::enabled)
    /// first.
    fn write(&self, entry: &Entry<'_>) -> Result<()>;

    /// Flushes buffered output, if any.
    fn sync(&self) -> Result<()>;

    /// The cores a fan-out writes to. `None` for every other core.
    fn children(&self) -> Option<&[Arc<dyn Core>]> {
        None
    }
}

/// A core that enables nothing and writes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopCore;

impl LevelEnabler for NopCore {
    fn enabled(&self, _level: Level) -> bool {
        false
    }
}

impl Core for NopCore {
    fn write(&self, _entry: &Entry<'_>) -> Result<()> {
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Renders entries with one [`Encoder`] and writes them to one [`Sink`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use bytelog::{Core, Entry, Flags, JsonEncoder, Level, LevelEnabler, Locked, WriteCore};
///
/// let out = Arc::new(Locked::new(Vec::new()));
/// let core = WriteCore::new(JsonEncoder::new(Flags::empty()), out.clone(), Level::INFO);
///
/// assert!(!core.enabled(Level::DEBUG));
/// core.write(&Entry::new(Level::INFO, "ready")).unwrap();
/// assert!(out.lock().ends_with(b",\"msg\":\"ready\"}\n"));
/// ```
pub struct WriteCore {
    encoder: Box<dyn Encoder>,
    sink: Box<dyn Sink>,
    enabler: Box<dyn LevelEnabler>,
    can_sync: bool,
}

impl WriteCore {
    pub fn new<E, S, L>(encoder: E, sink: S, enabler: L) -> Self
    where
        E: Encoder + 'static,
        S: Sink + 'static,
        L: LevelEnabler + 'static,
    {
        let can_sync = sink.can_sync();
        WriteCore {
            encoder: Box::new(encoder),
            sink: Box::new(sink),
            enabler: Box::new(enabler),
            can_sync,
        }
    }
}

impl LevelEnabler for WriteCore {
    fn enabled(&self, level: Level) -> bool {
        self.enabler.enabled(level)
    }
}

impl Core for WriteCore {
    /// Renders `entry` into a pooled buffer and writes it in one call.
    ///
    /// The line is written even when some fields failed to render. Entries at `ERROR` and
    /// above are followed by a sync. Every failure along the way is returned together.
    fn write(&self, entry: &Entry<'_>) -> Result<()> {
        let mut buf = pool::global().get();
        let encoded = self.encoder.encode(&mut buf, entry);
        let written = match self.sink.write(buf.as_bytes()) {
            Ok(n) if n < buf.len() => Err(Error::ShortWrite {
                written: n,
                expected: buf.len(),
            }),
            Ok(_) => Ok(()),
            Err(err) => Err(Error::Io(err)),
        };
        drop(buf);

        let mut result = combine(encoded, written);
        if entry.level >= Level::ERROR {
            result = combine(result, self.sync());
        }
        result
    }

    fn sync(&self) -> Result<()> {
        if self.can_sync {
            self.sink.sync()?;
        }
        Ok(())
    }
}

const TABLE_SIZE: usize = (Level::MAX.as_i8() - Level::MIN.as_i8() + 3) as usize;

/// Index of `level` in a fan-out's level table, `None` when it is out of range.
#[inline]
fn slot(level: Level) -> Option<usize> {
    if level.is_valid() {
        Some((level.as_i8() - Level::MIN.as_i8() + 1) as usize)
    } else {
        None
    }
}

/// Writes every entry to several cores. Build with [`tee`].
pub struct FanoutCore {
    cores: Vec<Arc<dyn Core>>,
    levels: [bool; TABLE_SIZE],
}

impl FanoutCore {
    fn new(cores: Vec<Arc<dyn Core>>) -> Self {
        let mut flat: Vec<Arc<dyn Core>> = Vec::with_capacity(cores.len());
        for core in cores {
            match core.children() {
                Some(children) => flat.extend(children.iter().cloned()),
                None => flat.push(core),
            }
        }

        let mut levels = [false; TABLE_SIZE];
        for raw in Level::MIN.as_i8()..=Level::MAX.as_i8() {
            let level = Level::from_i8(raw);
            if let Some(i) = slot(level) {
                levels[i] = flat.iter().any(|c| c.enabled(level));
            }
        }

        tracing::debug!(target: "bytelog", cores = flat.len(), "built fan-out core");
        FanoutCore {
            cores: flat,
            levels,
        }
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}

impl LevelEnabler for FanoutCore {
    fn enabled(&self, level: Level) -> bool {
        slot(level).is_some_and(|i| self.levels[i])
    }
}

impl Core for FanoutCore {
    fn write(&self, entry: &Entry<'_>) -> Result<()> {
        self.cores
            .iter()
            .fold(Ok(()), |acc, core| combine(acc, core.write(entry)))
    }

    fn sync(&self) -> Result<()> {
        self.cores
            .iter()
            .fold(Ok(()), |acc, core| combine(acc, core.sync()))
    }

    fn children(&self) -> Option<&[Arc<dyn Core>]> {
        Some(&self.cores)
    }
}

/// Combines cores into one that duplicates every entry to each of them.
///
/// No cores gives a [`NopCore`] and a single core is returned unchanged. Fan-outs among
/// `cores` are flattened, and the set of enabled levels is computed once, here.
pub fn tee(mut cores: Vec<Arc<dyn Core>>) -> Arc<dyn Core> {
    if cores.len() <= 1 {
        return cores.pop().unwrap_or_else(|| Arc::new(NopCore));
    }
    Arc::new(FanoutCore::new(cores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_table_slots() {
        assert_eq!(TABLE_SIZE, 8);
        assert_eq!(slot(Level::DEBUG), Some(1));
        assert_eq!(slot(Level::FATAL), Some(6));
        assert_eq!(slot(Level::from_i8(-2)), None);
        assert_eq!(slot(Level::from_i8(5)), None);
    }
}
