//! Byte destinations for rendered entries.
//!
//! A [`Sink`] receives each complete rendering in a single `write` call and may be asked to
//! flush buffered data with `sync`. Sinks are shared between threads, so implementations
//! that wrap a plain [`io::Write`] must serialize access themselves; [`Locked`] does this
//! with a mutex.

use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// A destination for encoded entries.
pub trait Sink: Send + Sync {
    /// Writes `buf`, returning how many bytes were accepted.
    ///
    /// Anything less than `buf.len()` is reported by the core as a short write, so adapters
    /// over [`io::Write`] keep writing until the whole buffer is taken.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Whether [`sync`](Sink::sync) does anything. Checked once when a core is built.
    fn can_sync(&self) -> bool {
        false
    }

    /// Flushes any buffered data to durable storage.
    fn sync(&self) -> io::Result<()> {
        Ok(())
    }

    /// The sinks this one fans out to, if it is a [`MultiSink`].
    fn children(&self) -> Option<&[Arc<dyn Sink>]> {
        None
    }
}

/// Serializes writes to a plain writer. `sync` flushes it.
#[derive(Debug, Default)]
pub struct Locked<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> Locked<W> {
    pub fn new(writer: W) -> Self {
        Locked {
            inner: Mutex::new(writer),
        }
    }

    /// Grants direct access to the wrapped writer.
    pub fn lock(&self) -> MutexGuard<'_, W> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: Write + Send> Sink for Locked<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn can_sync(&self) -> bool {
        true
    }

    fn sync(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// Duplicates every write to several sinks.
///
/// All sinks are attempted even when some fail. The reported count is the full length when
/// every sink took every byte; otherwise the failures are combined into one error.
#[derive(Clone, Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    /// Builds a multi-sink. Nested multi-sinks are flattened into this one.
    pub fn new(sinks: impl IntoIterator<Item = Arc<dyn Sink>>) -> Self {
        let mut flat = Vec::new();
        for sink in sinks {
            match sink.children() {
                Some(children) => flat.extend(children.iter().cloned()),
                None => flat.push(sink),
            }
        }
        MultiSink { sinks: flat }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for MultiSink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut errors = Vec::new();
        for sink in &self.sinks {
            match sink.write(buf) {
                Ok(n) if n < buf.len() => errors.push(format!(
                    "short write: {} of {} bytes written",
                    n,
                    buf.len()
                )),
                Ok(_) => {}
                Err(err) => errors.push(err.to_string()),
            }
        }
        match errors.len() {
            0 => Ok(buf.len()),
            _ => Err(io::Error::other(errors.join("; "))),
        }
    }

    fn can_sync(&self) -> bool {
        self.sinks.iter().any(|s| s.can_sync())
    }

    fn sync(&self) -> io::Result<()> {
        let errors: Vec<String> = self
            .sinks
            .iter()
            .filter(|s| s.can_sync())
            .filter_map(|s| s.sync().err())
            .map(|err| err.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(io::Error::other(errors.join("; ")))
        }
    }

    fn children(&self) -> Option<&[Arc<dyn Sink>]> {
        Some(&self.sinks)
    }
}

/// Accepts and drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Sink for Discard {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
}

impl Sink for io::Stdout {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn can_sync(&self) -> bool {
        true
    }

    fn sync(&self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl Sink for io::Stderr {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn can_sync(&self) -> bool {
        true
    }

    fn sync(&self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl Sink for File {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        // `&File` is itself a writer; the OS serializes appends.
        (&*self).write_all(buf)?;
        Ok(buf.len())
    }

    fn can_sync(&self) -> bool {
        true
    }

    fn sync(&self) -> io::Result<()> {
        self.sync_all()
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn can_sync(&self) -> bool {
        (**self).can_sync()
    }

    fn sync(&self) -> io::Result<()> {
        (**self).sync()
    }

    fn children(&self) -> Option<&[Arc<dyn Sink>]> {
        (**self).children()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn can_sync(&self) -> bool {
        (**self).can_sync()
    }

    fn sync(&self) -> io::Result<()> {
        (**self).sync()
    }

    fn children(&self) -> Option<&[Arc<dyn Sink>]> {
        (**self).children()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Half;

    impl Sink for Half {
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len() / 2)
        }
    }

    #[test]
    fn test_multi_sink_flattens() {
        let inner: Arc<dyn Sink> = Arc::new(MultiSink::new([
            Arc::new(Discard) as Arc<dyn Sink>,
            Arc::new(Discard),
        ]));
        let outer = MultiSink::new([inner, Arc::new(Discard) as Arc<dyn Sink>]);
        assert_eq!(outer.len(), 3);
    }

    #[test]
    fn test_multi_sink_reports_short_write() {
        let multi = MultiSink::new([Arc::new(Discard) as Arc<dyn Sink>, Arc::new(Half)]);
        let err = multi.write(b"abcd").unwrap_err();
        assert_eq!(err.to_string(), "short write: 2 of 4 bytes written");
    }

    /// Takes at most 16 bytes per call, as pipes and sockets may.
    struct Trickle(Vec<u8>);

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(16);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_locked_writes_whole_buffer_to_partial_writer() {
        let sink = Locked::new(Trickle(Vec::new()));
        let line = b"INFO a message longer than one chunk\n";
        assert_eq!(sink.write(line).unwrap(), line.len());
        assert_eq!(sink.lock().0.as_slice(), line);
    }

    #[test]
    fn test_locked_collects_bytes() {
        let sink = Locked::new(Vec::new());
        assert_eq!(sink.write(b"one ").unwrap(), 4);
        sink.write(b"two").unwrap();
        assert!(sink.can_sync());
        sink.sync().unwrap();
        assert_eq!(sink.lock().as_slice(), b"one two");
    }
}
