//! Free-list of reusable [`Buffer`]s.
//!
//! Every entry is rendered into a buffer taken from a pool and handed back once the sink
//! write has completed. The guard returned by [`BufferPool::get`] gives the buffer back when
//! it goes out of scope, so early returns and `?` on error paths never leak a buffer.

use std::ops::{Deref, DerefMut};

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::buffer::Buffer;

const DEFAULT_INITIAL_CAPACITY: usize = 512;
const DEFAULT_MAX_RETAINED: usize = 64;
const DEFAULT_MAX_CAPACITY: usize = 64 * 1024;

lazy_static! {
    /// Pool shared by every core in the process.
    static ref GLOBAL_POOL: BufferPool = BufferPool::new();
}

/// Returns the process-wide pool used by the write path.
pub fn global() -> &'static BufferPool {
    &GLOBAL_POOL
}

/// A thread-safe free-list of buffers.
///
/// Buffers that grew beyond `max_capacity` while in use are dropped on release instead of
/// being kept, and at most `max_retained` idle buffers are held at any time.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Buffer>>,
    initial_capacity: usize,
    max_retained: usize,
    max_capacity: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_limits(
            DEFAULT_INITIAL_CAPACITY,
            DEFAULT_MAX_RETAINED,
            DEFAULT_MAX_CAPACITY,
        )
    }

    /// Creates a pool with explicit sizing.
    ///
    /// # Arguments
    ///
    /// * `initial_capacity` - Capacity of freshly allocated buffers
    /// * `max_retained` - Upper bound on idle buffers kept for reuse
    /// * `max_capacity` - Buffers larger than this are freed on release
    pub fn with_limits(initial_capacity: usize, max_retained: usize, max_capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_retained)),
            initial_capacity,
            max_retained,
            max_capacity,
        }
    }

    /// Takes an empty buffer from the pool, allocating one if none is idle.
    pub fn get(&self) -> PooledBuffer<'_> {
        let buf = self.free.lock().pop();
        let mut buf = buf.unwrap_or_else(|| Buffer::with_capacity(self.initial_capacity));
        buf.reset();
        PooledBuffer {
            buf: Some(buf),
            pool: self,
        }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn put(&self, buf: Buffer) {
        if buf.capacity() > self.max_capacity {
            tracing::trace!(
                target: "bytelog",
                capacity = buf.capacity(),
                "discarding oversized pooled buffer"
            );
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer on loan from a [`BufferPool`]. Dereferences to [`Buffer`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    buf: Option<Buffer>,
    pool: &'a BufferPool,
}

impl PooledBuffer<'_> {
    /// Keeps the buffer instead of returning it to the pool.
    pub fn detach(mut self) -> Buffer {
        self.buf.take().unwrap_or_default()
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        match &self.buf {
            Some(buf) => buf,
            None => unreachable!("pooled buffer used after release"),
        }
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Buffer {
        match &mut self.buf {
            Some(buf) => buf,
            None => unreachable!("pooled buffer used after release"),
        }
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_returned_on_drop() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.get();
            buf.push_str("hello");
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.get();
        assert!(buf.is_empty(), "reused buffer must be reset");
        assert!(buf.capacity() >= 5);
    }

    #[test]
    fn test_oversized_buffer_dropped() {
        let pool = BufferPool::with_limits(8, 4, 16);
        {
            let mut buf = pool.get();
            buf.push_bytes(&[b'x'; 64]);
        }
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_retention_bounded() {
        let pool = BufferPool::with_limits(8, 2, 1024);
        let guards: Vec<_> = (0..5).map(|_| pool.get()).collect();
        drop(guards);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_detach_keeps_contents() {
        let pool = BufferPool::new();
        let mut buf = pool.get();
        buf.push_str("kept");
        let owned = buf.detach();
        assert_eq!(owned.as_bytes(), b"kept");
        assert_eq!(pool.idle(), 0);
    }
}
