//! Reusable transfer buffers.
//!
//! # Responsibilities
//! - Hand out fixed-size buffers for relay copy loops
//! - Take buffers back when the copy loop is done with them
//! - Track how many buffers are checked out (leak detection in tests)

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A pool of fixed-size transfer buffers.
///
/// Buffers are recycled between relays to avoid per-request heap churn.
/// Checked-out buffers are wrapped in [`PooledBuffer`], which returns the
/// allocation on drop, so the pool is restored on every exit path.
pub struct BufferPool {
    idle: Mutex<Vec<Box<[u8]>>>,
    buffer_size: usize,
    outstanding: AtomicUsize,
}

impl BufferPool {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            buffer_size,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Borrow a buffer, reusing an idle one when available.
    pub fn checkout(self: &Arc<Self>) -> PooledBuffer {
        let recycled = self
            .idle
            .lock()
            .expect("buffer pool mutex poisoned")
            .pop();
        let buf = recycled.unwrap_or_else(|| vec![0u8; self.buffer_size].into_boxed_slice());
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    /// Number of buffers currently checked out.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Number of idle buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().expect("buffer pool mutex poisoned").len()
    }

    /// Size of each buffer in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn put_back(&self, buf: Box<[u8]>) {
        self.idle
            .lock()
            .expect("buffer pool mutex poisoned")
            .push(buf);
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A transfer buffer on loan from a [`BufferPool`].
pub struct PooledBuffer {
    buf: Option<Box<[u8]>>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_ref().expect("buffer already returned")
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut().expect("buffer already returned")
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put_back(buf);
        }
    }
}
