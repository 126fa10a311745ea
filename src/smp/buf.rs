//! Fixed-capacity packet buffers.
//!
//! A `BufferPool` owns `count` equally sized byte regions. `alloc`
//! hands one out as a `NetBuf<U>` carrying a typed user-data slot
//! (peer address, connection handle...). Dropping the `NetBuf` returns
//! its storage to the pool, so each buffer is freed exactly once on
//! whichever path touches it last.
//!
//! ```text
//!  storage: ┌──────────┬────────────────────┬──────────────┐
//!           │ consumed │ data (head..+len)  │  tailroom    │
//!           └──────────┴────────────────────┴──────────────┘
//! ```

use core::cell::RefCell;
use core::fmt;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::SmpConfig;
use crate::error::MgmtError;

struct PoolInner {
    free: Mutex<CriticalSectionRawMutex, RefCell<Vec<Box<[u8]>>>>,
    buffer_size: usize,
    count: usize,
}

/// Shared pool of packet buffers. Cloning yields another handle to the
/// same pool.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    pub fn new(count: usize, buffer_size: usize) -> Self {
        let free: Vec<Box<[u8]>> = (0..count)
            .map(|_| vec![0u8; buffer_size].into_boxed_slice())
            .collect();
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(RefCell::new(free)),
                buffer_size,
                count,
            }),
        }
    }

    pub fn from_config(config: &SmpConfig) -> Self {
        Self::new(config.netbuf_count, config.netbuf_size)
    }

    /// Take a buffer from the pool. Never blocks; `None` when exhausted.
    pub fn alloc<U: Default>(&self) -> Option<NetBuf<U>> {
        let storage = self.inner.free.lock(|free| free.borrow_mut().pop())?;
        Some(NetBuf {
            storage,
            head: 0,
            len: 0,
            user_data: U::default(),
            pool: self.clone(),
        })
    }

    /// Buffers currently free.
    pub fn available(&self) -> usize {
        self.inner.free.lock(|free| free.borrow().len())
    }

    /// Total buffers owned by the pool.
    pub fn count(&self) -> usize {
        self.inner.count
    }

    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }

    fn release(&self, storage: Box<[u8]>) {
        self.inner.free.lock(|free| free.borrow_mut().push(storage));
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.inner.buffer_size)
            .field("count", &self.inner.count)
            .field("available", &self.available())
            .finish()
    }
}

/// Packet buffer borrowed from a [`BufferPool`].
pub struct NetBuf<U> {
    storage: Box<[u8]>,
    head: usize,
    len: usize,
    user_data: U,
    pool: BufferPool,
}

impl<U> NetBuf<U> {
    pub fn data(&self) -> &[u8] {
        &self.storage[self.head..self.head + self.len]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.head..self.head + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total storage size.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes that can still be appended.
    pub fn tailroom(&self) -> usize {
        self.storage.len() - self.head - self.len
    }

    /// Append `bytes` after the current data.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), MgmtError> {
        if bytes.len() > self.tailroom() {
            return Err(MgmtError::TooLarge);
        }
        let end = self.head + self.len;
        self.storage[end..end + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Consume `n` bytes from the front (clamped to the data length).
    pub fn pull(&mut self, n: usize) {
        let n = n.min(self.len);
        self.head += n;
        self.len -= n;
    }

    /// Forget all data; the whole storage becomes tailroom again.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn user_data(&self) -> &U {
        &self.user_data
    }

    pub fn user_data_mut(&mut self) -> &mut U {
        &mut self.user_data
    }

    pub fn set_user_data(&mut self, user_data: U) {
        self.user_data = user_data;
    }

    /// Whole storage, used by the engine to encode a response in place
    /// after a [`reset`](Self::reset).
    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// Mark the first `len` storage bytes as data.
    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.storage.len());
        self.head = 0;
        self.len = len.min(self.storage.len());
    }
}

impl<U> Drop for NetBuf<U> {
    fn drop(&mut self) {
        let storage = core::mem::take(&mut self.storage);
        self.pool.release(storage);
    }
}

impl<U> fmt::Debug for NetBuf<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetBuf")
            .field("len", &self.len)
            .field("capacity", &self.storage.len())
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────
