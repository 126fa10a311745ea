//! Per-transport receive queue.
//!
//! Completed packets go from the receive path (producer, must not
//! block) to the worker (consumer) through a bounded FIFO. A `Signal`
//! wakes the worker whenever something is queued.
//!
//! ```text
//!  rx_req ──enqueue──▶ ┌───────────────────────┐ ──dequeue──▶ worker
//!                      │ Deque<NetBuf, DEPTH>  │
//!  remove_invalid ───▶ │ (cancel, filter, re-arm)
//!  clear ────────────▶ └───────────────────────┘
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Deque;

use super::buf::NetBuf;

/// Queue depth per transport.
pub const RX_QUEUE_DEPTH: usize = 8;

pub struct RxQueue<U> {
    fifo: Mutex<CriticalSectionRawMutex, RefCell<Deque<NetBuf<U>, RX_QUEUE_DEPTH>>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
    cancel: AtomicBool,
    stopped: AtomicBool,
}

impl<U> RxQueue<U> {
    pub fn new() -> Self {
        Self {
            fifo: Mutex::new(RefCell::new(Deque::new())),
            ready: Signal::new(),
            cancel: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Append a packet and wake the worker. A full queue hands the
    /// buffer back to the caller.
    pub fn enqueue(&self, buf: NetBuf<U>) -> Result<(), NetBuf<U>> {
        self.fifo.lock(|q| q.borrow_mut().push_back(buf))?;
        self.ready.signal(());
        Ok(())
    }

    pub fn dequeue_nonblocking(&self) -> Option<NetBuf<U>> {
        self.fifo.lock(|q| q.borrow_mut().pop_front())
    }

    pub fn len(&self) -> usize {
        self.fifo.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queued packet for which `keep` returns `false`.
    /// Survivors keep their relative order. Returns the number removed.
    pub fn purge_invalid(&self, mut keep: impl FnMut(&NetBuf<U>) -> bool) -> usize {
        self.cancel.store(true, Ordering::Release);

        let mut removed = Vec::new();
        let remaining = self.fifo.lock(|q| {
            let mut q = q.borrow_mut();
            for _ in 0..q.len() {
                let Some(buf) = q.pop_front() else { break };
                if keep(&buf) {
                    // Space was just freed by pop_front.
                    let _ = q.push_back(buf);
                } else {
                    removed.push(buf);
                }
            }
            q.len()
        });

        self.cancel.store(false, Ordering::Release);
        if remaining > 0 {
            self.ready.signal(());
        }
        // Buffers go back to the pool outside the queue lock.
        let count = removed.len();
        drop(removed);
        count
    }

    /// Drop every queued packet. Returns the number removed.
    pub fn clear(&self) -> usize {
        self.cancel.store(true, Ordering::Release);
        let removed: Vec<NetBuf<U>> = self.fifo.lock(|q| {
            let mut q = q.borrow_mut();
            core::iter::from_fn(|| q.pop_front()).collect()
        });
        self.cancel.store(false, Ordering::Release);
        removed.len()
    }

    /// A purge is running; the drain loop should yield.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Ask the worker to exit.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.ready.signal(());
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Wait until something was enqueued (or a stop was requested).
    pub async fn wait_ready(&self) {
        self.ready.wait().await;
    }
}

impl<U> Default for RxQueue<U> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────
