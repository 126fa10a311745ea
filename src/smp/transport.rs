//! Transport abstraction and per-transport SMP state.
//!
//! A concrete transport (UART, USB, BLE, UDP...) implements
//! [`Transport`] and wraps itself in an [`SmpTransport`], which owns the
//! reassembly context and receive queue for that transport instance.
//!
//! ```text
//!  fragments ─▶ reassembly_collect ─▶ reassembly_complete ─┐
//!  datagrams ─▶ rx_packet ─────────────────────────────────┤
//!                                                          ▼
//!                                         rx_req ─▶ RxQueue ─▶ worker
//!                                                                │
//!                             Transport::output ◀── SmpEngine ◀──┘
//! ```
//!
//! The engine is generic over `Transport`, so adding a new transport
//! requires no changes to the protocol logic.

use core::cell::RefCell;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, info, warn};

use super::buf::{BufferPool, NetBuf};
use super::codec::SmpHeader;
use super::engine::SmpEngine;
use super::queue::RxQueue;
use super::reassembly::Reassembler;
use crate::config::SmpConfig;
use crate::error::{MgmtError, ReassemblyError};
use crate::mgmt::registry::Registry;

/// Packet channel to one peer population.
pub trait Transport: Send + Sync {
    /// Per-packet metadata (peer address, connection handle...).
    /// Released by `Drop` when its buffer is freed.
    type UserData: Clone + Default + Send + 'static;

    /// Send one response packet. The buffer is consumed either way.
    fn output(&self, buf: NetBuf<Self::UserData>) -> Result<(), MgmtError>;

    /// Largest packet the peer of `buf` accepts; 0 when sending is
    /// currently impossible.
    fn get_mtu(&self, buf: &NetBuf<Self::UserData>) -> u16;

    /// Metadata for a response allocated for a request carrying `src`.
    fn copy_user_data(&self, src: &Self::UserData) -> Result<Self::UserData, MgmtError> {
        Ok(src.clone())
    }

    /// Whether a queued `buf` should still be processed. `arg` is the
    /// value passed to [`SmpTransport::remove_invalid`].
    fn is_still_valid(&self, _buf: &NetBuf<Self::UserData>, _arg: &Self::UserData) -> bool {
        true
    }
}

/// Client-side handler for READ_RSP/WRITE_RSP packets.
pub trait ResponseHandler: Send + Sync {
    fn on_response(&self, hdr: &SmpHeader, payload: &[u8]) -> Result<(), MgmtError>;
}

/// Transport that discards everything it is asked to send.
/// Useful as a default when no peer is connected.
#[derive(Debug, Default)]
pub struct NullTransport {
    sent: AtomicUsize,
}

impl NullTransport {
    /// Packets passed to `output` so far.
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Transport for NullTransport {
    type UserData = ();

    fn output(&self, _buf: NetBuf<()>) -> Result<(), MgmtError> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn get_mtu(&self, _buf: &NetBuf<()>) -> u16 {
        u16::MAX
    }
}

// ── Per-transport SMP state ──────────────────────────────────

pub struct SmpTransport<T: Transport> {
    transport: T,
    registry: Arc<Registry>,
    pool: BufferPool,
    config: SmpConfig,
    reassembly: Mutex<CriticalSectionRawMutex, RefCell<Reassembler<T::UserData>>>,
    rx: RxQueue<T::UserData>,
    responses: Option<Arc<dyn ResponseHandler>>,
}

impl<T: Transport> SmpTransport<T> {
    /// Validate `config` and create a transport with its own buffer pool.
    pub fn new(transport: T, registry: Arc<Registry>, config: SmpConfig) -> crate::Result<Self> {
        config.validate()?;
        let pool = BufferPool::from_config(&config);
        Ok(Self::with_pool(transport, registry, pool, config))
    }

    /// Create a transport drawing buffers from an existing pool.
    pub fn with_pool(
        transport: T,
        registry: Arc<Registry>,
        pool: BufferPool,
        config: SmpConfig,
    ) -> Self {
        Self {
            reassembly: Mutex::new(RefCell::new(Reassembler::new(pool.clone()))),
            transport,
            registry,
            pool,
            config,
            rx: RxQueue::new(),
            responses: None,
        }
    }

    /// Enable client mode: responses are routed to `handler`.
    pub fn with_response_handler(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
        self.responses = Some(handler);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &SmpConfig {
        &self.config
    }

    pub fn queue(&self) -> &RxQueue<T::UserData> {
        &self.rx
    }

    pub fn engine(&self) -> SmpEngine<'_, T> {
        let engine = SmpEngine::new(&self.transport, &self.registry, &self.pool, &self.config);
        match self.responses.as_deref() {
            Some(handler) => engine.with_response_handler(handler),
            None => engine,
        }
    }

    // ── Reassembly ───────────────────────────────────────────

    pub fn reassembly_collect(&self, frag: &[u8]) -> Result<u16, ReassemblyError> {
        self.reassembly.lock(|r| r.borrow_mut().collect(frag))
    }

    pub fn reassembly_expected(&self) -> Result<u16, ReassemblyError> {
        self.reassembly.lock(|r| r.borrow().expected_remaining())
    }

    /// Hand the collected packet to the worker. Returns how many bytes
    /// were still missing (non-zero only with `force`).
    pub fn reassembly_complete(&self, force: bool) -> Result<u16, ReassemblyError> {
        let (buf, remaining) = self.reassembly.lock(|r| r.borrow_mut().complete(force))?;
        self.rx_req(buf);
        Ok(remaining)
    }

    pub fn reassembly_drop(&self) -> Result<(), ReassemblyError> {
        self.reassembly.lock(|r| r.borrow_mut().drop_current())
    }

    /// Run `f` on the user data of the packet being collected.
    pub fn with_reassembly_user_data<R>(
        &self,
        f: impl FnOnce(&mut T::UserData) -> R,
    ) -> Option<R> {
        self.reassembly
            .lock(|r| r.borrow_mut().user_data_mut().map(f))
    }

    // ── Receive queue ────────────────────────────────────────

    /// Queue a complete packet for the worker. Never blocks; a full
    /// queue drops the packet.
    pub fn rx_req(&self, buf: NetBuf<T::UserData>) {
        if let Err(dropped) = self.rx.enqueue(buf) {
            warn!("SMP: rx queue full, dropping {} byte packet", dropped.len());
        }
    }

    /// Queue a packet that arrived in one piece (datagram transports).
    pub fn rx_packet(&self, data: &[u8], user_data: T::UserData) -> Result<(), MgmtError> {
        let mut buf = self
            .pool
            .alloc::<T::UserData>()
            .ok_or(MgmtError::NoMemory)?;
        buf.extend_from_slice(data)?;
        buf.set_user_data(user_data);
        self.rx_req(buf);
        Ok(())
    }

    /// Drop queued packets the transport no longer considers valid for
    /// `arg` (for example a disconnected peer).
    pub fn remove_invalid(&self, arg: &T::UserData) -> usize {
        let removed = self
            .rx
            .purge_invalid(|buf| self.transport.is_still_valid(buf, arg));
        if removed > 0 {
            info!("SMP: removed {} stale packets", removed);
        }
        removed
    }

    /// Drop every queued packet.
    pub fn clear(&self) -> usize {
        self.rx.clear()
    }

    /// Process queued packets until the queue is empty or a purge asks
    /// the drain to yield. Returns the number processed.
    pub fn process_pending(&self) -> usize {
        let engine = self.engine();
        let mut processed = 0;
        while !self.rx.is_cancelled() && !self.rx.is_stopped() {
            let Some(buf) = self.rx.dequeue_nonblocking() else {
                break;
            };
            if let Err(rc) = engine.process_request_packet(buf) {
                debug!("SMP: packet failed: {}", rc);
            }
            processed += 1;
        }
        processed
    }

    /// Ask the worker to exit.
    pub fn shutdown(&self) {
        self.rx.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────
