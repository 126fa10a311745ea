//! Fragment reassembly.
//!
//! Transports with an MTU smaller than an SMP packet deliver it in
//! fragments. The first fragment must contain the whole header; its
//! `len` field fixes how many bytes the packet still needs.
//!
//! ```text
//!          collect(frag >= 8B)            complete(force) / drop_current()
//!  ┌──────┐ ──────────────────▶ ┌─────────────────────┐ ──────────────────▶ ┌──────┐
//!  │ Idle │                     │ Collecting(expected)│                     │ Idle │
//!  └──────┘                     └─────────────────────┘                     └──────┘
//!                                 ▲ collect(frag) │
//!                                 └───────────────┘  expected -= frag.len()
//! ```
//!
//! A packet never spans more than one pool buffer.

use log::debug;

use super::buf::{BufferPool, NetBuf};
use super::codec::{HEADER_SIZE, SmpHeader};
use crate::error::ReassemblyError;

/// Per-transport reassembly context.
pub struct Reassembler<U> {
    pool: BufferPool,
    current: Option<NetBuf<U>>,
    expected: usize,
}

impl<U: Default> Reassembler<U> {
    pub fn new(pool: BufferPool) -> Self {
        Self {
            pool,
            current: None,
            expected: 0,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.current.is_some()
    }

    /// Feed one fragment. Returns the number of bytes still missing;
    /// `0` means the packet can be handed off with [`complete`](Self::complete).
    pub fn collect(&mut self, frag: &[u8]) -> Result<u16, ReassemblyError> {
        match self.current.as_mut() {
            None => {
                let hdr =
                    SmpHeader::decode(frag).map_err(|_| ReassemblyError::InsufficientHeader)?;
                let expected = usize::from(hdr.len) + HEADER_SIZE;
                let capacity = self.pool.buffer_size();

                if frag.len() > capacity || expected > capacity {
                    return Err(ReassemblyError::TooLarge);
                }
                if frag.len() > expected {
                    return Err(ReassemblyError::Overflow);
                }

                let mut buf = self.pool.alloc::<U>().ok_or(ReassemblyError::NoMemory)?;
                buf.extend_from_slice(frag)
                    .map_err(|_| ReassemblyError::TooLarge)?;
                self.current = Some(buf);
                self.expected = expected - frag.len();
            }
            Some(buf) => {
                if frag.len() > self.expected {
                    return Err(ReassemblyError::Overflow);
                }
                buf.extend_from_slice(frag)
                    .map_err(|_| ReassemblyError::Overflow)?;
                self.expected -= frag.len();
            }
        }
        Ok(self.expected as u16)
    }

    /// Bytes still missing from the packet being collected.
    pub fn expected_remaining(&self) -> Result<u16, ReassemblyError> {
        if self.current.is_none() {
            return Err(ReassemblyError::NotInProgress);
        }
        Ok(self.expected as u16)
    }

    /// Take the collected packet. Without `force` the packet must be
    /// complete. Returns the buffer and the number of bytes that were
    /// still missing when it was taken.
    pub fn complete(&mut self, force: bool) -> Result<(NetBuf<U>, u16), ReassemblyError> {
        if self.current.is_none() {
            return Err(ReassemblyError::NotInProgress);
        }
        if self.expected != 0 && !force {
            return Err(ReassemblyError::Incomplete);
        }
        let remaining = self.expected as u16;
        let buf = self.current.take().ok_or(ReassemblyError::NotInProgress)?;
        self.expected = 0;
        if remaining != 0 {
            debug!("SMP: forced hand-off with {} bytes missing", remaining);
        }
        Ok((buf, remaining))
    }

    /// Discard the packet being collected.
    pub fn drop_current(&mut self) -> Result<(), ReassemblyError> {
        let buf = self.current.take().ok_or(ReassemblyError::NotInProgress)?;
        debug!("SMP: dropped partial packet ({} bytes)", buf.len());
        self.expected = 0;
        Ok(())
    }

    /// User data of the buffer being collected.
    pub fn user_data_mut(&mut self) -> Option<&mut U> {
        self.current.as_mut().map(NetBuf::user_data_mut)
    }
}

// ── Tests ─────────────────────────────────────────────────────
