//! Per-request codec binding.
//!
//! A `Streamer` pairs a CBOR decoder over the request payload with a
//! CBOR encoder writing the response payload directly into the
//! response buffer (after the header space). Command handlers only see
//! this type.

use minicbor::encode::write::Cursor;
use minicbor::{Decoder, Encoder};

use crate::error::MgmtError;

/// Encoder writing into a response buffer.
pub type ResponseEncoder<'a> = Encoder<Cursor<&'a mut [u8]>>;

pub struct Streamer<'a> {
    reader: Decoder<'a>,
    writer: ResponseEncoder<'a>,
    mtu: u16,
    error_group: u16,
    error_ret: u16,
    rc_rsn: Option<String>,
}

impl<'a> Streamer<'a> {
    pub fn new(request: &'a [u8], response: &'a mut [u8], mtu: u16) -> Self {
        Self {
            reader: Decoder::new(request),
            writer: Encoder::new(Cursor::new(response)),
            mtu,
            error_group: 0,
            error_ret: 0,
            rc_rsn: None,
        }
    }

    /// Decoder positioned at the start of the request payload.
    pub fn reader(&mut self) -> &mut Decoder<'a> {
        &mut self.reader
    }

    /// Encoder positioned inside the open response map.
    pub fn writer(&mut self) -> &mut ResponseEncoder<'a> {
        &mut self.writer
    }

    /// Response payload bytes written so far.
    pub fn written(&self) -> usize {
        self.writer.writer().position()
    }

    /// MTU the transport reported for this request's peer.
    pub fn transport_mtu(&self) -> u16 {
        self.mtu
    }

    /// Attach `"err": {"group": g, "rc": rc}` to the response and record
    /// it for legacy translation. A zero `rc` is ignored.
    pub fn add_group_error(&mut self, group: u16, rc: u16) -> Result<(), MgmtError> {
        if rc == 0 {
            return Ok(());
        }
        self.error_group = group;
        self.error_ret = rc;
        self.writer
            .str("err")?
            .map(2)?
            .str("group")?
            .u16(group)?
            .str("rc")?
            .u16(rc)?;
        Ok(())
    }

    /// Last group error recorded by the handler, as `(group, rc)`.
    pub fn group_error(&self) -> Option<(u16, u16)> {
        (self.error_ret != 0).then_some((self.error_group, self.error_ret))
    }

    /// Reason text for the error response, when verbose errors are on.
    pub fn set_rc_rsn(&mut self, rsn: impl Into<String>) {
        self.rc_rsn = Some(rsn.into());
    }

    pub fn rc_rsn(&self) -> Option<&str> {
        self.rc_rsn.as_deref()
    }

    pub(crate) fn take_rc_rsn(&mut self) -> Option<String> {
        self.rc_rsn.take()
    }

    pub(crate) fn begin_response(&mut self) -> Result<(), MgmtError> {
        self.writer.begin_map()?;
        Ok(())
    }

    pub(crate) fn end_response(&mut self) -> Result<(), MgmtError> {
        self.writer.end()?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────
