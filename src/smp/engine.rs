//! Request-packet processing.
//!
//! ```text
//!  NetBuf (one or more header+payload pairs)
//!    │
//!    ├─ decode header ──────────────── Corrupt ─┐
//!    ├─ alloc response, copy user data  NoMemory ┤
//!    ├─ version gate ───────── TooOld / TooNew ─┤
//!    ├─ dispatch: registry → handler(Streamer)  ┤
//!    ├─ legacy translation (v1 + group error) ──┤
//!    └─ Transport::output(response)             │
//!                                               ▼
//!                        one error response { "rc", "rsn"? }
//! ```
//!
//! Processing stops at the first failing request of a packet; the peer
//! then gets exactly one error response for it.

use log::{debug, warn};
use minicbor::Encoder;
use minicbor::encode::write::Cursor;

use super::buf::{BufferPool, NetBuf};
use super::codec::{HEADER_SIZE, MgmtOp, SMP_VERSION_1, SMP_VERSION_MAX, SmpHeader, write_header};
use super::streamer::Streamer;
use super::transport::{ResponseHandler, Transport};
use crate::config::SmpConfig;
use crate::error::MgmtError;
use crate::mgmt::registry::Registry;

/// Failure of one request, with the handler's reason text if any.
struct ReqError {
    rc: MgmtError,
    rsn: Option<String>,
}

impl From<MgmtError> for ReqError {
    fn from(rc: MgmtError) -> Self {
        Self { rc, rsn: None }
    }
}

/// Locate and run the handler for `hdr` inside an open response map.
pub fn dispatch(
    registry: &Registry,
    hdr: &SmpHeader,
    streamer: &mut Streamer<'_>,
) -> Result<(), MgmtError> {
    let handler = registry
        .find_handler(hdr.group, hdr.id)
        .ok_or(MgmtError::NotSupported)?;
    let cmd = match hdr.mgmt_op() {
        Some(MgmtOp::Read) => handler.read,
        Some(MgmtOp::Write) => handler.write,
        _ => return Err(MgmtError::Invalid),
    }
    .ok_or(MgmtError::NotSupported)?;

    streamer.begin_response()?;
    let rc = cmd.handle(streamer);
    let closed = streamer.end_response();
    rc?;
    closed.map_err(|_| MgmtError::TooLarge)
}

/// Encode `{ "rc": code [, "rsn": text] }` plus the response header for
/// `req` into `buf`, replacing its contents.
pub fn build_err_rsp<U>(
    buf: &mut NetBuf<U>,
    req: &SmpHeader,
    rc: MgmtError,
    rsn: Option<&str>,
) -> Result<(), MgmtError> {
    buf.reset();
    let written = {
        let payload = buf
            .storage_mut()
            .get_mut(HEADER_SIZE..)
            .ok_or(MgmtError::TooLarge)?;
        let mut enc = Encoder::new(Cursor::new(payload));
        enc.map(if rsn.is_some() { 2 } else { 1 })?
            .str("rc")?
            .u16(rc.code())?;
        if let Some(rsn) = rsn {
            enc.str("rsn")?.str(rsn)?;
        }
        enc.writer().position()
    };
    let len = u16::try_from(written).map_err(|_| MgmtError::TooLarge)?;
    buf.set_len(HEADER_SIZE + written);
    write_header(buf.data_mut(), &req.response(len));
    Ok(())
}

/// Borrowed view of everything a packet needs while being processed.
pub struct SmpEngine<'a, T: Transport> {
    transport: &'a T,
    registry: &'a Registry,
    pool: &'a BufferPool,
    config: &'a SmpConfig,
    responses: Option<&'a dyn ResponseHandler>,
}

impl<'a, T: Transport> SmpEngine<'a, T> {
    pub fn new(
        transport: &'a T,
        registry: &'a Registry,
        pool: &'a BufferPool,
        config: &'a SmpConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            pool,
            config,
            responses: None,
        }
    }

    /// Route READ_RSP/WRITE_RSP packets to `handler`.
    pub fn with_response_handler(mut self, handler: &'a dyn ResponseHandler) -> Self {
        self.responses = Some(handler);
        self
    }

    /// Process every request in `req`. The buffer is consumed: it is
    /// freed, reused for the error response, or dropped.
    pub fn process_request_packet(&self, mut req: NetBuf<T::UserData>) -> Result<(), MgmtError> {
        let mut hdr = SmpHeader::default();
        let mut valid_hdr = false;
        let mut rsp: Option<NetBuf<T::UserData>> = None;
        let mut failure: Option<ReqError> = None;

        while !req.is_empty() {
            valid_hdr = false;
            hdr = match SmpHeader::decode(req.data()) {
                Ok(h) => h,
                Err(rc) => {
                    failure = Some(rc.into());
                    break;
                }
            };
            valid_hdr = true;
            req.pull(HEADER_SIZE);

            let payload_len = usize::from(hdr.len);
            if req.len() < payload_len {
                failure = Some(MgmtError::Corrupt.into());
                break;
            }

            match hdr.mgmt_op() {
                Some(op) if op.is_request() => {
                    let mut buf = match self.alloc_rsp(&req) {
                        Ok(buf) => buf,
                        Err(rc) => {
                            failure = Some(rc.into());
                            break;
                        }
                    };
                    if let Err(e) =
                        self.handle_single_req(&hdr, &req.data()[..payload_len], &mut buf)
                    {
                        rsp = Some(buf);
                        failure = Some(e);
                        break;
                    }
                    if let Err(rc) = self.transport.output(buf) {
                        failure = Some(rc.into());
                        break;
                    }
                }
                Some(_) => match self.responses {
                    Some(handler) => {
                        if let Err(rc) = handler.on_response(&hdr, &req.data()[..payload_len]) {
                            // A rejected response is not answered.
                            valid_hdr = false;
                            failure = Some(rc.into());
                            break;
                        }
                    }
                    None => {
                        debug!("SMP: response packet with no client");
                        failure = Some(MgmtError::NotSupported.into());
                        break;
                    }
                },
                None => {
                    failure = Some(MgmtError::NotSupported.into());
                    break;
                }
            }

            req.pull(payload_len);
        }

        match failure {
            None => Ok(()),
            Some(e) => {
                let rc = e.rc;
                if valid_hdr {
                    self.on_err(&hdr, req, rsp, e);
                }
                Err(rc)
            }
        }
    }

    /// Version gate, dispatch and legacy translation for one request.
    /// On success `rsp` holds the complete response packet.
    fn handle_single_req(
        &self,
        hdr: &SmpHeader,
        payload: &[u8],
        rsp: &mut NetBuf<T::UserData>,
    ) -> Result<(), ReqError> {
        if hdr.version == SMP_VERSION_1 && !self.config.legacy_protocol {
            return Err(MgmtError::UnsupportedTooOld.into());
        }
        if hdr.version > SMP_VERSION_MAX {
            return Err(MgmtError::UnsupportedTooNew.into());
        }

        let mtu = self.transport.get_mtu(rsp);
        rsp.reset();
        let (written, group_error, rsn) = {
            let out = rsp
                .storage_mut()
                .get_mut(HEADER_SIZE..)
                .ok_or(MgmtError::TooLarge)?;
            let mut streamer = Streamer::new(payload, out, mtu);
            if let Err(rc) = dispatch(self.registry, hdr, &mut streamer) {
                return Err(ReqError {
                    rc,
                    rsn: streamer.take_rc_rsn(),
                });
            }
            (
                streamer.written(),
                streamer.group_error(),
                streamer.take_rc_rsn(),
            )
        };

        if self.config.legacy_protocol && hdr.version == SMP_VERSION_1 {
            if let Some((group, ret)) = group_error {
                let rc = self
                    .registry
                    .find_error_translator(group)
                    .map_or(MgmtError::Unknown, |translate| translate(ret));
                debug!(
                    "SMP: legacy translation group {} rc {} -> {}",
                    group,
                    ret,
                    rc.code()
                );
                return Err(ReqError { rc, rsn });
            }
        }

        let len = u16::try_from(written).map_err(|_| MgmtError::TooLarge)?;
        rsp.set_len(HEADER_SIZE + written);
        write_header(rsp.data_mut(), &hdr.response(len));
        Ok(())
    }

    fn alloc_rsp(&self, req: &NetBuf<T::UserData>) -> Result<NetBuf<T::UserData>, MgmtError> {
        let mut rsp = self.pool.alloc::<T::UserData>().ok_or(MgmtError::NoMemory)?;
        rsp.set_user_data(self.transport.copy_user_data(req.user_data())?);
        Ok(rsp)
    }

    /// Send one error response, built in the response buffer if one was
    /// allocated, otherwise in the request buffer.
    fn on_err(
        &self,
        hdr: &SmpHeader,
        req: NetBuf<T::UserData>,
        rsp: Option<NetBuf<T::UserData>>,
        err: ReqError,
    ) {
        let mut buf = match rsp {
            Some(rsp) => {
                drop(req);
                rsp
            }
            None => req,
        };

        let rsn = self
            .config
            .verbose_err_response
            .then(|| err.rsn.unwrap_or_else(|| err.rc.to_string()));

        if build_err_rsp(&mut buf, hdr, err.rc, rsn.as_deref()).is_err() {
            warn!(
                "SMP: no room for error response (group {} id {} seq {})",
                hdr.group, hdr.id, hdr.seq
            );
            return;
        }
        if let Err(e) = self.transport.output(buf) {
            warn!("SMP: error response not sent: {}", e);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────
