//! Mock transport for integration tests.
//!
//! Records every packet passed to `output`. Sent buffers can be held
//! (kept allocated) to simulate a link that has not drained yet.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use minicbor::Decoder;
use smpmgr::SmpConfig;
use smpmgr::error::MgmtError;
use smpmgr::mgmt::Registry;
use smpmgr::smp::{HEADER_SIZE, MgmtOp, NetBuf, SmpHeader, SmpTransport, Transport};

/// One packet seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub peer: u32,
    pub bytes: Vec<u8>,
}

#[allow(dead_code)]
impl SentPacket {
    pub fn header(&self) -> SmpHeader {
        SmpHeader::decode(&self.bytes).unwrap()
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    /// `rc` of an error response, `None` for a regular response.
    pub fn rc(&self) -> Option<u16> {
        let mut d = Decoder::new(self.payload());
        let n = d.map().ok()??;
        for _ in 0..n {
            let key = d.str().ok()?;
            if key == "rc" {
                return d.u16().ok();
            }
            d.skip().ok()?;
        }
        None
    }

    /// `rsn` of an error response.
    pub fn rsn(&self) -> Option<String> {
        let mut d = Decoder::new(self.payload());
        let n = d.map().ok()??;
        for _ in 0..n {
            let key = d.str().ok()?;
            if key == "rsn" {
                return d.str().ok().map(str::to_owned);
            }
            d.skip().ok()?;
        }
        None
    }
}

/// Peer id is the user data.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentPacket>>,
    held: Mutex<Vec<NetBuf<u32>>>,
    hold: AtomicBool,
    fail_output: AtomicBool,
    outputs: AtomicUsize,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep sent buffers allocated until `release`.
    pub fn holding() -> Self {
        let t = Self::default();
        t.hold.store(true, Ordering::Relaxed);
        t
    }

    pub fn fail_output(&self, fail: bool) {
        self.fail_output.store(fail, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<SentPacket> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Number of `output` calls, failed ones included.
    pub fn output_calls(&self) -> usize {
        self.outputs.load(Ordering::Relaxed)
    }

    pub fn release(&self) {
        self.held.lock().unwrap().clear();
    }
}

impl Transport for MockTransport {
    type UserData = u32;

    fn output(&self, buf: NetBuf<u32>) -> Result<(), MgmtError> {
        self.outputs.fetch_add(1, Ordering::Relaxed);
        if self.fail_output.load(Ordering::Relaxed) {
            return Err(MgmtError::Unknown);
        }
        self.sent.lock().unwrap().push(SentPacket {
            peer: *buf.user_data(),
            bytes: buf.data().to_vec(),
        });
        if self.hold.load(Ordering::Relaxed) {
            self.held.lock().unwrap().push(buf);
        }
        Ok(())
    }

    fn get_mtu(&self, _buf: &NetBuf<u32>) -> u16 {
        256
    }

    fn is_still_valid(&self, buf: &NetBuf<u32>, arg: &u32) -> bool {
        buf.user_data() != arg
    }
}

// ── Fixtures ──────────────────────────────────────────────────

#[allow(dead_code)]
pub fn fixture(
    transport: MockTransport,
    config: SmpConfig,
) -> (Arc<Registry>, SmpTransport<MockTransport>) {
    let registry = Arc::new(Registry::new());
    let smp = SmpTransport::new(transport, Arc::clone(&registry), config).unwrap();
    (registry, smp)
}

/// Header + payload for one request.
#[allow(dead_code)]
pub fn request(op: MgmtOp, group: u16, id: u8, seq: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = SmpHeader::request(op, group, id, seq, payload.len() as u16)
        .encode()
        .to_vec();
    v.extend_from_slice(payload);
    v
}

/// Same as [`request`] with an explicit protocol version.
#[allow(dead_code)]
pub fn request_v(
    version: u8,
    op: MgmtOp,
    group: u16,
    id: u8,
    seq: u8,
    payload: &[u8],
) -> Vec<u8> {
    let hdr = SmpHeader {
        version,
        ..SmpHeader::request(op, group, id, seq, payload.len() as u16)
    };
    let mut v = hdr.encode().to_vec();
    v.extend_from_slice(payload);
    v
}

/// CBOR map of text keys to text values.
#[allow(dead_code)]
pub fn text_map(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut v = Vec::new();
    let mut e = minicbor::Encoder::new(&mut v);
    e.map(pairs.len() as u64).unwrap();
    for (k, val) in pairs {
        e.str(k).unwrap().str(val).unwrap();
    }
    v
}
