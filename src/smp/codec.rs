//! SMP header codec.
//!
//! Wire format (all multi-byte fields big-endian):
//! ```text
//! ┌──────────────────────┬───────┬──────────┬──────────┬─────┬────┬─────────────┐
//! │ res:3 │ ver:2 │ op:3 │ flags │ len (2B) │ grp (2B) │ seq │ id │ payload (N) │
//! └──────────────────────┴───────┴──────────┴──────────┴─────┴────┴─────────────┘
//!   byte 0                 byte 1  bytes 2-3  bytes 4-5  6     7
//! ```
//!
//! `len` counts payload bytes only. A single reassembled packet may hold
//! several header+payload pairs back to back.

use crate::error::MgmtError;

/// Fixed SMP header size.
pub const HEADER_SIZE: usize = 8;

/// Legacy protocol version (SMP v1).
pub const SMP_VERSION_1: u8 = 0;

/// Current protocol version (SMP v2).
pub const SMP_VERSION_2: u8 = 1;

/// Highest version this engine answers with.
pub const SMP_VERSION_MAX: u8 = SMP_VERSION_2;

const OP_MASK: u8 = 0x07;
const VERSION_SHIFT: u8 = 3;
const VERSION_MASK: u8 = 0x03;
const RESERVED_SHIFT: u8 = 5;
const RESERVED_MASK: u8 = 0x07;

/// Header opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MgmtOp {
    Read = 0,
    ReadRsp = 1,
    Write = 2,
    WriteRsp = 3,
}

impl MgmtOp {
    pub const fn from_raw(op: u8) -> Option<Self> {
        match op {
            0 => Some(Self::Read),
            1 => Some(Self::ReadRsp),
            2 => Some(Self::Write),
            3 => Some(Self::WriteRsp),
            _ => None,
        }
    }

    pub const fn is_request(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }
}

/// Response opcode for a request opcode: READ answers with READ_RSP,
/// everything else with WRITE_RSP.
pub const fn response_op(req_op: u8) -> u8 {
    if req_op == MgmtOp::Read as u8 {
        MgmtOp::ReadRsp as u8
    } else {
        MgmtOp::WriteRsp as u8
    }
}

/// Decoded SMP header. Fields hold raw wire values so that any byte
/// pattern can be represented and echoed back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmpHeader {
    /// 3-bit opcode.
    pub op: u8,
    /// 2-bit protocol version.
    pub version: u8,
    /// 3 reserved bits.
    pub reserved: u8,
    pub flags: u8,
    /// Payload length, header excluded.
    pub len: u16,
    pub group: u16,
    pub seq: u8,
    /// Command id within the group.
    pub id: u8,
}

impl SmpHeader {
    /// Request header with the current protocol version.
    pub const fn request(op: MgmtOp, group: u16, id: u8, seq: u8, len: u16) -> Self {
        Self {
            op: op as u8,
            version: SMP_VERSION_2,
            reserved: 0,
            flags: 0,
            len,
            group,
            seq,
            id,
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, MgmtError> {
        if buf.len() < HEADER_SIZE {
            return Err(MgmtError::Corrupt);
        }
        Ok(Self {
            op: buf[0] & OP_MASK,
            version: (buf[0] >> VERSION_SHIFT) & VERSION_MASK,
            reserved: (buf[0] >> RESERVED_SHIFT) & RESERVED_MASK,
            flags: buf[1],
            len: u16::from_be_bytes([buf[2], buf[3]]),
            group: u16::from_be_bytes([buf[4], buf[5]]),
            seq: buf[6],
            id: buf[7],
        })
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let len = self.len.to_be_bytes();
        let group = self.group.to_be_bytes();
        [
            (self.op & OP_MASK)
                | ((self.version & VERSION_MASK) << VERSION_SHIFT)
                | ((self.reserved & RESERVED_MASK) << RESERVED_SHIFT),
            self.flags,
            len[0],
            len[1],
            group[0],
            group[1],
            self.seq,
            self.id,
        ]
    }

    pub fn mgmt_op(&self) -> Option<MgmtOp> {
        MgmtOp::from_raw(self.op)
    }

    /// Header + declared payload fits a buffer of `capacity` bytes.
    pub fn fits(&self, capacity: usize) -> bool {
        HEADER_SIZE + usize::from(self.len) <= capacity
    }

    /// Header for the response to `self` carrying `len` payload bytes.
    pub fn response(&self, len: u16) -> Self {
        Self {
            op: response_op(self.op),
            version: self.version.min(SMP_VERSION_MAX),
            reserved: 0,
            flags: 0,
            len,
            group: self.group,
            seq: self.seq,
            id: self.id,
        }
    }
}

pub fn decode_header(buf: &[u8]) -> Result<SmpHeader, MgmtError> {
    SmpHeader::decode(buf)
}

pub fn encode_header(hdr: &SmpHeader) -> [u8; HEADER_SIZE] {
    hdr.encode()
}

/// Overwrite the first `HEADER_SIZE` bytes of `dst`.
///
/// Panics if `dst` is shorter than a header; callers reserve header
/// space before encoding the payload.
pub fn write_header(dst: &mut [u8], hdr: &SmpHeader) {
    dst[..HEADER_SIZE].copy_from_slice(&hdr.encode());
}

// ── Tests ─────────────────────────────────────────────────────
