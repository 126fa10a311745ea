//! Error types for the SMP engine.
//!
//! `MgmtError` is the protocol-level return code carried on the wire in
//! the `rc` field of a response. The other enums cover the local
//! subsystems (reassembly, configuration) and convert into the
//! crate-level `Error`.

use core::fmt;

// ---------------------------------------------------------------------------
// Management (wire) errors
// ---------------------------------------------------------------------------

/// First code reserved for group-specific return codes.
pub const MGMT_ERR_PERUSER: u16 = 256;

/// Management return code reported to the peer.
///
/// `Ok` is not a variant; success is `Result::Ok(())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MgmtError {
    /// Unknown error.
    Unknown,
    /// Insufficient memory (buffer pool exhausted).
    NoMemory,
    /// Error in input value.
    Invalid,
    /// Operation timed out.
    Timeout,
    /// No such file/entry.
    NoEntry,
    /// Current state disallows command.
    BadState,
    /// Response too large for the buffer.
    TooLarge,
    /// Command not supported.
    NotSupported,
    /// Corrupt or truncated header.
    Corrupt,
    /// Command blocked by processing of other command.
    Busy,
    /// Access to the specific function, command or resource denied.
    AccessDenied,
    /// Requested SMP version is no longer supported.
    UnsupportedTooOld,
    /// Requested SMP version is newer than supported.
    UnsupportedTooNew,
    /// Group-defined code (`>= MGMT_ERR_PERUSER`).
    PerUser(u16),
}

impl MgmtError {
    /// Numeric value as encoded on the wire.
    pub const fn code(self) -> u16 {
        match self {
            Self::Unknown => 1,
            Self::NoMemory => 2,
            Self::Invalid => 3,
            Self::Timeout => 4,
            Self::NoEntry => 5,
            Self::BadState => 6,
            Self::TooLarge => 7,
            Self::NotSupported => 8,
            Self::Corrupt => 9,
            Self::Busy => 10,
            Self::AccessDenied => 11,
            Self::UnsupportedTooOld => 12,
            Self::UnsupportedTooNew => 13,
            Self::PerUser(code) => code,
        }
    }

    /// Inverse of [`code`](Self::code). `0` (success) yields `None`;
    /// unassigned codes below the per-user range map to `Unknown`.
    pub const fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => return None,
            2 => Self::NoMemory,
            3 => Self::Invalid,
            4 => Self::Timeout,
            5 => Self::NoEntry,
            6 => Self::BadState,
            7 => Self::TooLarge,
            8 => Self::NotSupported,
            9 => Self::Corrupt,
            10 => Self::Busy,
            11 => Self::AccessDenied,
            12 => Self::UnsupportedTooOld,
            13 => Self::UnsupportedTooNew,
            c if c >= MGMT_ERR_PERUSER => Self::PerUser(c),
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for MgmtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown error"),
            Self::NoMemory => write!(f, "out of memory"),
            Self::Invalid => write!(f, "invalid argument"),
            Self::Timeout => write!(f, "timed out"),
            Self::NoEntry => write!(f, "no such entry"),
            Self::BadState => write!(f, "bad state"),
            Self::TooLarge => write!(f, "response too large"),
            Self::NotSupported => write!(f, "not supported"),
            Self::Corrupt => write!(f, "corrupt header"),
            Self::Busy => write!(f, "busy"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::UnsupportedTooOld => write!(f, "protocol version too old"),
            Self::UnsupportedTooNew => write!(f, "protocol version too new"),
            Self::PerUser(code) => write!(f, "group error {code}"),
        }
    }
}

impl std::error::Error for MgmtError {}

impl<E> From<minicbor::encode::Error<E>> for MgmtError {
    fn from(_: minicbor::encode::Error<E>) -> Self {
        Self::TooLarge
    }
}

impl From<minicbor::decode::Error> for MgmtError {
    fn from(_: minicbor::decode::Error) -> Self {
        Self::Invalid
    }
}

// ---------------------------------------------------------------------------
// Reassembly errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyError {
    /// First fragment is shorter than the SMP header.
    InsufficientHeader,
    /// Declared packet does not fit a pool buffer.
    TooLarge,
    /// Fragment carries more bytes than the header declared.
    Overflow,
    /// No buffer available to start a packet.
    NoMemory,
    /// No packet is being collected.
    NotInProgress,
    /// Packet still missing bytes.
    Incomplete,
}

impl fmt::Display for ReassemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientHeader => write!(f, "fragment shorter than header"),
            Self::TooLarge => write!(f, "packet exceeds buffer capacity"),
            Self::Overflow => write!(f, "fragment exceeds declared length"),
            Self::NoMemory => write!(f, "no free buffer"),
            Self::NotInProgress => write!(f, "no reassembly in progress"),
            Self::Incomplete => write!(f, "packet incomplete"),
        }
    }
}

impl std::error::Error for ReassemblyError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Buffer cannot hold a header plus payload.
    BufferTooSmall(usize),
    /// Pool must contain at least one buffer.
    NoBuffers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall(size) => write!(f, "netbuf_size {size} too small"),
            Self::NoBuffers => write!(f, "netbuf_count must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Crate-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Protocol-level failure.
    Mgmt(MgmtError),
    /// Fragment reassembly failure.
    Reassembly(ReassemblyError),
    /// Invalid configuration.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mgmt(e) => write!(f, "mgmt: {e}"),
            Self::Reassembly(e) => write!(f, "reassembly: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<MgmtError> for Error {
    fn from(e: MgmtError) -> Self {
        Self::Mgmt(e)
    }
}

impl From<ReassemblyError> for Error {
    fn from(e: ReassemblyError) -> Self {
        Self::Reassembly(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

pub type Result<T> = core::result::Result<T, Error>;

// ── Tests ─────────────────────────────────────────────────────
