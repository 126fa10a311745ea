//! Table-driven CBOR map decoding.
//!
//! Handlers describe the keys they accept as a slice of [`MapEntry`],
//! each holding a value decoder. [`map_decode_bulk`] walks one map,
//! runs the decoder of every known key and skips the rest.

use core::fmt;

use minicbor::Decoder;
use minicbor::data::Type;

use crate::error::MgmtError;

type ValueDecoder<'a, 'b> =
    dyn FnMut(&mut Decoder<'b>) -> Result<(), minicbor::decode::Error> + 'a;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkDecodeError {
    /// Input is not a well-formed map with text keys.
    BadMessage,
    /// A key appeared twice.
    DuplicateKey,
    /// A value decoder rejected its value.
    DecodeFailed,
}

impl fmt::Display for BulkDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMessage => write!(f, "malformed map"),
            Self::DuplicateKey => write!(f, "duplicate key"),
            Self::DecodeFailed => write!(f, "value decode failed"),
        }
    }
}

impl std::error::Error for BulkDecodeError {}

impl From<BulkDecodeError> for MgmtError {
    fn from(_: BulkDecodeError) -> Self {
        Self::Invalid
    }
}

/// One accepted key and the decoder for its value.
pub struct MapEntry<'a, 'b> {
    key: &'a str,
    decode: Box<ValueDecoder<'a, 'b>>,
    found: bool,
}

impl<'a, 'b> MapEntry<'a, 'b> {
    pub fn new<F>(key: &'a str, decode: F) -> Self
    where
        F: FnMut(&mut Decoder<'b>) -> Result<(), minicbor::decode::Error> + 'a,
    {
        Self {
            key,
            decode: Box::new(decode),
            found: false,
        }
    }

    /// Decode the value as `T` into `slot`.
    pub fn decoded<T>(key: &'a str, slot: &'a mut Option<T>) -> Self
    where
        T: minicbor::Decode<'b, ()> + 'a,
    {
        Self::new(key, move |d| {
            *slot = Some(d.decode()?);
            Ok(())
        })
    }

    pub fn key(&self) -> &str {
        self.key
    }

    pub fn found(&self) -> bool {
        self.found
    }
}

/// Decode one map from `d`. Returns how many entries matched.
pub fn map_decode_bulk<'b>(
    d: &mut Decoder<'b>,
    entries: &mut [MapEntry<'_, 'b>],
) -> Result<usize, BulkDecodeError> {
    let mut remaining = d.map().map_err(|_| BulkDecodeError::BadMessage)?;
    let mut matched = 0;

    loop {
        match remaining {
            Some(0) => break,
            Some(n) => remaining = Some(n - 1),
            None => {
                if d.datatype().map_err(|_| BulkDecodeError::BadMessage)? == Type::Break {
                    d.set_position(d.position() + 1);
                    break;
                }
            }
        }

        let key = d.str().map_err(|_| BulkDecodeError::BadMessage)?;
        match entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                if entry.found {
                    return Err(BulkDecodeError::DuplicateKey);
                }
                (entry.decode)(d).map_err(|_| BulkDecodeError::DecodeFailed)?;
                entry.found = true;
                matched += 1;
            }
            None => d.skip().map_err(|_| BulkDecodeError::BadMessage)?,
        }
    }

    Ok(matched)
}

/// Whether `key` was decoded by the last [`map_decode_bulk`] call.
pub fn key_found(entries: &[MapEntry<'_, '_>], key: &str) -> bool {
    entries.iter().any(|e| e.key == key && e.found)
}

/// Clear the found flags so the table can be reused.
pub fn reset(entries: &mut [MapEntry<'_, '_>]) {
    for e in entries {
        e.found = false;
    }
}

// ── Tests ─────────────────────────────────────────────────────
