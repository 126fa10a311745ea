//! OS management group (group 0): echo and buffer parameters.

use super::bulk::{MapEntry, map_decode_bulk};
use super::group::{Group, group_id};
use crate::error::MgmtError;
use crate::smp::streamer::Streamer;

pub const OS_MGMT_ID_ECHO: u8 = 0;
pub const OS_MGMT_ID_MCUMGR_PARAMS: u8 = 6;

/// Group-scoped return codes of the OS group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum OsMgmtErr {
    Unknown = 1,
    InvalidFormat = 2,
    QueryYieldsNoAnswer = 3,
    RtcNotSet = 4,
    RtcCommandFailed = 5,
}

/// Legacy translation for OS group codes.
pub fn translate_error(ret: u16) -> MgmtError {
    if ret == OsMgmtErr::InvalidFormat as u16 {
        MgmtError::Invalid
    } else {
        MgmtError::Unknown
    }
}

/// `{"d": text}` → `{"r": text}`.
fn echo(s: &mut Streamer<'_>) -> Result<(), MgmtError> {
    let mut value: Option<&str> = None;
    {
        let mut entries = [MapEntry::decoded("d", &mut value)];
        map_decode_bulk(s.reader(), &mut entries)?;
    }

    match value {
        Some(text) => {
            s.writer().str("r")?.str(text)?;
        }
        None => {
            s.set_rc_rsn("missing \"d\"");
            s.add_group_error(group_id::OS, OsMgmtErr::InvalidFormat as u16)?;
        }
    }
    Ok(())
}

/// Build the OS group reporting the given buffer geometry.
pub fn os_group(buf_size: usize, buf_count: usize) -> Group {
    let buf_size = u32::try_from(buf_size).unwrap_or(u32::MAX);
    let buf_count = u32::try_from(buf_count).unwrap_or(u32::MAX);

    Group::new(group_id::OS)
        .named("os")
        .with_translator(translate_error)
        .read(OS_MGMT_ID_ECHO, echo)
        .write(OS_MGMT_ID_ECHO, echo)
        .read(OS_MGMT_ID_MCUMGR_PARAMS, move |s| {
            s.writer()
                .str("buf_size")?
                .u32(buf_size)?
                .str("buf_count")?
                .u32(buf_count)?;
            Ok(())
        })
}

// ── Tests ─────────────────────────────────────────────────────
