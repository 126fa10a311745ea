//! Command groups and handlers.
//!
//! A group owns a dense table indexed by command id; each slot holds an
//! optional read and an optional write handler. A slot with neither is
//! treated as an absent command.

use std::sync::Arc;

use crate::error::MgmtError;
use crate::smp::streamer::Streamer;

/// Well-known group ids.
pub mod group_id {
    pub const OS: u16 = 0;
    pub const IMAGE: u16 = 1;
    pub const STAT: u16 = 2;
    pub const SETTINGS: u16 = 3;
    pub const LOG: u16 = 4;
    pub const CRASH: u16 = 5;
    pub const SPLIT: u16 = 6;
    pub const RUN: u16 = 7;
    pub const FS: u16 = 8;
    pub const SHELL: u16 = 9;
    pub const ENUM: u16 = 10;
    /// First id available for application groups.
    pub const PERUSER: u16 = 64;
}

/// Command implementation invoked by the dispatcher.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, streamer: &mut Streamer<'_>) -> Result<(), MgmtError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&mut Streamer<'_>) -> Result<(), MgmtError> + Send + Sync,
{
    fn handle(&self, streamer: &mut Streamer<'_>) -> Result<(), MgmtError> {
        self(streamer)
    }
}

/// Maps a group-scoped return code to a legacy top-level code.
pub type ErrorTranslator = fn(u16) -> MgmtError;

/// Read/write handler pair for one command id.
#[derive(Clone, Default)]
pub struct MgmtHandler {
    pub read: Option<Arc<dyn CommandHandler>>,
    pub write: Option<Arc<dyn CommandHandler>>,
}

impl MgmtHandler {
    /// Neither handler is set.
    pub fn is_unimplemented(&self) -> bool {
        self.read.is_none() && self.write.is_none()
    }
}

/// A registered command group.
pub struct Group {
    id: u16,
    name: Option<&'static str>,
    handlers: Vec<MgmtHandler>,
    translator: Option<ErrorTranslator>,
}

impl Group {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            name: None,
            handlers: Vec::new(),
            translator: None,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_translator(mut self, translator: ErrorTranslator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Install the read handler for `cmd`.
    pub fn read<F>(mut self, cmd: u8, f: F) -> Self
    where
        F: Fn(&mut Streamer<'_>) -> Result<(), MgmtError> + Send + Sync + 'static,
    {
        self.slot(cmd).read = Some(Arc::new(f));
        self
    }

    /// Install the write handler for `cmd`.
    pub fn write<F>(mut self, cmd: u8, f: F) -> Self
    where
        F: Fn(&mut Streamer<'_>) -> Result<(), MgmtError> + Send + Sync + 'static,
    {
        self.slot(cmd).write = Some(Arc::new(f));
        self
    }

    /// Install a complete handler pair for `cmd`.
    pub fn handler(mut self, cmd: u8, handler: MgmtHandler) -> Self {
        *self.slot(cmd) = handler;
        self
    }

    fn slot(&mut self, cmd: u8) -> &mut MgmtHandler {
        let idx = usize::from(cmd);
        if self.handlers.len() <= idx {
            self.handlers.resize_with(idx + 1, MgmtHandler::default);
        }
        &mut self.handlers[idx]
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn handler_at(&self, cmd: u8) -> Option<&MgmtHandler> {
        self.handlers.get(usize::from(cmd))
    }

    pub fn translator(&self) -> Option<ErrorTranslator> {
        self.translator
    }
}

impl core::fmt::Debug for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────
