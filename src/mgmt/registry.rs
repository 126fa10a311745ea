//! Command group registry.
//!
//! Ordered list of groups, scanned linearly on lookup. Registration is
//! rare (startup) and lookups clone the handler `Arc`s, so the lock is
//! never held while a handler runs.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{info, warn};

use super::group::{ErrorTranslator, Group, MgmtHandler};
use crate::error::MgmtError;

/// Maximum number of registered groups.
pub const MAX_GROUPS: usize = 16;

type GroupList = heapless::Vec<Arc<Group>, MAX_GROUPS>;

pub struct Registry {
    groups: Mutex<CriticalSectionRawMutex, RefCell<GroupList>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(RefCell::new(heapless::Vec::new())),
        }
    }

    /// Append `group`. Duplicate ids are not checked; the first
    /// registered group with a matching command wins on lookup.
    pub fn register(&self, group: Group) -> Result<(), MgmtError> {
        let id = group.id();
        let name = group.name().unwrap_or("-");
        self.groups
            .lock(|g| g.borrow_mut().push(Arc::new(group)))
            .map_err(|_| {
                warn!("MGMT: registry full, group {} ({}) rejected", id, name);
                MgmtError::NoMemory
            })?;
        info!("MGMT: registered group {} ({})", id, name);
        Ok(())
    }

    /// Remove the first group with `id`. Returns `false` (and does
    /// nothing) when no such group is registered.
    pub fn unregister(&self, id: u16) -> bool {
        let removed = self.groups.lock(|g| {
            let mut g = g.borrow_mut();
            let pos = g.iter().position(|grp| grp.id() == id)?;
            Some(g.remove(pos))
        });
        if removed.is_some() {
            info!("MGMT: unregistered group {}", id);
        }
        removed.is_some()
    }

    pub fn find_group(&self, id: u16) -> Option<Arc<Group>> {
        self.groups
            .lock(|g| g.borrow().iter().find(|grp| grp.id() == id).cloned())
    }

    /// Handler pair for `(group, cmd)`. A group whose table is too short
    /// ends the search; an unimplemented slot moves on to later groups
    /// sharing the same id.
    pub fn find_handler(&self, group: u16, cmd: u8) -> Option<MgmtHandler> {
        self.groups.lock(|g| {
            for grp in g.borrow().iter().filter(|grp| grp.id() == group) {
                let handler = grp.handler_at(cmd)?;
                if handler.is_unimplemented() {
                    continue;
                }
                return Some(handler.clone());
            }
            None
        })
    }

    pub fn find_error_translator(&self, group: u16) -> Option<ErrorTranslator> {
        self.find_group(group).and_then(|g| g.translator())
    }

    /// Visit groups in registration order until `f` returns `false`.
    pub fn for_each_group(&self, mut f: impl FnMut(&Group) -> bool) {
        let snapshot: Vec<Arc<Group>> = self.groups.lock(|g| g.borrow().iter().cloned().collect());
        for grp in &snapshot {
            if !f(grp) {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.lock(|g| g.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────
