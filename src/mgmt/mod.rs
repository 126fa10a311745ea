//! Management layer: command groups, the registry that dispatches to
//! them, and helpers for handler implementations.

pub mod bulk;
pub mod group;
pub mod os;
pub mod registry;

pub use group::{CommandHandler, ErrorTranslator, Group, MgmtHandler, group_id};
pub use registry::Registry;
