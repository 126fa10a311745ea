//! SMP device-management protocol engine.
//!
//! Exposes the protocol core (framing, reassembly, queueing, dispatch)
//! and the management registry for transports and command groups to
//! build on.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       SMP Stack                            │
//! │                                                            │
//! │  ┌───────────┐   ┌─────────────┐   ┌────────┐              │
//! │  │ Transport │──▶│ Reassembler │──▶│ RxQueue│──▶ worker    │
//! │  │ (trait)   │   │ (fragments) │   │ (FIFO) │      │       │
//! │  └───────────┘   └─────────────┘   └────────┘      │       │
//! │       ▲                                            ▼       │
//! │       │   ┌──────────┐   ┌──────────┐   ┌────────────────┐ │
//! │       └───│ Streamer │◀──│ handler  │◀──│ Engine         │ │
//! │  output   │ (CBOR)   │   │ (group)  │   │ → Registry     │ │
//! │           └──────────┘   └──────────┘   └────────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod mgmt;
pub mod smp;

pub use config::SmpConfig;
pub use error::{Error, MgmtError, ReassemblyError, Result};
