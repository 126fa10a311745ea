//! Protocol core: header codec, buffers, reassembly, queueing and
//! request processing.

pub mod buf;
pub mod codec;
pub mod engine;
pub mod queue;
pub mod reassembly;
pub mod streamer;
pub mod transport;
pub mod worker;

pub use buf::{BufferPool, NetBuf};
pub use codec::{HEADER_SIZE, MgmtOp, SmpHeader};
pub use engine::SmpEngine;
pub use streamer::Streamer;
pub use transport::{NullTransport, ResponseHandler, SmpTransport, Transport};
pub use worker::Worker;
