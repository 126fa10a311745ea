//! UDP transport adapter.
//!
//! Each datagram carries one complete SMP packet, so no reassembly is
//! needed: received datagrams go straight to
//! [`SmpTransport::rx_packet`] tagged with the sender address, and
//! responses are sent back to the address stored in the buffer.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use log::{debug, warn};

use crate::error::MgmtError;
use crate::smp::buf::NetBuf;
use crate::smp::transport::{SmpTransport, Transport};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 1337;

/// Largest datagram the adapter sends or receives.
pub const DEFAULT_MTU: u16 = 1024;

pub struct UdpTransport {
    socket: UdpSocket,
    mtu: u16,
}

impl UdpTransport {
    pub fn bind(addr: impl ToSocketAddrs, mtu: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        Ok(Self { socket, mtu })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Second handle on the socket for the receive loop.
    pub fn try_clone_socket(&self) -> io::Result<UdpSocket> {
        self.socket.try_clone()
    }
}

impl Transport for UdpTransport {
    type UserData = Option<SocketAddr>;

    fn output(&self, buf: NetBuf<Self::UserData>) -> Result<(), MgmtError> {
        let Some(peer) = *buf.user_data() else {
            warn!("UDP: response without peer address dropped");
            return Err(MgmtError::BadState);
        };
        self.socket.send_to(buf.data(), peer).map_err(|e| {
            warn!("UDP: send to {} failed: {}", peer, e);
            MgmtError::Unknown
        })?;
        Ok(())
    }

    fn get_mtu(&self, _buf: &NetBuf<Self::UserData>) -> u16 {
        self.mtu
    }

    /// `arg` names a peer whose queued packets are stale; `None`
    /// matches nothing.
    fn is_still_valid(&self, buf: &NetBuf<Self::UserData>, arg: &Self::UserData) -> bool {
        arg.is_none() || buf.user_data() != arg
    }
}

/// Receive one datagram from `socket` and queue it on `smp`.
/// Returns the datagram size.
pub fn recv_one(
    smp: &SmpTransport<UdpTransport>,
    socket: &UdpSocket,
    scratch: &mut [u8],
) -> io::Result<usize> {
    let (n, peer) = socket.recv_from(scratch)?;
    debug!("UDP: {} bytes from {}", n, peer);
    if let Err(e) = smp.rx_packet(&scratch[..n], Some(peer)) {
        warn!("UDP: packet from {} dropped: {}", peer, e);
    }
    Ok(n)
}

// ── Tests ─────────────────────────────────────────────────────
