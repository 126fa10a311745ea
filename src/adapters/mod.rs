//! Adapters — concrete implementations of the [`Transport`](crate::smp::Transport) trait.
//!
//! | Adapter | Transport        | User data             |
//! |---------|------------------|-----------------------|
//! | `udp`   | `UdpTransport`   | peer `SocketAddr`     |

pub mod udp;
