//! smpd — SMP management daemon over UDP.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  main thread: recv_from ─▶ SmpTransport::rx_packet        │
//! │                                   │                      │
//! │                                   ▼ RxQueue              │
//! │  smp-worker:  SmpEngine ─▶ Registry (os group) ─▶ send_to │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use smpmgr::adapters::udp::{self, DEFAULT_MTU, DEFAULT_PORT, UdpTransport};
use smpmgr::mgmt::Registry;
use smpmgr::mgmt::os::os_group;
use smpmgr::smp::{SmpTransport, Worker};
use smpmgr::SmpConfig;

/// SMP device-management daemon
#[derive(Parser, Debug)]
#[command(name = "smpd", version, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value_t = format!("0.0.0.0:{DEFAULT_PORT}"))]
    bind: String,

    /// JSON configuration file (defaults are used when absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Largest datagram to send
    #[arg(long, default_value_t = DEFAULT_MTU)]
    mtu: u16,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let config = match &args.config {
        Some(path) => SmpConfig::load(path)?,
        None => SmpConfig::default(),
    };
    info!(
        "smpd: {} buffers x {} bytes, legacy protocol {}",
        config.netbuf_count,
        config.netbuf_size,
        if config.legacy_protocol { "on" } else { "off" }
    );

    // ── Management groups ─────────────────────────────────────
    let registry = Arc::new(Registry::new());
    registry
        .register(os_group(config.netbuf_size, config.netbuf_count))
        .context("registering os group")?;

    // ── Transport + worker ────────────────────────────────────
    let transport = UdpTransport::bind(args.bind.as_str(), args.mtu)
        .with_context(|| format!("binding {}", args.bind))?;
    let rx_socket = transport.try_clone_socket()?;
    info!("smpd: listening on {}", transport.local_addr()?);

    let mut scratch = vec![0u8; usize::from(u16::MAX)];
    let smp = Arc::new(SmpTransport::new(transport, registry, config)?);
    let _worker = Worker::spawn(Arc::clone(&smp)).context("spawning worker")?;

    loop {
        if let Err(e) = udp::recv_one(&smp, &rx_socket, &mut scratch) {
            warn!("smpd: receive failed: {}", e);
        }
    }
}
