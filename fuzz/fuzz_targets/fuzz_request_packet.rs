//! Fuzz target: `SmpEngine::process_request_packet`
//!
//! Treats the input as one received packet, runs it through the engine
//! with the OS group registered, and checks that every pool buffer is
//! returned afterwards.
//!
//! cargo fuzz run fuzz_request_packet

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use smpmgr::SmpConfig;
use smpmgr::mgmt::Registry;
use smpmgr::mgmt::os::os_group;
use smpmgr::smp::{NullTransport, SmpTransport};

fuzz_target!(|data: &[u8]| {
    let config = SmpConfig {
        verbose_err_response: data.first().is_some_and(|b| b & 1 == 1),
        ..SmpConfig::default()
    };
    let registry = Arc::new(Registry::new());
    registry
        .register(os_group(config.netbuf_size, config.netbuf_count))
        .expect("register os group");
    let Ok(smp) = SmpTransport::new(NullTransport::default(), registry, config) else {
        return;
    };

    if smp.rx_packet(data, ()).is_err() {
        return;
    }
    if let Some(packet) = smp.queue().dequeue_nonblocking() {
        let _ = smp.engine().process_request_packet(packet);
    }
    assert_eq!(smp.pool().available(), smp.pool().count());
});
