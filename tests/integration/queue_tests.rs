//! Receive-queue management: stale-peer removal, clearing and overflow.

use smpmgr::SmpConfig;
use smpmgr::smp::MgmtOp;
use smpmgr::smp::queue::RX_QUEUE_DEPTH;

use super::mock_transport::{MockTransport, fixture, request};

#[test]
fn remove_invalid_keeps_order_of_survivors() {
    let (_registry, smp) = fixture(MockTransport::new(), SmpConfig::default());
    for (seq, peer) in [(1u8, 1u32), (2, 2), (3, 1), (4, 3)] {
        smp.rx_packet(&request(MgmtOp::Read, 70, 0, seq, &[]), peer)
            .unwrap();
    }

    assert_eq!(smp.remove_invalid(&1), 2);
    assert_eq!(smp.queue().len(), 2);
    assert_eq!(smp.pool().available(), smp.pool().count() - 2);

    assert_eq!(smp.process_pending(), 2);
    let sent = smp.transport().sent();
    let order: Vec<(u8, u32)> = sent.iter().map(|p| (p.header().seq, p.peer)).collect();
    assert_eq!(order, vec![(2, 2), (4, 3)]);
    assert_eq!(smp.pool().available(), smp.pool().count());
}

#[test]
fn remove_invalid_with_no_matches_is_noop() {
    let (_registry, smp) = fixture(MockTransport::new(), SmpConfig::default());
    smp.rx_packet(&request(MgmtOp::Read, 70, 0, 1, &[]), 5)
        .unwrap();
    assert_eq!(smp.remove_invalid(&9), 0);
    assert_eq!(smp.queue().len(), 1);
    assert!(!smp.queue().is_cancelled());
}

#[test]
fn clear_frees_every_buffer() {
    let (_registry, smp) = fixture(MockTransport::new(), SmpConfig::default());
    smp.rx_packet(&request(MgmtOp::Read, 70, 0, 1, &[]), 1)
        .unwrap();
    smp.rx_packet(&request(MgmtOp::Read, 70, 0, 2, &[]), 2)
        .unwrap();

    assert_eq!(smp.clear(), 2);
    assert!(smp.queue().is_empty());
    assert_eq!(smp.pool().available(), smp.pool().count());
    assert_eq!(smp.process_pending(), 0);
    assert_eq!(smp.transport().sent_count(), 0);
}

#[test]
fn full_queue_drops_new_packets() {
    let config = SmpConfig {
        netbuf_count: RX_QUEUE_DEPTH + 2,
        ..SmpConfig::default()
    };
    let (_registry, smp) = fixture(MockTransport::new(), config);
    for seq in 0..RX_QUEUE_DEPTH + 1 {
        smp.rx_packet(&request(MgmtOp::Read, 70, 0, seq as u8, &[]), 0)
            .unwrap();
    }

    assert_eq!(smp.queue().len(), RX_QUEUE_DEPTH);
    // The dropped packet's buffer went straight back to the pool.
    assert_eq!(smp.pool().available(), 2);
    assert_eq!(smp.process_pending(), RX_QUEUE_DEPTH);
}
