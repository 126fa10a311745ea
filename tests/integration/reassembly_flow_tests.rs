//! Stream transports: fragments in, response out.

use smpmgr::SmpConfig;
use smpmgr::error::ReassemblyError;
use smpmgr::mgmt::os::{OS_MGMT_ID_ECHO, os_group};
use smpmgr::smp::MgmtOp;

use super::mock_transport::{MockTransport, fixture, request, text_map};

#[test]
fn fragmented_echo_is_answered() {
    let (registry, smp) = fixture(MockTransport::new(), SmpConfig::default());
    registry.register(os_group(384, 4)).unwrap();

    let pkt = request(MgmtOp::Write, 0, OS_MGMT_ID_ECHO, 3, &text_map(&[("d", "fragmented")]));
    let mut remaining = smp.reassembly_collect(&pkt[..8]).unwrap();
    for chunk in pkt[8..].chunks(5) {
        remaining = smp.reassembly_collect(chunk).unwrap();
        if remaining > 0 {
            assert_eq!(smp.reassembly_expected(), Ok(remaining));
        }
    }
    assert_eq!(remaining, 0);
    smp.with_reassembly_user_data(|peer| *peer = 42).unwrap();
    assert_eq!(smp.reassembly_complete(false), Ok(0));
    assert_eq!(smp.process_pending(), 1);

    let sent = smp.transport().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].peer, 42);
    assert_eq!(sent[0].header().seq, 3);

    let mut d = minicbor::Decoder::new(sent[0].payload());
    assert_eq!(d.map().unwrap(), None);
    assert_eq!(d.str().unwrap(), "r");
    assert_eq!(d.str().unwrap(), "fragmented");
}

#[test]
fn forced_completion_of_short_packet_gets_corrupt() {
    let (_registry, smp) = fixture(MockTransport::new(), SmpConfig::default());
    let pkt = request(MgmtOp::Write, 70, 0, 1, &[0xA0, 0, 0, 0]);
    assert_eq!(smp.reassembly_collect(&pkt[..10]), Ok(2));
    assert_eq!(smp.reassembly_complete(true), Ok(2));
    assert_eq!(smp.process_pending(), 1);

    let sent = smp.transport().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].rc(), Some(smpmgr::MgmtError::Corrupt.code()));
}

#[test]
fn dropped_reassembly_starts_over() {
    let (_registry, smp) = fixture(MockTransport::new(), SmpConfig::default());
    let pkt = request(MgmtOp::Read, 70, 0, 1, &[0xA0]);
    assert_eq!(smp.reassembly_collect(&pkt[..8]), Ok(1));
    smp.reassembly_drop().unwrap();
    assert_eq!(smp.pool().available(), smp.pool().count());
    assert_eq!(smp.reassembly_drop(), Err(ReassemblyError::NotInProgress));
    assert_eq!(smp.reassembly_complete(false), Err(ReassemblyError::NotInProgress));

    assert_eq!(smp.reassembly_collect(&pkt), Ok(0));
    assert_eq!(smp.reassembly_complete(false), Ok(0));
    assert_eq!(smp.queue().len(), 1);
}

#[test]
fn oversize_packet_is_rejected_before_collection() {
    let config = SmpConfig {
        netbuf_size: 32,
        ..SmpConfig::default()
    };
    let (_registry, smp) = fixture(MockTransport::new(), config);
    let pkt = request(MgmtOp::Write, 70, 0, 1, &[0u8; 40]);
    assert_eq!(smp.reassembly_collect(&pkt[..8]), Err(ReassemblyError::TooLarge));
    assert_eq!(smp.reassembly_expected(), Err(ReassemblyError::NotInProgress));
    assert_eq!(smp.pool().available(), smp.pool().count());
}

#[test]
fn first_fragment_must_hold_the_header() {
    let (_registry, smp) = fixture(MockTransport::new(), SmpConfig::default());
    let pkt = request(MgmtOp::Read, 70, 0, 1, &[0xA0]);
    assert_eq!(
        smp.reassembly_collect(&pkt[..4]),
        Err(ReassemblyError::InsufficientHeader)
    );
    assert_eq!(smp.reassembly_expected(), Err(ReassemblyError::NotInProgress));
    assert_eq!(smp.pool().available(), smp.pool().count());
}
