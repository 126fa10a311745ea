//! Registry + dispatcher behaviour seen through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use smpmgr::error::MgmtError;
use smpmgr::mgmt::{Group, MgmtHandler, Registry};
use smpmgr::smp::engine::dispatch;
use smpmgr::smp::{MgmtOp, SmpHeader, Streamer};

fn run(registry: &Registry, op: MgmtOp, group: u16, id: u8) -> Result<(), MgmtError> {
    let hdr = SmpHeader::request(op, group, id, 0, 0);
    let mut out = [0u8; 64];
    let mut s = Streamer::new(&[], &mut out, 64);
    dispatch(registry, &hdr, &mut s)
}

fn counted(
    counter: &Arc<AtomicUsize>,
) -> impl Fn(&mut Streamer<'_>) -> Result<(), MgmtError> + Send + Sync + 'static {
    let c = Arc::clone(counter);
    move |_s: &mut Streamer<'_>| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn write_request_invokes_write_handler_exactly_once() {
    let reads = Arc::new(AtomicUsize::new(0));
    let writes = Arc::new(AtomicUsize::new(0));
    let r = Registry::new();
    r.register(
        Group::new(70)
            .read(1, counted(&reads))
            .write(1, counted(&writes)),
    )
    .unwrap();

    assert_eq!(run(&r, MgmtOp::Write, 70, 1), Ok(()));
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(reads.load(Ordering::SeqCst), 0);
}

#[test]
fn unregistered_group_never_invokes_handlers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let r = Registry::new();
    r.register(Group::new(70).write(0, counted(&calls)))
        .unwrap();

    assert_eq!(run(&r, MgmtOp::Write, 71, 0), Err(MgmtError::NotSupported));
    assert_eq!(run(&r, MgmtOp::Write, 70, 5), Err(MgmtError::NotSupported));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unregister_removes_dispatch_target() {
    let calls = Arc::new(AtomicUsize::new(0));
    let r = Registry::new();
    r.register(Group::new(70).write(0, counted(&calls)))
        .unwrap();
    assert!(r.unregister(70));
    assert!(!r.unregister(70));

    assert_eq!(run(&r, MgmtOp::Write, 70, 0), Err(MgmtError::NotSupported));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_slot_is_same_as_missing_command() {
    let r = Registry::new();
    r.register(
        Group::new(70)
            .handler(0, MgmtHandler::default())
            .read(1, |_s| Ok(())),
    )
    .unwrap();
    assert_eq!(run(&r, MgmtOp::Read, 70, 0), Err(MgmtError::NotSupported));
    assert_eq!(run(&r, MgmtOp::Read, 70, 1), Ok(()));
}

#[test]
fn struct_handlers_implement_command_handler() {
    struct Fixed(u32);
    impl smpmgr::mgmt::CommandHandler for Fixed {
        fn handle(&self, s: &mut Streamer<'_>) -> Result<(), MgmtError> {
            s.writer().str("v")?.u32(self.0)?;
            Ok(())
        }
    }

    let r = Registry::new();
    r.register(Group::new(70).handler(
        0,
        MgmtHandler {
            read: Some(Arc::new(Fixed(12))),
            write: None,
        },
    ))
    .unwrap();

    let hdr = SmpHeader::request(MgmtOp::Read, 70, 0, 0, 0);
    let mut out = [0u8; 32];
    let written = {
        let mut s = Streamer::new(&[], &mut out, 32);
        dispatch(&r, &hdr, &mut s).unwrap();
        s.written()
    };
    let mut d = minicbor::Decoder::new(&out[..written]);
    assert_eq!(d.map().unwrap(), None);
    assert_eq!(d.str().unwrap(), "v");
    assert_eq!(d.u32().unwrap(), 12);
}
