//! Fuzz target: `Reassembler::collect`
//!
//! The first input byte picks a fragment size; the rest is fed as a
//! stream of fragments. The reassembler must never panic, never report
//! more bytes than a buffer can hold, and must give its buffer back.
//!
//! cargo fuzz run fuzz_reassembly

#![no_main]

use libfuzzer_sys::fuzz_target;
use smpmgr::smp::BufferPool;
use smpmgr::smp::reassembly::Reassembler;

const BUF_SIZE: usize = 256;

fuzz_target!(|data: &[u8]| {
    let Some((&step, stream)) = data.split_first() else {
        return;
    };
    let step = usize::from(step).max(1);

    let pool = BufferPool::new(1, BUF_SIZE);
    let mut r = Reassembler::<()>::new(pool.clone());

    for frag in stream.chunks(step) {
        if let Ok(remaining) = r.collect(frag) {
            assert!(usize::from(remaining) <= BUF_SIZE);
            if remaining == 0 {
                let (buf, missing) = r.complete(false).expect("complete packet");
                assert_eq!(missing, 0);
                assert!(buf.len() <= BUF_SIZE);
            }
        }
    }

    let _ = r.complete(true);
    assert_eq!(pool.available(), 1);
});
