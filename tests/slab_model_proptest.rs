use core::ptr::NonNull;

use proptest::prelude::*;
use slabcache::SlabCache;

const SIZE: usize = 64;

#[derive(Debug, Clone)]
enum Operation {
    Alloc(u8),
    Free(usize),
    Reclaim,
}

proptest! {
    /// Random alloc/free/reclaim interleavings against a shadow list of
    /// live buffers: pointers must stay pairwise distinct and every live
    /// buffer must keep the byte stamp written at allocation time.
    #[test]
    fn random_interleavings_keep_buffers_distinct_and_intact(
        ops in proptest::collection::vec(
            prop_oneof![
                4 => any::<u8>().prop_map(Operation::Alloc),
                4 => any::<usize>().prop_map(Operation::Free),
                1 => Just(Operation::Reclaim),
            ],
            1..400,
        )
    ) {
        let mut cache = SlabCache::<SIZE>::new();
        let mut live: Vec<(NonNull<u8>, u8)> = Vec::new();

        for op in ops {
            match op {
                Operation::Alloc(stamp) => {
                    let p = cache.alloc().unwrap();
                    prop_assert!(
                        live.iter().all(|(q, _)| *q != p),
                        "allocator handed out a live pointer twice"
                    );
                    unsafe { std::ptr::write_bytes(p.as_ptr(), stamp, SIZE) };
                    live.push((p, stamp));
                }
                Operation::Free(pick) => {
                    if live.is_empty() {
                        continue;
                    }
                    let (p, stamp) = live.swap_remove(pick % live.len());
                    let bytes = unsafe { std::slice::from_raw_parts(p.as_ptr(), SIZE) };
                    prop_assert!(
                        bytes.iter().all(|&b| b == stamp),
                        "buffer clobbered while live"
                    );
                    unsafe { cache.free(p) };
                }
                Operation::Reclaim => cache.reclaim(),
            }
        }

        // Survivors still carry their stamps, then the cache drains clean.
        for (p, stamp) in live.drain(..) {
            let bytes = unsafe { std::slice::from_raw_parts(p.as_ptr(), SIZE) };
            prop_assert!(bytes.iter().all(|&b| b == stamp));
            unsafe { cache.free(p) };
        }
        cache.reclaim();
    }
}
