//! # `slabcache` - A page-caching allocator for small uniform buffers
//!
//! A slab allocator in the Bonwick tradition for workloads that churn
//! through allocations of one fixed size: records, network buffers, pool
//! entries. Pages obtained from the operating system are cached and their
//! slots reused, so a stable working set pays the page-mapping cost once
//! instead of on every allocation, and unused pages can be handed back to
//! the OS on demand.
//!
//! ## How it works
//!
//! Each 4 KiB page carries its own descriptor at the tail: a 64-bit
//! occupancy mask (one bit per slot) plus the intrusive links of the pool
//! chains. The allocator keeps three chains of descriptors, classified by
//! occupancy:
//!
//! - **empty**: every slot free; parked for reuse,
//! - **partial**: some slots free; the head serves the next allocation,
//! - **full**: no slot free.
//!
//! Allocation, free, and every chain transition are O(1). The owning page
//! of a freed pointer is recovered by rounding the address down to the
//! page boundary, and the lowest free slot comes from a single bit scan.
//!
//! ## Contract
//!
//! - One instance serves exactly one object size `N`, checked when the
//!   instantiation compiles: `N` non-zero, at most [`FREE_SPACE`] bytes,
//!   at most 64 slots per page.
//! - Not thread-safe. [`SlabCache`] is `!Send + !Sync` with a single
//!   logical owner; use one instance per thread or lock externally.
//! - Freed pointers are not validated. Double frees and pointers from
//!   elsewhere are undefined behavior, as documented on
//!   [`SlabCache::free`].
//! - Empty pages accumulate until [`SlabCache::reclaim`] hands them back
//!   to the OS; shedding is always caller-triggered.
//!
//! ## Example
//!
//! ```
//! use slabcache::SlabCache;
//!
//! let mut records = SlabCache::<128>::new();
//!
//! let a = records.alloc()?;
//! let b = records.alloc()?;
//! assert_ne!(a, b);
//!
//! unsafe {
//!     records.free(a);
//!     records.free(b);
//! }
//!
//! // Both slots are free again, so their page is parked for reuse until
//! // the next allocation or an explicit reclaim.
//! records.reclaim();
//! # Ok::<(), slabcache::AllocError>(())
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod cache;
mod chain;
mod page;
mod slab;
mod syscall;

pub use cache::{AllocError, SlabCache};
pub use page::{MmapSource, PageSource, PAGE_SIZE};
pub use slab::FREE_SPACE;

// Compile-time layout claims the address arithmetic relies on.
const _: () = {
    use core::mem;

    use crate::slab::SlabLink;

    // Address rounding needs a power-of-two page size.
    assert!(PAGE_SIZE.is_power_of_two());

    // The descriptor fits behind the slot area, on an aligned offset.
    assert!(FREE_SPACE + mem::size_of::<SlabLink>() <= PAGE_SIZE);
    assert!(FREE_SPACE % slab::LINK_ALIGN == 0);
    assert!(FREE_SPACE % mem::align_of::<SlabLink>() == 0);
};
