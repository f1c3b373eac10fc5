//! The size-class allocator.
//!
//! [`SlabCache`] owns three chains of slab descriptors, classified by page
//! occupancy: *empty* (every slot free), *partial* (some free), *full*
//! (none free). Every allocation comes from the head of the partial chain;
//! chain membership is recomputed from the occupancy mask as a side effect
//! of each allocate and free, never stored separately.

use core::fmt;
use core::ptr::NonNull;

use crate::chain::Chain;
use crate::page::{MmapSource, PageSource};
use crate::slab::{self, SlabLink, FREE_SPACE};

/// The error returned when the operating system refuses a page mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("page acquisition failed")
    }
}

impl std::error::Error for AllocError {}

/// A caching allocator for objects of exactly `N` bytes.
///
/// Pages are not returned to the OS eagerly: a page whose slots are all
/// free parks on the empty chain and serves later allocations, so a stable
/// working set of same-sized buffers pays the page-mapping cost once.
/// [`reclaim`](Self::reclaim) hands parked pages back on demand.
///
/// `N` is validated when the instantiation is compiled: it must be
/// non-zero, fit into the usable page bytes ([`FREE_SPACE`]), and yield at
/// most 64 slots per page.
///
/// ```
/// use slabcache::SlabCache;
///
/// let mut cache = SlabCache::<64>::new();
/// let buf = cache.alloc()?;
/// unsafe { cache.free(buf) };
/// # Ok::<(), slabcache::AllocError>(())
/// ```
///
/// Object sizes violating the per-page limits never construct:
///
/// ```compile_fail
/// // 8-byte objects would mean more than 64 slots per page.
/// let _ = slabcache::SlabCache::<8>::new();
/// ```
///
/// The cache is deliberately not thread-safe: it is `!Send + !Sync` and
/// every operation takes `&mut self`. Use one instance per thread or add
/// external locking.
pub struct SlabCache<const N: usize, S: PageSource = MmapSource> {
    empty: Chain,
    partial: Chain,
    full: Chain,
    source: S,
}

impl<const N: usize> SlabCache<N> {
    /// Creates a cache backed by direct OS page mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(MmapSource)
    }
}

impl<const N: usize> Default for SlabCache<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, S: PageSource> SlabCache<N, S> {
    /// Slots per page for this object size (at most 64).
    pub const CAPACITY: usize = FREE_SPACE / N;

    // One set bit per slot. Bits at or above CAPACITY stay clear so they
    // never report as free.
    const FREE_MASK: u64 = if Self::CAPACITY == 64 {
        u64::MAX
    } else {
        (1_u64 << Self::CAPACITY) - 1
    };

    const LAYOUT_OK: () = {
        assert!(N > 0, "object size must be non-zero");
        assert!(N <= FREE_SPACE, "object size exceeds the usable page bytes");
        assert!(FREE_SPACE / N <= 64, "more than 64 objects per page");
    };

    /// Creates a cache drawing pages from `source`.
    pub fn new_in(source: S) -> Self {
        // Rejects invalid object sizes when this instantiation compiles.
        let () = Self::LAYOUT_OK;
        Self {
            empty: Chain::new(),
            partial: Chain::new(),
            full: Chain::new(),
            source,
        }
    }

    /// Allocates one `N`-byte buffer. The contents are unspecified.
    ///
    /// Serves from the head of the partial chain, promoting an empty page
    /// or mapping a fresh one first when no partial page exists.
    ///
    /// # Errors
    /// Fails only when no cached page has a free slot and the OS refuses a
    /// new mapping. The failure surfaces immediately and is never retried.
    pub fn alloc(&mut self) -> Result<NonNull<u8>, AllocError> {
        let head = match self.partial.head() {
            Some(head) => head,
            None => self.refill_partial()?,
        };
        // Safety: `head` is on the partial chain, so its page is live and
        // its mask has a set bit.
        unsafe {
            let slot = (*head.as_ptr()).claim_free_slot();
            let addr = slab::slot_addr(head, N, slot);
            if (*head.as_ptr()).is_full() {
                let _ = self.partial.move_head_to(&mut self.full);
            }
            Ok(addr)
        }
    }

    /// Returns `ptr`'s slot to its page, migrating the page between chains
    /// as occupancy drops.
    ///
    /// # Safety
    /// `ptr` must have been returned by [`alloc`](Self::alloc) on this
    /// instance and not freed since. Neither is checked: a foreign pointer
    /// or a double free silently corrupts the occupancy bookkeeping.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        let link = slab::link_of(ptr.as_ptr());
        let slot = slab::slot_index(ptr.as_ptr(), N);
        debug_assert!(slot < Self::CAPACITY);

        if (*link.as_ptr()).is_full() {
            // The page leaves the full chain, for partial or straight to
            // empty when it held a single object.
            (*link.as_ptr()).release_slot(slot);
            self.full.excise(link);
            if (*link.as_ptr()).is_empty(Self::FREE_MASK) {
                self.empty.push(link);
            } else {
                self.partial.push(link);
            }
        } else {
            (*link.as_ptr()).release_slot(slot);
            if (*link.as_ptr()).is_empty(Self::FREE_MASK) {
                self.partial.excise(link);
                self.empty.push(link);
            }
        }
    }

    /// Unmaps every page currently on the empty chain.
    ///
    /// Pages holding live objects stay put, so the working set survives;
    /// only parked capacity is shed. No-op when nothing is parked. How many
    /// empty pages may accumulate between calls is the caller's policy; the
    /// cache never reclaims on its own.
    pub fn reclaim(&mut self) {
        // Safety: pages on the empty chain hold no live objects.
        let _released = unsafe { self.empty.destroy(&self.source) };
        #[cfg(feature = "tracing")]
        tracing::debug!(pages = _released, "reclaimed empty pages");
    }

    /// The object size `N` this instance serves.
    #[must_use]
    pub const fn object_size(&self) -> usize {
        N
    }

    /// Slots per page (at most 64).
    #[must_use]
    pub const fn page_capacity(&self) -> usize {
        Self::CAPACITY
    }

    /// Puts a page with free slots at the head of the partial chain.
    fn refill_partial(&mut self) -> Result<NonNull<SlabLink>, AllocError> {
        // Safety: chain members are live; a fresh page is exclusively ours
        // and PAGE_SIZE-aligned per the PageSource contract.
        unsafe {
            if let Some(parked) = self.empty.move_head_to(&mut self.partial) {
                return Ok(parked);
            }
            let page = self.source.acquire().ok_or(AllocError)?;
            let link = SlabLink::init(page, Self::FREE_MASK);
            self.partial.push(link);
            Ok(link)
        }
    }
}

impl<const N: usize, S: PageSource> Drop for SlabCache<N, S> {
    fn drop(&mut self) {
        // Safety: teardown. Every page still owned goes back to the source,
        // live objects included; using their pointers afterwards is the
        // documented use-after-teardown violation.
        unsafe {
            self.empty.destroy(&self.source);
            self.partial.destroy(&self.source);
            self.full.destroy(&self.source);
        }
    }
}
