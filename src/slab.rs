//! The per-page slab descriptor.
//!
//! Every page carries a [`SlabLink`] embedded at byte offset [`FREE_SPACE`]
//! from the page base; the leading [`FREE_SPACE`] bytes hold object slots.
//! The descriptor tracks slot occupancy in a 64-bit mask (bit set = slot
//! free) and carries the intrusive links of the pool chains.
//!
//! Because the descriptor offset and the page alignment are fixed, any
//! address inside a page translates to its descriptor, its page base, and
//! its slot index with pure constant-time arithmetic. No lookup table.

use core::mem;
use core::ptr::{self, NonNull};

use crate::page::{align_down, PAGE_SIZE};

/// Alignment of the slot area's end within its page.
pub(crate) const LINK_ALIGN: usize = 16;

/// Usable bytes per page. Object slots occupy `[0, FREE_SPACE)`; the slab
/// descriptor sits at this offset.
pub const FREE_SPACE: usize = align_down(PAGE_SIZE - mem::size_of::<SlabLink>(), LINK_ALIGN);

/// Per-page slab descriptor, embedded near the end of the page it describes.
///
/// Bit `i` of `slots` is set while slot `i` is free. Bits at or above the
/// page's slot capacity stay clear for the lifetime of the page, so
/// `slots == 0` means full regardless of the capacity in play.
#[repr(C)]
pub(crate) struct SlabLink {
    pub(crate) prev: *mut SlabLink,
    pub(crate) next: *mut SlabLink,
    pub(crate) slots: u64,
}

impl SlabLink {
    /// Constructs the descriptor in place inside a freshly acquired page
    /// and returns a pointer to it.
    ///
    /// # Safety
    /// `page` must be the base of a live, writable, `PAGE_SIZE`-aligned
    /// page not yet carrying a descriptor.
    pub(crate) unsafe fn init(page: NonNull<u8>, free_mask: u64) -> NonNull<SlabLink> {
        let link = page.as_ptr().add(FREE_SPACE).cast::<SlabLink>();
        ptr::write(
            link,
            SlabLink {
                prev: ptr::null_mut(),
                next: ptr::null_mut(),
                slots: free_mask,
            },
        );
        NonNull::new_unchecked(link)
    }

    /// Claims the lowest-indexed free slot and returns its index.
    ///
    /// Precondition: at least one bit set. The allocator guarantees this by
    /// only claiming from pages outside the full chain.
    pub(crate) fn claim_free_slot(&mut self) -> usize {
        debug_assert_ne!(self.slots, 0);
        let slot = self.slots.trailing_zeros() as usize;
        self.slots &= !(1 << slot);
        slot
    }

    /// Marks `slot` free again.
    ///
    /// Precondition: the bit for `slot` is clear. A second release of the
    /// same slot silently corrupts the occupancy count; the contract lives
    /// on [`SlabCache::free`](crate::SlabCache::free), not here.
    pub(crate) fn release_slot(&mut self, slot: usize) {
        debug_assert_eq!(self.slots & (1 << slot), 0);
        self.slots |= 1 << slot;
    }

    /// No slot free.
    pub(crate) fn is_full(&self) -> bool {
        self.slots == 0
    }

    /// Every slot free, for a page with the given initial mask.
    pub(crate) fn is_empty(&self, free_mask: u64) -> bool {
        self.slots == free_mask
    }
}

/// Rounds any in-page address down to its page base.
pub(crate) fn page_base(addr: *mut u8) -> *mut u8 {
    (addr as usize & !(PAGE_SIZE - 1)) as *mut u8
}

/// Recovers the descriptor owning `addr`.
///
/// # Safety
/// `addr` must point into a live page carrying an initialized descriptor.
pub(crate) unsafe fn link_of(addr: *mut u8) -> NonNull<SlabLink> {
    NonNull::new_unchecked(page_base(addr).add(FREE_SPACE).cast())
}

/// Address of slot `slot` in the page described by `link`, for objects of
/// `size` bytes.
///
/// # Safety
/// `link` must point to a live descriptor and `slot` must be below the
/// page's slot capacity.
pub(crate) unsafe fn slot_addr(link: NonNull<SlabLink>, size: usize, slot: usize) -> NonNull<u8> {
    let base = page_base(link.as_ptr().cast());
    NonNull::new_unchecked(base.add(size * slot))
}

/// Slot index of `addr` within its page, for objects of `size` bytes.
pub(crate) fn slot_index(addr: *mut u8, size: usize) -> usize {
    (addr as usize - page_base(addr) as usize) / size
}
