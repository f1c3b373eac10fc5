//! The pool chains.
//!
//! Each chain is a doubly-linked list of slab descriptors with no sentinel
//! node; the root pointer is null when the chain is empty. All operations
//! are O(1) pointer relinking and never touch the occupancy mask or
//! allocate memory. A descriptor belongs to at most one chain at a time;
//! [`SlabCache`](crate::SlabCache) upholds that by routing every membership
//! change through this API, and the raw link fields never leave the crate.

use core::ptr::{self, NonNull};

use crate::page::PageSource;
use crate::slab::{page_base, SlabLink};

pub(crate) struct Chain {
    head: *mut SlabLink,
}

impl Chain {
    pub(crate) const fn new() -> Self {
        Self {
            head: ptr::null_mut(),
        }
    }

    pub(crate) fn head(&self) -> Option<NonNull<SlabLink>> {
        NonNull::new(self.head)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    /// Removes and returns the head descriptor, links cleared.
    ///
    /// # Safety
    /// Every descriptor on the chain must be live.
    pub(crate) unsafe fn pop(&mut self) -> Option<NonNull<SlabLink>> {
        let first = NonNull::new(self.head)?;
        let next = (*first.as_ptr()).next;
        if !next.is_null() {
            (*next).prev = ptr::null_mut();
        }
        self.head = next;
        (*first.as_ptr()).prev = ptr::null_mut();
        (*first.as_ptr()).next = ptr::null_mut();
        Some(first)
    }

    /// Inserts `link` at the head.
    ///
    /// # Safety
    /// `link` must be live and not currently a member of any chain.
    pub(crate) unsafe fn push(&mut self, link: NonNull<SlabLink>) {
        let link = link.as_ptr();
        (*link).prev = ptr::null_mut();
        (*link).next = self.head;
        if !self.head.is_null() {
            (*self.head).prev = link;
        }
        self.head = link;
    }

    /// Unlinks `link` from anywhere in this chain, reconnecting neighbors.
    ///
    /// # Safety
    /// `link` must be a current member of this chain.
    pub(crate) unsafe fn excise(&mut self, link: NonNull<SlabLink>) {
        let link = link.as_ptr();
        if self.head == link {
            let _ = self.pop();
            return;
        }
        let prev = (*link).prev;
        let next = (*link).next;
        if !prev.is_null() {
            (*prev).next = next;
        }
        if !next.is_null() {
            (*next).prev = prev;
        }
        (*link).prev = ptr::null_mut();
        (*link).next = ptr::null_mut();
    }

    /// Moves the head of `self` to the head of `to`.
    ///
    /// # Safety
    /// Every descriptor on both chains must be live.
    pub(crate) unsafe fn move_head_to(&mut self, to: &mut Chain) -> Option<NonNull<SlabLink>> {
        let link = self.pop()?;
        to.push(link);
        Some(link)
    }

    /// Unmaps every page in the chain, leaving it empty, and returns how
    /// many pages went back to the source.
    ///
    /// The next pointer is captured before each release: the descriptor
    /// lives inside the page it describes, so releasing the page destroys
    /// the descriptor with it.
    ///
    /// # Safety
    /// Every descriptor on the chain must be live, with its page owned by
    /// `source`. Pointers into those pages are dangling afterwards.
    pub(crate) unsafe fn destroy<S: PageSource>(&mut self, source: &S) -> usize {
        let mut released = 0;
        let mut cursor = self.head;
        self.head = ptr::null_mut();
        while !cursor.is_null() {
            let next = (*cursor).next;
            source.release(NonNull::new_unchecked(page_base(cursor.cast())));
            released += 1;
            cursor = next;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> NonNull<SlabLink> {
        NonNull::from(Box::leak(Box::new(SlabLink {
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
            slots: 0,
        })))
    }

    fn free_node(link: NonNull<SlabLink>) {
        unsafe { drop(Box::from_raw(link.as_ptr())) };
    }

    #[test]
    fn push_pop_is_lifo() {
        let (a, b) = (node(), node());
        let mut chain = Chain::new();
        unsafe {
            chain.push(a);
            chain.push(b);
            assert_eq!(chain.head(), Some(b));
            assert_eq!(chain.pop(), Some(b));
            assert_eq!(chain.pop(), Some(a));
            assert_eq!(chain.pop(), None);
        }
        assert!(chain.is_empty());
        free_node(a);
        free_node(b);
    }

    #[test]
    fn pop_clears_the_links() {
        let (a, b) = (node(), node());
        let mut chain = Chain::new();
        unsafe {
            chain.push(a);
            chain.push(b);
            let popped = chain.pop().unwrap();
            assert!((*popped.as_ptr()).prev.is_null());
            assert!((*popped.as_ptr()).next.is_null());
            let _ = chain.pop();
        }
        free_node(a);
        free_node(b);
    }

    #[test]
    fn excise_relinks_the_neighbors() {
        let (a, b, c) = (node(), node(), node());
        let mut chain = Chain::new();
        unsafe {
            chain.push(a);
            chain.push(b);
            chain.push(c); // c -> b -> a

            chain.excise(b);
            assert!((*b.as_ptr()).prev.is_null());
            assert!((*b.as_ptr()).next.is_null());

            assert_eq!(chain.pop(), Some(c));
            assert_eq!(chain.pop(), Some(a));
            assert_eq!(chain.pop(), None);
        }
        free_node(a);
        free_node(b);
        free_node(c);
    }

    #[test]
    fn excise_handles_head_and_tail() {
        let (a, b, c) = (node(), node(), node());
        let mut chain = Chain::new();
        unsafe {
            chain.push(a);
            chain.push(b);
            chain.push(c); // c -> b -> a

            chain.excise(c);
            assert_eq!(chain.head(), Some(b));

            chain.excise(a);
            assert_eq!(chain.pop(), Some(b));
            assert!(chain.is_empty());
        }
        free_node(a);
        free_node(b);
        free_node(c);
    }

    #[test]
    fn move_head_shifts_between_chains() {
        let a = node();
        let mut from = Chain::new();
        let mut to = Chain::new();
        unsafe {
            from.push(a);
            assert_eq!(from.move_head_to(&mut to), Some(a));
            assert!(from.is_empty());
            assert_eq!(to.head(), Some(a));

            assert_eq!(from.move_head_to(&mut to), None);
            let _ = to.pop();
        }
        free_node(a);
    }
}
