#![cfg(windows)]

use std::ptr;
use windows_sys::Win32::System::Memory::{
    VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};

use crate::page::PAGE_SIZE;

/// Commits one read/write page of `PAGE_SIZE` bytes.
///
/// Reservations are allocation-granularity aligned (64 KiB), so the page is
/// always `PAGE_SIZE`-aligned, and committed memory is zero-filled.
pub unsafe fn map_page() -> Option<*mut u8> {
    let ptr = VirtualAlloc(
        ptr::null_mut(),
        PAGE_SIZE,
        MEM_COMMIT | MEM_RESERVE,
        PAGE_READWRITE,
    );
    if ptr.is_null() {
        None
    } else {
        Some(ptr as *mut u8)
    }
}

/// Releases a page previously returned by `map_page`.
pub unsafe fn unmap_page(ptr: *mut u8) {
    // MEM_RELEASE frees the entire region reserved by VirtualAlloc. Size must be 0.
    VirtualFree(ptr as *mut _, 0, MEM_RELEASE);
}
