#![cfg(unix)]

use libc::{c_void, mmap, munmap, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE};
use std::ptr;

use crate::page::PAGE_SIZE;

#[cfg(target_os = "linux")]
const MAP_FLAGS: libc::c_int = MAP_PRIVATE | MAP_ANONYMOUS | libc::MAP_POPULATE;
#[cfg(not(target_os = "linux"))]
const MAP_FLAGS: libc::c_int = MAP_PRIVATE | MAP_ANONYMOUS;

/// Maps one anonymous, private, read/write page of `PAGE_SIZE` bytes.
///
/// The mapping is zero-filled and aligned to `PAGE_SIZE`. On Linux it is
/// faulted in immediately (`MAP_POPULATE`); other unix targets fault on
/// first touch. Returns `None` if the kernel refuses the mapping.
pub unsafe fn map_page() -> Option<*mut u8> {
    let ptr = mmap(
        ptr::null_mut(),
        PAGE_SIZE,
        PROT_READ | PROT_WRITE,
        MAP_FLAGS,
        -1,
        0,
    );

    if ptr == MAP_FAILED {
        None
    } else {
        Some(ptr as *mut u8)
    }
}

/// Unmaps a page previously returned by `map_page`.
pub unsafe fn unmap_page(ptr: *mut u8) {
    munmap(ptr as *mut c_void, PAGE_SIZE);
}
