#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub(crate) use unix::{map_page, unmap_page};

#[cfg(windows)]
pub(crate) use windows::{map_page, unmap_page};
