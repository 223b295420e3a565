use log::debug;

use crate::error::PlatformError;

#[cfg(windows)]
mod windows {
    use std::mem;
    use std::ptr::null_mut;

    use winapi::um::memoryapi::{VirtualAlloc, VirtualFree, VirtualLock};
    use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
    use winapi::um::winnt::{MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE};

    pub fn getpagesize() -> usize {
        unsafe {
            let mut sys_info: SYSTEM_INFO = mem::zeroed();
            GetSystemInfo(&mut sys_info);
            sys_info.dwPageSize as usize
        }
    }

    pub unsafe fn mlock(addr: *mut u8, len: usize) -> i32 {
        if VirtualLock(addr as *mut _, len) != 0 {
            0
        } else {
            -1
        }
    }

    /// VirtualAlloc hands out page aligned blocks, so any alignment up to the
    /// page size is satisfied without adjusting the pointer.
    pub unsafe fn aligned_alloc(alignment: usize, size: usize) -> *mut u8 {
        if alignment > getpagesize() {
            return null_mut();
        }
        VirtualAlloc(null_mut(), size, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE) as *mut u8
    }

    pub unsafe fn aligned_free(ptr: *mut u8) {
        if !ptr.is_null() {
            VirtualFree(ptr as *mut _, 0, MEM_RELEASE);
        }
    }
}

#[cfg(not(windows))]
mod unix {
    pub fn getpagesize() -> usize {
        unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
    }

    pub unsafe fn mlock(addr: *mut u8, len: usize) -> i32 {
        libc::mlock(addr as *const _, len)
    }

    pub unsafe fn aligned_alloc(alignment: usize, size: usize) -> *mut u8 {
        // C11 wants the size to be a multiple of the alignment
        let size = size.div_ceil(alignment) * alignment;
        libc::aligned_alloc(alignment, size) as *mut u8
    }

    pub unsafe fn aligned_free(ptr: *mut u8) {
        libc::free(ptr as *mut _);
    }
}

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        pub use windows::*;
    } else {
        pub use unix::*;
    }
}

/// Zeroed heap block with a guaranteed alignment, released on drop.
#[derive(Debug)]
pub struct AlignedBuffer {
    ptr: *mut u8,
    len: usize,
}

impl AlignedBuffer {
    pub fn new(len: usize, alignment: usize) -> Result<Self, PlatformError> {
        if !alignment.is_power_of_two() {
            return Err(PlatformError::BadAlignment(alignment));
        }
        let len = len.max(1);
        let ptr = unsafe { aligned_alloc(alignment, len) };
        if ptr.is_null() {
            return Err(PlatformError::OutOfMemory { size: len, alignment });
        }
        unsafe { std::ptr::write_bytes(ptr, 0, len) };

        // best effort, an unlocked buffer only costs accuracy
        if unsafe { mlock(ptr, len) } != 0 {
            debug!("could not lock {len} byte benchmark buffer");
        }
        Ok(AlignedBuffer { ptr, len })
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe { aligned_free(self.ptr) }
    }
}
