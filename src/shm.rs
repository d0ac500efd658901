// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named shared-memory storage for FIFO regions.
//
// Lets a channel queue sit in memory another process can map, the way the
// real FIFO windows are visible to both processors. POSIX uses
// shm_open + mmap; Windows uses a pagefile-backed file mapping.

use std::io;

use crate::fifo::FifoMemory;

/// Whether to create the segment or attach to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmOpenMode {
    /// Create exclusively; fail if the name exists.
    Create,
    /// Attach; fail if the name does not exist.
    Open,
}

/// A mapped, named shared-memory segment of fixed size.
pub struct ShmMemory {
    mem: *mut u8,
    size: usize,
    name: String,
    owner: bool,
    #[cfg(windows)]
    handle: windows_sys::Win32::Foundation::HANDLE,
}

// Safety: the mapping is plain bytes; `&mut` access is serialised by the
// owning queue's lock.
unsafe impl Send for ShmMemory {}

impl ShmMemory {
    /// Map `size` bytes under `name`. A freshly created segment reads as
    /// zeroes. The creator removes the name again on drop.
    pub fn acquire(name: &str, size: usize, mode: ShmOpenMode) -> io::Result<Self> {
        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }
        if size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "size is 0"));
        }
        sys::acquire(name, size, mode)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this handle created the segment.
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    /// Remove a leftover segment by name.
    pub fn clear_storage(name: &str) {
        sys::unlink(name);
    }
}

impl FifoMemory for ShmMemory {
    fn as_slice(&self) -> &[u8] {
        // Safety: `mem` maps `size` bytes for the lifetime of `self`.
        unsafe { std::slice::from_raw_parts(self.mem, self.size) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // Safety: as above, and `&mut self` makes the borrow unique in this
        // process.
        unsafe { std::slice::from_raw_parts_mut(self.mem, self.size) }
    }
}

impl Drop for ShmMemory {
    fn drop(&mut self) {
        sys::release(self);
    }
}

#[cfg(unix)]
mod sys {
    use std::ffi::CString;
    use std::io;
    use std::ptr;

    use super::{ShmMemory, ShmOpenMode};

    fn posix_name(name: &str) -> io::Result<CString> {
        let name = if name.starts_with('/') {
            name.to_owned()
        } else {
            format!("/{name}")
        };
        CString::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }

    pub(super) fn acquire(name: &str, size: usize, mode: ShmOpenMode) -> io::Result<ShmMemory> {
        let c_name = posix_name(name)?;
        let perms: libc::mode_t = 0o660;
        let flags = match mode {
            ShmOpenMode::Create => libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
            ShmOpenMode::Open => libc::O_RDWR,
        };

        let fd = unsafe { libc::shm_open(c_name.as_ptr(), flags, perms as libc::c_uint) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }

        if mode == ShmOpenMode::Open {
            // Mapping past the end of the object would fault on first write.
            if let Err(err) = check_size(fd, size) {
                unsafe { libc::close(fd) };
                return Err(err);
            }
        }

        if mode == ShmOpenMode::Create {
            let ret = unsafe { libc::ftruncate(fd, size as libc::off_t) };
            if ret != 0 {
                let err = io::Error::last_os_error();
                unsafe {
                    libc::close(fd);
                    libc::shm_unlink(c_name.as_ptr());
                }
                return Err(err);
            }
        }

        let mem = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        unsafe { libc::close(fd) };

        if mem == libc::MAP_FAILED {
            let err = io::Error::last_os_error();
            if mode == ShmOpenMode::Create {
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
            }
            return Err(err);
        }

        Ok(ShmMemory {
            mem: mem as *mut u8,
            size,
            name: name.to_owned(),
            owner: mode == ShmOpenMode::Create,
        })
    }

    fn check_size(fd: libc::c_int, size: usize) -> io::Result<()> {
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut st) } != 0 {
            return Err(io::Error::last_os_error());
        }
        if (st.st_size as u64) < size as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("segment is {} bytes, {size} requested", st.st_size),
            ));
        }
        Ok(())
    }

    pub(super) fn release(shm: &mut ShmMemory) {
        if shm.mem.is_null() {
            return;
        }
        unsafe { libc::munmap(shm.mem as *mut libc::c_void, shm.size) };
        shm.mem = ptr::null_mut();
        if shm.owner {
            unlink(&shm.name);
        }
    }

    pub(super) fn unlink(name: &str) {
        if let Ok(c_name) = posix_name(name) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }
}

#[cfg(windows)]
mod sys {
    use std::io;
    use std::ptr;

    use windows_sys::Win32::Foundation::{
        CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, FALSE, INVALID_HANDLE_VALUE,
    };
    use windows_sys::Win32::System::Memory::{
        CreateFileMappingW, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
        FILE_MAP_ALL_ACCESS, MEMORY_MAPPED_VIEW_ADDRESS, PAGE_READWRITE, SEC_COMMIT,
    };

    use super::{ShmMemory, ShmOpenMode};

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    pub(super) fn acquire(name: &str, size: usize, mode: ShmOpenMode) -> io::Result<ShmMemory> {
        let wide_name = to_wide(name);
        let handle = match mode {
            ShmOpenMode::Create => {
                let h = unsafe {
                    CreateFileMappingW(
                        INVALID_HANDLE_VALUE,
                        ptr::null(),
                        PAGE_READWRITE | SEC_COMMIT,
                        ((size as u64) >> 32) as u32,
                        size as u32,
                        wide_name.as_ptr(),
                    )
                };
                if h.is_null() {
                    return Err(io::Error::last_os_error());
                }
                if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
                    unsafe { CloseHandle(h) };
                    return Err(io::Error::new(io::ErrorKind::AlreadyExists, "shm already exists"));
                }
                h
            }
            ShmOpenMode::Open => {
                let h = unsafe { OpenFileMappingW(FILE_MAP_ALL_ACCESS, FALSE, wide_name.as_ptr()) };
                if h.is_null() {
                    return Err(io::Error::last_os_error());
                }
                h
            }
        };

        let view = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, size) };
        if view.Value.is_null() {
            let err = io::Error::last_os_error();
            unsafe { CloseHandle(handle) };
            return Err(err);
        }

        Ok(ShmMemory {
            mem: view.Value as *mut u8,
            size,
            name: name.to_owned(),
            owner: mode == ShmOpenMode::Create,
            handle,
        })
    }

    pub(super) fn release(shm: &mut ShmMemory) {
        if !shm.mem.is_null() {
            unsafe {
                UnmapViewOfFile(MEMORY_MAPPED_VIEW_ADDRESS {
                    Value: shm.mem as *mut _,
                })
            };
            shm.mem = ptr::null_mut();
        }
        if !shm.handle.is_null() {
            unsafe { CloseHandle(shm.handle) };
            shm.handle = ptr::null_mut();
        }
    }

    // The mapping disappears with its last handle.
    pub(super) fn unlink(_name: &str) {}
}
