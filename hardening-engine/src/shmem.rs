//! Probes for executable mappings of shared memory descriptors.
//!
//! Three creation paths are covered: an anonymous memfd, the legacy ashmem
//! device node driven directly, and the platform shared memory library. Each
//! reaches the kernel's exec check through a different route, so the two
//! ashmem variants stay separate.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::mman::{MapFlags, ProtFlags};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsFd, AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};

use crate::mapping::Mapping;
use crate::outcome::ProbeOutcome;
use crate::probe_sys::{region_len, ASHMEM_DEVICE, ASHMEM_SET_SIZE, MEMFD_NAME, REGION_NAME};

/// How a shared memory region is obtained before it is mapped executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedRegion {
    /// Open the ashmem node and size it with `ASHMEM_SET_SIZE`.
    LegacyDevice(PathBuf),
    /// `ASharedMemory_create`, or the memfd sequence it performs off Android.
    Library,
}

impl Default for SharedRegion {
    fn default() -> Self {
        SharedRegion::LegacyDevice(PathBuf::from(ASHMEM_DEVICE))
    }
}

impl SharedRegion {
    pub fn probe(&self) -> Result<ProbeOutcome> {
        let len = region_len()?;
        let fd = match self {
            SharedRegion::LegacyDevice(path) => match open_ashmem_device(path, len)? {
                Ok(fd) => fd,
                Err(errno) => return ProbeOutcome::blocked(errno),
            },
            SharedRegion::Library => create_library_region(len)?,
        };
        map_executable(fd, len)
    }
}

/// Maps a fresh, unsized memfd executable.
pub fn exec_appdomain_tmpfs() -> Result<ProbeOutcome> {
    let len = region_len()?;
    let ret = unsafe { libc::memfd_create(MEMFD_NAME.as_ptr(), libc::MFD_CLOEXEC) };
    let raw = Errno::result(ret).context("memfd_create failed")?;
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    map_executable(fd, len)
}

/// Opens the ashmem device node directly and maps a region of it executable.
pub fn execute_ashmem(device: &Path) -> Result<ProbeOutcome> {
    SharedRegion::LegacyDevice(device.to_path_buf()).probe()
}

/// Creates a region through the shared memory library and maps it executable.
pub fn execute_ashmem_libcutils() -> Result<ProbeOutcome> {
    SharedRegion::Library.probe()
}

// The descriptor is only needed to create the mapping and is closed right after.
fn map_executable(fd: OwnedFd, len: usize) -> Result<ProbeOutcome> {
    let mapping = Mapping::file(fd.as_fd(), len, ProtFlags::PROT_EXEC, MapFlags::MAP_PRIVATE);
    drop(fd);

    match mapping {
        Ok(mapping) => {
            drop(mapping);
            Ok(ProbeOutcome::Permitted)
        }
        Err(errno) => ProbeOutcome::blocked(errno),
    }
}

// Outer error: the region could not be sized. Inner error: the node refused to open,
// which is a verdict.
fn open_ashmem_device(path: &Path, len: usize) -> Result<Result<OwnedFd, Errno>> {
    let c_path = CString::new(path.as_os_str().as_bytes())?;
    let ret = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_CLOEXEC) };
    let fd = match Errno::result(ret) {
        Ok(raw) => unsafe { OwnedFd::from_raw_fd(raw) },
        Err(errno) => {
            tracing::debug!(path = ?path, error = %errno, "ashmem device refused to open");
            return Ok(Err(errno));
        }
    };

    let ret = unsafe { libc::ioctl(fd.as_raw_fd(), ASHMEM_SET_SIZE as _, len as libc::size_t) };
    Errno::result(ret).with_context(|| format!("ASHMEM_SET_SIZE failed on {:?}", path))?;

    Ok(Ok(fd))
}

#[cfg(target_os = "android")]
fn create_library_region(len: usize) -> Result<OwnedFd> {
    let ret = unsafe { crate::probe_sys::ASharedMemory_create(REGION_NAME.as_ptr(), len) };
    let raw = Errno::result(ret).context("ASharedMemory_create failed")?;
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}

#[cfg(not(target_os = "android"))]
fn create_library_region(len: usize) -> Result<OwnedFd> {
    let ret = unsafe { libc::memfd_create(REGION_NAME.as_ptr(), libc::MFD_CLOEXEC) };
    let raw = Errno::result(ret).context("memfd_create failed")?;
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    let ret = unsafe { libc::ftruncate(fd.as_raw_fd(), len as libc::off_t) };
    Errno::result(ret).context("Failed to size shared memory region")?;

    Ok(fd)
}
