use nix::errno::Errno;
use nix::sys::mman::{MapFlags, ProtFlags};
use std::os::unix::io::{AsRawFd, BorrowedFd};
use std::ptr::NonNull;

/// A live memory mapping, unmapped when dropped.
///
/// Probes hold one of these across every fallible step so that no return path
/// leaves the region mapped.
pub struct Mapping {
    addr: NonNull<libc::c_void>,
    len: usize,
}

impl Mapping {
    pub fn anonymous(len: usize, prot: ProtFlags) -> Result<Self, Errno> {
        Self::map(len, prot, MapFlags::MAP_PRIVATE | MapFlags::MAP_ANONYMOUS, -1)
    }

    pub fn file(fd: BorrowedFd<'_>, len: usize, prot: ProtFlags, flags: MapFlags) -> Result<Self, Errno> {
        Self::map(len, prot, flags, fd.as_raw_fd())
    }

    fn map(len: usize, prot: ProtFlags, flags: MapFlags, fd: libc::c_int) -> Result<Self, Errno> {
        let addr = unsafe {
            libc::mmap(std::ptr::null_mut(), len, prot.bits(), flags.bits(), fd, 0)
        };
        if addr == libc::MAP_FAILED {
            // errno must be read before anything else touches it
            return Err(Errno::last());
        }
        let addr = NonNull::new(addr).ok_or(Errno::EINVAL)?;
        tracing::debug!(addr = ?addr, len, prot = ?prot, "Mapped region");
        Ok(Self { addr, len })
    }

    pub fn protect(&self, prot: ProtFlags) -> Result<(), Errno> {
        let ret = unsafe { libc::mprotect(self.addr.as_ptr(), self.len, prot.bits()) };
        Errno::result(ret).map(drop)
    }

    pub fn addr(&self) -> usize {
        self.addr.as_ptr() as usize
    }

    /// Increments the first byte of the region in place.
    ///
    /// # Safety
    /// The region must currently be writable.
    pub unsafe fn bump_first_byte(&self) -> u8 {
        let byte = self.addr.as_ptr() as *mut u8;
        let value = std::ptr::read_volatile(byte).wrapping_add(1);
        std::ptr::write_volatile(byte, value);
        value
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        let ret = unsafe { libc::munmap(self.addr.as_ptr(), self.len) };
        if ret != 0 {
            tracing::warn!(addr = ?self.addr, len = self.len, error = %Errno::last(), "Failed to unmap region");
        }
    }
}
