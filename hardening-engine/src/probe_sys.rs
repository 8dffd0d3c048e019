use libc::size_t;
use nix::sys::ioctl::ioctl_num_type;
use nix::unistd::{sysconf, SysconfVar};

// Slack past one page so every mapping spans two pages.
pub const REGION_SLACK: usize = 10;

// ashmem ioctl magic 'w' = 0x77, see linux/ashmem.h
const ASHMEM_IOC_MAGIC: u8 = 0x77;

/// `ASHMEM_SET_SIZE` = `_IOW(0x77, 3, size_t)`, takes the region size by value.
pub const ASHMEM_SET_SIZE: ioctl_num_type =
    nix::request_code_write!(ASHMEM_IOC_MAGIC, 3, std::mem::size_of::<size_t>());

pub const ASHMEM_DEVICE: &str = "/dev/ashmem";

/// Name given to shared memory regions created by the probes.
pub const REGION_NAME: &std::ffi::CStr = c"hardeningtest";

pub const MEMFD_NAME: &std::ffi::CStr = c"hardeningtest_memfd";

#[cfg(target_os = "android")]
#[link(name = "android")]
extern "C" {
    pub fn ASharedMemory_create(name: *const libc::c_char, size: size_t) -> libc::c_int;
}

pub fn page_size() -> anyhow::Result<usize> {
    let size = sysconf(SysconfVar::PAGE_SIZE)?
        .ok_or_else(|| anyhow::anyhow!("PAGE_SIZE is not reported by sysconf"))?;
    Ok(size as usize)
}

/// Length of every buffer, file and region the probes create: one page plus a few bytes.
pub fn region_len() -> anyhow::Result<usize> {
    Ok(page_size()? + REGION_SLACK)
}
