//! Probes for executable anonymous memory and write-then-exec file mappings.

use anyhow::{Context, Result};
use nix::sys::mman::{MapFlags, ProtFlags};
use std::fs::File;
use std::io::Write;
use std::os::unix::io::{AsFd, OwnedFd};

use crate::mapping::Mapping;
use crate::outcome::ProbeOutcome;
use crate::probe_sys::region_len;

/// Requests an execute-only anonymous private mapping spanning more than one page.
pub fn execmem() -> Result<ProbeOutcome> {
    let len = region_len()?;

    match Mapping::anonymous(len, ProtFlags::PROT_EXEC) {
        Ok(mapping) => {
            drop(mapping);
            Ok(ProbeOutcome::Permitted)
        }
        Err(errno) => ProbeOutcome::blocked(errno),
    }
}

/// Writes a zeroed buffer into `fd`, maps it private and writable, modifies the
/// mapped copy and then asks for the region to become executable.
///
/// `fd` must be writable and empty. It is closed as soon as the mapping exists.
pub fn execmod(fd: OwnedFd) -> Result<ProbeOutcome> {
    let len = region_len()?;
    let buf = vec![0u8; len];

    let mut file = File::from(fd);
    // Single write, the file has to hold exactly one region before it is mapped
    let written = file.write(&buf).context("Failed to write execmod buffer")?;
    if written != len {
        anyhow::bail!("Short write to execmod fixture: {} of {} bytes", written, len);
    }

    let mapping = Mapping::file(file.as_fd(), len, ProtFlags::PROT_WRITE, MapFlags::MAP_PRIVATE);
    drop(file);
    let mapping = mapping.map_err(|errno| anyhow::anyhow!("Failed to map execmod fixture: {}", errno))?;

    let byte = unsafe { mapping.bump_first_byte() };
    tracing::debug!(byte, "Modified private file mapping");

    match mapping.protect(ProtFlags::PROT_EXEC) {
        Ok(()) => Ok(ProbeOutcome::Permitted),
        Err(errno) => ProbeOutcome::blocked(errno),
    }
}
