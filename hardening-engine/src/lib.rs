pub mod catalog;
pub mod exec;
pub mod fixtures;
pub mod manifest;
pub mod mapping;
pub mod memory;
pub mod outcome;
pub mod probe_sys;
pub mod ptrace;
pub mod shmem;

pub use catalog::{Category, ProbeKind};
pub use manifest::ProbeManifest;
pub use outcome::{errno_name, ExecOutcome, ProbeOutcome, Verdict};

const MIN_KERNEL: (u32, u32) = (3, 17);

/// Refuses to run on kernels that predate `memfd_create`.
pub fn check_platform_compatibility() -> anyhow::Result<()> {
    let uts = nix::sys::utsname::uname()?;
    let release = uts.release().to_string_lossy();

    if let Some(version) = kernel_version(&release) {
        if version < MIN_KERNEL {
            anyhow::bail!(
                "Kernel too old: {}. Need {}.{}+ for memfd_create.",
                release, MIN_KERNEL.0, MIN_KERNEL.1
            );
        }
    }

    Ok(())
}

/// Major and minor number from a release string such as `6.1.0-13-amd64`.
pub fn kernel_version(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split(['.', '-']);
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}
