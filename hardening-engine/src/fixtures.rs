use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::OwnedFd;
use std::path::Path;

pub const EXECMOD_FIXTURE: &str = "execmod_exe";
pub const APP_DATA_EXE_FIXTURE: &str = "appdata_file_exe";

/// Creates an empty, private, read-write file in `dir` for the execmod probe.
pub fn create_execmod_fixture(dir: &Path) -> Result<OwnedFd> {
    let path = dir.join(EXECMOD_FIXTURE);
    remove_stale(&path)?;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(&path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    Ok(file.into())
}

/// Copies the running executable into `dir` and returns a read-only descriptor to the copy.
pub fn create_app_data_exe_fixture(dir: &Path) -> Result<OwnedFd> {
    let path = dir.join(APP_DATA_EXE_FIXTURE);
    remove_stale(&path)?;

    std::fs::copy("/proc/self/exe", &path)
        .with_context(|| format!("Failed to copy executable to {:?}", path))?;
    let file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
    Ok(file.into())
}

pub fn ensure_fixture_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create fixture dir {:?}", dir))
}

fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove stale fixture {:?}", path)),
    }
}
