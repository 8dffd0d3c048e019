//! Probes that try to launch files from app-private storage.
//!
//! On success neither probe returns: the calling process is replaced by the
//! fixture executable. Only failures come back as values.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::unistd::{execv, fexecve};
use std::ffi::{CStr, CString};
use std::io::ErrorKind;
use std::os::unix::io::{AsRawFd, OwnedFd};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::outcome::ExecOutcome;

const EXEC_ARGV: &[&CStr] = &[c"a"];
const EXEC_ENVP: &[&CStr] = &[c"b"];

/// Executes `fd` directly with `fexecve`.
pub fn exec_app_data_file(fd: OwnedFd) -> Result<ExecOutcome> {
    tracing::info!(fd = fd.as_raw_fd(), "Attempting fexecve, process image may be replaced");

    let errno = match fexecve(fd.as_raw_fd(), EXEC_ARGV, EXEC_ENVP) {
        Err(errno) => errno,
        Ok(never) => match never {},
    };
    drop(fd);

    blocked_exec(errno)
}

/// Copies the running executable into `dir` and executes the copy through its
/// `/proc/self/fd` path.
///
/// A copy or open that is refused (or finds no such directory) reports
/// `EACCES`, matching what a blocked exec would report. The copy is removed on
/// every path that returns.
pub fn exec_app_data_file_path(dir: &Path) -> Result<ExecOutcome> {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
    let path = dir.join(format!("self_exe_{}", nanos));

    let outcome = exec_copy(&path);
    let _ = std::fs::remove_file(&path);
    outcome
}

fn exec_copy(path: &Path) -> Result<ExecOutcome> {
    if let Err(e) = std::fs::copy("/proc/self/exe", path) {
        if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) {
            tracing::debug!(path = ?path, error = %e, "Could not stage executable copy");
            return Ok(ExecOutcome::Failed(Errno::EACCES));
        }
        return Err(e).with_context(|| format!("Failed to copy executable to {:?}", path));
    }

    // Only a refused open of the staged copy counts as a verdict
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) => match e.raw_os_error() {
            Some(code) => return blocked_exec(Errno::from_raw(code)),
            None => return Err(e).context("Failed to open executable copy"),
        },
    };

    let fd_path = CString::new(format!("/proc/self/fd/{}", file.as_raw_fd()))?;
    tracing::info!(path = ?fd_path, "Attempting execv, process image may be replaced");

    let errno = match execv::<&CStr>(&fd_path, &[]) {
        Err(errno) => errno,
        Ok(never) => match never {},
    };
    drop(file);

    blocked_exec(errno)
}

fn blocked_exec(errno: Errno) -> Result<ExecOutcome> {
    if errno as i32 <= 0 {
        anyhow::bail!("exec returned without an errno");
    }
    Ok(ExecOutcome::Failed(errno))
}
