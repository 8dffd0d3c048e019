use anyhow::{Context, Result};
use nix::sys::ptrace;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::time::Duration;

use crate::outcome::ProbeOutcome;

// How long the forked child stays around as an attach target before exiting.
pub const CHILD_LINGER: Duration = Duration::from_millis(250);

/// Result of one attach attempt against a freshly forked child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachAttempt {
    pub outcome: ProbeOutcome,
    /// The forked child. It exits on its own once `CHILD_LINGER` has passed and is
    /// left for the caller to reap.
    pub child: Pid,
}

/// Forks and tries to attach to the child as a debugger.
///
/// `_target` is accepted for interface compatibility with harnesses that pass
/// the pid of their main process, but the attach always goes to the forked
/// child. The child is not reaped here.
pub fn debugger_attach(_target: Pid) -> Result<ProbeOutcome> {
    attach_forked_child().map(|attempt| attempt.outcome)
}

pub fn attach_forked_child() -> Result<AttachAttempt> {
    match unsafe { unistd::fork() }.context("Fork failed")? {
        ForkResult::Child => {
            // Attach target only. No PTRACE_TRACEME: it is racy and not what is tested.
            std::thread::sleep(CHILD_LINGER);
            unsafe { libc::_exit(0) }
        }
        ForkResult::Parent { child } => {
            if let Err(errno) = ptrace::attach(child) {
                tracing::debug!(pid = %child, error = %errno, "ptrace attach refused");
                let outcome = ProbeOutcome::blocked(errno)?;
                return Ok(AttachAttempt { outcome, child });
            }

            // The tracee must reach its attach stop before PTRACE_DETACH is accepted
            match waitpid(child, None).context("waitpid on traced child failed")? {
                WaitStatus::Stopped(pid, signal) => {
                    tracing::debug!(pid = %pid, signal = ?signal, "Child stopped under trace");
                }
                status => anyhow::bail!("Traced child did not stop: {:?}", status),
            }

            // No signal injected, so the attach SIGSTOP is discarded and the child resumes
            ptrace::detach(child, None).context("ptrace detach failed")?;

            Ok(AttachAttempt { outcome: ProbeOutcome::Permitted, child })
        }
    }
}
