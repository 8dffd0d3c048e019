//! Result encoding shared by every probe.
//!
//! A probe reports `0` when the forbidden operation went through and the
//! positive errno of the failing call when the kernel refused it. Setup
//! failures never show up here; they surface as `Err` from the probe.

use nix::errno::Errno;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The forbidden operation succeeded. The mitigation is absent.
    Permitted,
    /// The kernel refused the operation with this errno.
    Blocked(Errno),
}

impl ProbeOutcome {
    /// Wraps the errno captured from a failing call.
    ///
    /// An errno of zero means the failure reason was lost, which is a fault in
    /// the probe environment rather than a verdict.
    pub fn blocked(errno: Errno) -> anyhow::Result<Self> {
        if errno as i32 <= 0 {
            anyhow::bail!("Failing call left no errno behind");
        }
        Ok(Self::Blocked(errno))
    }

    /// Decodes an integer result. Negative codes and values that are not a known
    /// errno break the contract and yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Permitted),
            c if c < 0 => None,
            c => match Errno::from_raw(c) {
                Errno::UnknownErrno => None,
                errno => Some(Self::Blocked(errno)),
            },
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Permitted => 0,
            Self::Blocked(errno) => *errno as i32,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permitted => f.write_str("permitted"),
            Self::Blocked(errno) => write!(f, "blocked ({})", errno_name(*errno as i32)),
        }
    }
}

/// Outcome of a probe that replaces the process image on success.
///
/// `Replaced` exists for symmetry with the integer contract: when exec works the
/// calling process is gone, so the variant is never returned. Harnesses have to
/// notice the replacement out of band (the expected reply never arrives).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    Failed(Errno),
    Replaced,
}

impl ExecOutcome {
    pub fn code(&self) -> i32 {
        ProbeOutcome::from(*self).code()
    }
}

impl From<ExecOutcome> for ProbeOutcome {
    fn from(outcome: ExecOutcome) -> Self {
        match outcome {
            ExecOutcome::Failed(errno) => ProbeOutcome::Blocked(errno),
            ExecOutcome::Replaced => ProbeOutcome::Permitted,
        }
    }
}

/// Human readable state of the mitigation a probe checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Present,
    Absent,
    Error,
}

impl Verdict {
    pub fn of(result: &anyhow::Result<ProbeOutcome>) -> Self {
        match result {
            Ok(ProbeOutcome::Blocked(_)) => Verdict::Present,
            Ok(ProbeOutcome::Permitted) => Verdict::Absent,
            Err(_) => Verdict::Error,
        }
    }
}

/// Symbolic name for an errno value (`EACCES`), or the number itself when unknown.
pub fn errno_name(code: i32) -> String {
    match Errno::from_raw(code) {
        Errno::UnknownErrno => code.to_string(),
        errno => format!("{:?}", errno),
    }
}
