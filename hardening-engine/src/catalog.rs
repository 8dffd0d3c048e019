//! The set of probes, their stable names and how each one is invoked.

use anyhow::Result;
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::manifest::ProbeManifest;
use crate::outcome::ProbeOutcome;
use crate::{exec, fixtures, memory, ptrace, shmem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Execmem,
    Execmod,
    ExecAppdomainTmpfs,
    ExecuteAshmem,
    ExecuteAshmemLibcutils,
    Ptrace,
    ExecAppDataFile,
    ExecAppDataFilePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Dynamic code execution from memory.
    Memory,
    /// Dynamic code execution from app-private storage.
    Storage,
    Debugging,
}

impl ProbeKind {
    /// Every probe, with the ones that can replace the process image last.
    pub const ALL: [ProbeKind; 8] = [
        ProbeKind::Execmem,
        ProbeKind::Execmod,
        ProbeKind::ExecAppdomainTmpfs,
        ProbeKind::ExecuteAshmem,
        ProbeKind::ExecuteAshmemLibcutils,
        ProbeKind::Ptrace,
        ProbeKind::ExecAppDataFile,
        ProbeKind::ExecAppDataFilePath,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Execmem => "execmem",
            ProbeKind::Execmod => "execmod",
            ProbeKind::ExecAppdomainTmpfs => "exec_appdomain_tmpfs",
            ProbeKind::ExecuteAshmem => "execute_ashmem",
            ProbeKind::ExecuteAshmemLibcutils => "execute_ashmem_libcutils",
            ProbeKind::Ptrace => "ptrace",
            ProbeKind::ExecAppDataFile => "exec_app_data_file",
            ProbeKind::ExecAppDataFilePath => "exec_app_data_file_path",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ProbeKind::ExecAppDataFile | ProbeKind::ExecAppDataFilePath => Category::Storage,
            ProbeKind::Ptrace => Category::Debugging,
            _ => Category::Memory,
        }
    }

    /// Whether a successful attempt replaces the calling process instead of returning.
    pub fn replaces_image(&self) -> bool {
        self.category() == Category::Storage
    }

    /// Prepares whatever descriptor the probe needs and runs it once.
    pub fn run(&self, manifest: &ProbeManifest) -> Result<ProbeOutcome> {
        tracing::debug!(probe = %self, "Running probe");

        match self {
            ProbeKind::Execmem => memory::execmem(),
            ProbeKind::Execmod => {
                fixtures::ensure_fixture_dir(&manifest.fixture_dir)?;
                let fd = fixtures::create_execmod_fixture(&manifest.fixture_dir)?;
                memory::execmod(fd)
            }
            ProbeKind::ExecAppdomainTmpfs => shmem::exec_appdomain_tmpfs(),
            ProbeKind::ExecuteAshmem => shmem::execute_ashmem(&manifest.ashmem_device),
            ProbeKind::ExecuteAshmemLibcutils => shmem::execute_ashmem_libcutils(),
            ProbeKind::Ptrace => {
                let target = manifest
                    .debug_target_pid
                    .map(Pid::from_raw)
                    .unwrap_or_else(Pid::this);
                ptrace::debugger_attach(target)
            }
            ProbeKind::ExecAppDataFile => {
                fixtures::ensure_fixture_dir(&manifest.fixture_dir)?;
                let fd = fixtures::create_app_data_exe_fixture(&manifest.fixture_dir)?;
                exec::exec_app_data_file(fd).map(ProbeOutcome::from)
            }
            ProbeKind::ExecAppDataFilePath => {
                fixtures::ensure_fixture_dir(&manifest.fixture_dir)?;
                exec::exec_app_data_file_path(&manifest.fixture_dir).map(ProbeOutcome::from)
            }
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProbeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ProbeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown probe: {}", s))
    }
}
