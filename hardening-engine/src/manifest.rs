use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::ProbeKind;
use crate::probe_sys::ASHMEM_DEVICE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeManifest {
    #[serde(default = "default_fixture_dir")]
    pub fixture_dir: PathBuf,

    #[serde(default = "default_probes")]
    pub probes: Vec<ProbeKind>,

    #[serde(default = "default_ashmem_device")]
    pub ashmem_device: PathBuf,

    /// Passed through to the debugger-attach probe, which does not use it.
    #[serde(default)]
    pub debug_target_pid: Option<i32>,
}

fn default_fixture_dir() -> PathBuf {
    std::env::temp_dir().join("hardening-probe")
}

fn default_probes() -> Vec<ProbeKind> {
    ProbeKind::ALL.to_vec()
}

fn default_ashmem_device() -> PathBuf {
    PathBuf::from(ASHMEM_DEVICE)
}

impl Default for ProbeManifest {
    fn default() -> Self {
        Self {
            fixture_dir: default_fixture_dir(),
            probes: default_probes(),
            ashmem_device: default_ashmem_device(),
            debug_target_pid: None,
        }
    }
}

impl ProbeManifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read manifest")?;
        serde_json::from_str(&content).context("Failed to parse manifest")
    }
}
