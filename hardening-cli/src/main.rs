use clap::Parser;
use hardening_engine::{errno_name, ProbeKind, ProbeManifest, ProbeOutcome, Verdict};
use serde::Serialize;
use std::io::Write;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to run manifest (JSON)
    #[arg(long, short)]
    manifest: Option<std::path::PathBuf>,

    /// Directory for fixture files, overrides the manifest
    #[arg(long)]
    fixture_dir: Option<std::path::PathBuf>,

    /// Print the available probes and exit
    #[arg(long)]
    list: bool,

    /// Probes to run, overrides the manifest selection
    probes: Vec<ProbeKind>,
}

#[derive(Serialize)]
struct ProbeReport {
    probe: ProbeKind,
    code: Option<i32>,
    errno: Option<String>,
    verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ProbeReport {
    fn new(probe: ProbeKind, result: &anyhow::Result<ProbeOutcome>) -> Self {
        let verdict = Verdict::of(result);
        match result {
            Ok(outcome) => Self {
                probe,
                code: Some(outcome.code()),
                errno: outcome.is_blocked().then(|| errno_name(outcome.code())),
                verdict,
                error: None,
            },
            Err(e) => Self {
                probe,
                code: None,
                errno: None,
                verdict,
                error: Some(format!("{:#}", e)),
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if cli.list {
        for probe in ProbeKind::ALL {
            println!("{}\t{:?}", probe, probe.category());
        }
        return Ok(());
    }

    hardening_engine::check_platform_compatibility()?;

    let mut manifest = match &cli.manifest {
        Some(path) => ProbeManifest::load(path)?,
        None => ProbeManifest::default(),
    };
    if let Some(dir) = cli.fixture_dir {
        manifest.fixture_dir = dir;
    }
    if !cli.probes.is_empty() {
        manifest.probes = cli.probes;
    }
    if manifest.debug_target_pid.is_none() {
        manifest.debug_target_pid = Some(nix::unistd::getpid().as_raw());
    }

    // Probes that may replace this process run after everything else
    let mut probes = manifest.probes.clone();
    probes.sort_by_key(|probe| probe.replaces_image());

    tracing::info!(probes = ?probes, fixture_dir = ?manifest.fixture_dir, "Running hardening probes");

    let mut faults = 0;
    for probe in probes {
        if probe.replaces_image() {
            tracing::warn!(probe = %probe, "A permitted attempt replaces this process and produces no report");
        }
        // Reports printed so far must not be lost if the exec goes through
        std::io::stdout().flush()?;

        let result = probe.run(&manifest);
        match &result {
            Ok(outcome) => tracing::info!(probe = %probe, outcome = %outcome, "Probe finished"),
            Err(e) => {
                faults += 1;
                tracing::error!(probe = %probe, error = %e, "Probe setup failed");
            }
        }

        println!("{}", serde_json::to_string(&ProbeReport::new(probe, &result))?);
    }

    if faults > 0 {
        anyhow::bail!("{} probe(s) failed to set up", faults);
    }

    Ok(())
}
