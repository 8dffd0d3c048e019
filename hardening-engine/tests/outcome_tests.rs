use hardening_engine::{errno_name, ExecOutcome, ProbeOutcome, Verdict};
use nix::errno::Errno;

#[test]
fn test_permitted_encodes_as_zero() {
    assert_eq!(ProbeOutcome::Permitted.code(), 0);
    assert!(!ProbeOutcome::Permitted.is_blocked());
    assert_eq!(ProbeOutcome::from_code(0), Some(ProbeOutcome::Permitted));
}

#[test]
fn test_blocked_encodes_errno() {
    let outcome = ProbeOutcome::blocked(Errno::EACCES).unwrap();
    assert_eq!(outcome.code(), libc::EACCES);
    assert!(outcome.is_blocked());
    assert_eq!(ProbeOutcome::from_code(libc::EPERM), Some(ProbeOutcome::Blocked(Errno::EPERM)));
}

#[test]
fn test_missing_errno_is_a_fault() {
    // errno 0 means the failure reason was lost, never a verdict
    assert!(ProbeOutcome::blocked(Errno::UnknownErrno).is_err());
}

#[test]
fn test_exec_outcome_maps_onto_probe_outcome() {
    assert_eq!(ExecOutcome::Failed(Errno::EACCES).code(), libc::EACCES);
    assert_eq!(ExecOutcome::Replaced.code(), 0);
    assert_eq!(ProbeOutcome::from(ExecOutcome::Replaced), ProbeOutcome::Permitted);
}

#[test]
fn test_verdict_tri_state() {
    assert_eq!(Verdict::of(&Ok(ProbeOutcome::Blocked(Errno::EPERM))), Verdict::Present);
    assert_eq!(Verdict::of(&Ok(ProbeOutcome::Permitted)), Verdict::Absent);
    assert_eq!(Verdict::of(&Err(anyhow::anyhow!("fork failed"))), Verdict::Error);
    assert_eq!(serde_json::to_string(&Verdict::Present).unwrap(), "\"present\"");
}

#[test]
fn test_errno_names() {
    assert_eq!(errno_name(libc::EACCES), "EACCES");
    assert_eq!(errno_name(libc::EPERM), "EPERM");
    assert_eq!(errno_name(0), "0");
    assert_eq!(errno_name(99999), "99999");
    assert_eq!(ProbeOutcome::Blocked(Errno::EACCES).to_string(), "blocked (EACCES)");
}

#[test]
fn test_codes_outside_contract_are_rejected() {
    assert_eq!(ProbeOutcome::from_code(-1), None);
    assert_eq!(ProbeOutcome::from_code(-libc::EACCES), None);
    // Positive but unknown: would otherwise encode back as 0
    assert_eq!(ProbeOutcome::from_code(99999), None);
}
