use hardening_engine::shmem::{exec_appdomain_tmpfs, execute_ashmem, execute_ashmem_libcutils, SharedRegion};
use hardening_engine::ProbeOutcome;
use nix::errno::Errno;
use std::path::{Path, PathBuf};

#[test]
fn test_memfd_probe_returns_contract_code() {
    let outcome = exec_appdomain_tmpfs().expect("memfd probe setup failed");
    assert!(outcome.code() >= 0);
}

#[test]
fn test_library_region_probe_returns_contract_code() {
    let outcome = execute_ashmem_libcutils().expect("shared memory probe setup failed");
    assert!(outcome.code() >= 0);
}

#[test]
fn test_missing_ashmem_device_is_reported_as_errno() {
    let outcome = execute_ashmem(Path::new("/nonexistent/ashmem")).expect("ashmem probe setup failed");
    assert_eq!(outcome, ProbeOutcome::Blocked(Errno::ENOENT));
}

#[test]
fn test_device_that_rejects_set_size_is_a_fault() {
    // /dev/null opens read-write but knows nothing about ASHMEM_SET_SIZE
    let region = SharedRegion::LegacyDevice(PathBuf::from("/dev/null"));
    assert!(region.probe().is_err());
}

#[test]
fn test_default_region_is_the_ashmem_node() {
    assert_eq!(SharedRegion::default(), SharedRegion::LegacyDevice(PathBuf::from("/dev/ashmem")));
}
