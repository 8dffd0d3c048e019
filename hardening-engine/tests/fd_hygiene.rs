// Single test in its own binary: descriptor numbers are not reused by parallel tests.

use hardening_engine::exec::exec_app_data_file;
use hardening_engine::shmem::execute_ashmem;
use std::os::unix::io::AsRawFd;
use std::path::Path;

fn is_open(fd: i32) -> bool {
    unsafe { libc::fcntl(fd, libc::F_GETFD) != -1 }
}

#[test]
fn test_probes_close_their_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    std::fs::write(&path, b"plain data").unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let raw = file.as_raw_fd();
    let outcome = exec_app_data_file(file.into()).unwrap();
    assert!(outcome.code() > 0);
    assert!(!is_open(raw), "exec probe leaked fd {}", raw);

    let before = std::fs::read_dir("/proc/self/fd").unwrap().count();
    execute_ashmem(Path::new("/nonexistent/ashmem")).unwrap();
    let after = std::fs::read_dir("/proc/self/fd").unwrap().count();
    assert_eq!(before, after);
}
