// Single test in its own binary: it reads this process's memory map.

use hardening_engine::memory::{execmem, execmod};
use hardening_engine::shmem::{exec_appdomain_tmpfs, execute_ashmem_libcutils};
use std::fs::OpenOptions;

// Execute-only private mappings and anything backed by the probes' own objects.
fn leftover_regions() -> Vec<String> {
    std::fs::read_to_string("/proc/self/maps")
        .unwrap()
        .lines()
        .filter(|line| {
            let perms = line.split_whitespace().nth(1).unwrap_or("");
            perms == "--xp" || line.contains("hardeningtest") || line.contains("execmod_exe")
        })
        .map(str::to_string)
        .collect()
}

#[test]
fn test_probes_release_their_mappings() {
    let before = leftover_regions();

    execmem().unwrap();
    exec_appdomain_tmpfs().unwrap();
    execute_ashmem_libcutils().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(dir.path().join("execmod_exe"))
        .unwrap();
    execmod(file.into()).unwrap();

    assert_eq!(leftover_regions(), before);
}
