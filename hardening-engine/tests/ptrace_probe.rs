use hardening_engine::ptrace::{attach_forked_child, CHILD_LINGER};
use hardening_engine::ProbeOutcome;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::errno::Errno;

#[test]
fn test_attach_leaves_child_to_exit_normally() {
    let attempt = attach_forked_child().expect("ptrace probe setup failed");

    match attempt.outcome {
        ProbeOutcome::Permitted => {}
        ProbeOutcome::Blocked(errno) => {
            assert!(attempt.outcome.code() > 0);
            assert!(matches!(errno, Errno::EPERM | Errno::EACCES), "unexpected errno {:?}", errno);
        }
    }

    // Neither path may leave the child stopped under trace
    let status = waitpid(attempt.child, None).unwrap();
    assert_eq!(status, WaitStatus::Exited(attempt.child, 0));
    assert!(CHILD_LINGER.as_millis() > 0);
}
