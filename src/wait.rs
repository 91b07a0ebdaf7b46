//! Parent-side process waiter with deadline-driven signal escalation.
//!
//! The loop polls the child with `waitpid(WNOHANG)` and never blocks the
//! caller until escalation is exhausted. Once the deadline elapses, the next
//! signal in the sequence is sent on the very next iteration — SIGTERM, then
//! one poll interval later SIGKILL, then a final blocking wait that
//! guarantees the child is reaped even if it ignored SIGTERM (SIGKILL cannot
//! be ignored).

use crate::error::{process_fault, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::time::{Duration, Instant};

/// Exit code reported when the OS gives no usable status, i.e. the child
/// was terminated by a signal.
pub const SIGNALED_EXIT_CODE: i32 = 99;

/// Graceful-then-forceful termination sequence for an overrunning child.
static ESCALATION: [Signal; 2] = [Signal::SIGTERM, Signal::SIGKILL];

/// Delay between unsuccessful polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Poll `child` until it terminates, escalating through [`ESCALATION`] once
/// `timeout` has elapsed. Returns the child's exit code, or
/// [`SIGNALED_EXIT_CODE`] for a signal termination.
///
/// A child that vanishes mid-check (already reaped, or gone between poll
/// and kill) is treated as having exited cleanly: the benign interpretation
/// of the race is deliberate, matching the reconstruction contract.
pub fn wait_with_escalation(child: Pid, timeout: Duration) -> Result<i32> {
    let start = Instant::now();
    let mut pending = ESCALATION.iter();

    loop {
        match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {
                if start.elapsed() > timeout {
                    if let Some(signal) = pending.next() {
                        log::warn!(
                            "child {child} exceeded {timeout:?}, sending {signal}"
                        );
                        match kill(child, *signal) {
                            Ok(()) => {}
                            // Child vanished between poll and kill.
                            Err(Errno::ESRCH) | Err(Errno::EPERM) => return Ok(0),
                            Err(e) => return Err(process_fault("kill(child)", e)),
                        }
                        if pending.as_slice().is_empty() {
                            // Sequence exhausted; SIGKILL is terminal, so a
                            // blocking wait is guaranteed to return.
                            return reap_blocking(child);
                        }
                    }
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, _, _)) => return Ok(SIGNALED_EXIT_CODE),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            // Already reaped elsewhere; assume a clean exit.
            Err(Errno::ECHILD) => return Ok(0),
            Err(e) => return Err(process_fault("waitpid(child)", e)),
        }
    }
}

fn reap_blocking(child: Pid) -> Result<i32> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, _, _)) => return Ok(SIGNALED_EXIT_CODE),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(0),
            Err(e) => return Err(process_fault("waitpid(final)", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{fork, ForkResult};
    use std::time::Instant;

    fn fork_child(body: impl FnOnce()) -> Pid {
        match unsafe { fork() }.expect("fork failed") {
            ForkResult::Child => {
                body();
                unsafe { libc::_exit(0) }
            }
            ForkResult::Parent { child } => child,
        }
    }

    #[test]
    fn returns_exit_code_of_completed_child() {
        let child = fork_child(|| unsafe { libc::_exit(7) });
        let code = wait_with_escalation(child, Duration::from_secs(5)).unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn escalates_and_reaps_overrunning_child() {
        let child = fork_child(|| {
            std::thread::sleep(Duration::from_secs(30));
        });
        let start = Instant::now();
        let code = wait_with_escalation(child, Duration::from_millis(50)).unwrap();
        assert_eq!(code, SIGNALED_EXIT_CODE);
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "escalation took {:?}",
            start.elapsed()
        );
        // Already reaped: a second wait must report no such child.
        assert_eq!(waitpid(child, None), Err(Errno::ECHILD));
    }

    #[test]
    fn sigterm_ignoring_child_is_killed_by_escalation() {
        let child = fork_child(|| {
            unsafe { libc::signal(libc::SIGTERM, libc::SIG_IGN) };
            std::thread::sleep(Duration::from_secs(30));
        });
        let start = Instant::now();
        let code = wait_with_escalation(child, Duration::from_millis(50)).unwrap();
        assert_eq!(code, SIGNALED_EXIT_CODE);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn already_reaped_child_counts_as_clean_exit() {
        let child = fork_child(|| unsafe { libc::_exit(3) });
        // Reap out-of-band, then ask the waiter.
        loop {
            match waitpid(child, None) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => panic!("waitpid failed: {e}"),
            }
        }
        let code = wait_with_escalation(child, Duration::from_secs(1)).unwrap();
        assert_eq!(code, 0);
    }
}
