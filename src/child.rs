//! Child-side task runner.
//!
//! Forks, executes the task once in the child, and reports any failure
//! through the error channel before terminating. The child exits via
//! `libc::_exit` on both paths: it is a copy of the parent's state at fork
//! time, so running inherited atexit hooks or flushing inherited stdio
//! buffers would duplicate the parent's own cleanup.

use crate::channel::ErrorChannel;
use crate::error::{process_fault, Result};
use crate::report::{capture_backtrace, panic_message, FailureReport, PANIC_KIND};
use nix::unistd::{close, fork, ForkResult, Pid};
use std::os::unix::io::RawFd;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

/// Panic report recorded by the hook installed in the child. Only ever
/// populated post-fork, where a single thread exists.
static LAST_PANIC: Mutex<Option<FailureReport>> = Mutex::new(None);

/// Fork and run `task` in the child. Returns the child pid to the parent;
/// the child never returns from this call.
///
/// Child protocol: exit code 0 and no payload on success; exit code 1 after
/// writing exactly one [`FailureReport`] on failure. The write end of the
/// channel is closed before termination on both paths.
pub fn spawn_task<F, E>(channel: &ErrorChannel, task: F) -> Result<Pid>
where
    F: FnOnce() -> std::result::Result<(), E>,
    E: std::error::Error,
{
    match unsafe { fork() }.map_err(|e| process_fault("fork(task)", e))? {
        ForkResult::Child => {
            channel.close_read();
            let code = run_task(channel.write_fd(), task);
            unsafe { libc::_exit(code) }
        }
        ForkResult::Parent { child } => Ok(child),
    }
}

fn run_task<F, E>(report_fd: RawFd, task: F) -> i32
where
    F: FnOnce() -> std::result::Result<(), E>,
    E: std::error::Error,
{
    install_panic_recorder();
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(())) => {
            let _ = close(report_fd);
            0
        }
        Ok(Err(err)) => {
            // Report delivery is best-effort: if the write fails the
            // non-zero exit code still marks the invocation as failed.
            let _ = ErrorChannel::write_report(report_fd, &FailureReport::from_error(&err));
            1
        }
        Err(payload) => {
            let report = take_recorded_panic()
                .unwrap_or_else(|| FailureReport::from_panic_payload(payload.as_ref()));
            let _ = ErrorChannel::write_report(report_fd, &report);
            1
        }
    }
}

/// Replace the inherited panic hook with one that records the panic for the
/// failure report instead of printing to the parent's stderr. The hook runs
/// at the panic site, so the captured backtrace names the failing frames.
fn install_panic_recorder() {
    panic::set_hook(Box::new(|info| {
        let report = FailureReport {
            kind: PANIC_KIND.to_string(),
            message: panic_message(info.payload()),
            backtrace: capture_backtrace(),
        };
        if let Ok(mut slot) = LAST_PANIC.lock() {
            *slot = Some(report);
        }
    }));
}

fn take_recorded_panic() -> Option<FailureReport> {
    LAST_PANIC.lock().ok().and_then(|mut slot| slot.take())
}
