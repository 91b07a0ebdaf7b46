//! Parent-side failure reconstruction.
//!
//! Interprets the only state that survives the child: its exit code and the
//! bytes drained from the error channel. This path never fails on its own —
//! a report the parent cannot decode degrades to an opaque fault carrying
//! the raw text, so diagnostics are never silently dropped.

use crate::error::{Fault, Result};
use crate::report::{FailureReport, PANIC_KIND};
use nix::unistd::Pid;

/// Decide the outcome of an invocation.
///
/// - exit code 0: the task completed; any payload is ignored.
/// - non-zero with an empty payload: the child was terminated without the
///   chance to report (deadline escalation or an external kill) —
///   [`Fault::Hung`].
/// - non-zero with a payload: rebuild the reported failure.
pub fn reconstruct(child: Pid, exit_code: i32, payload: &[u8]) -> Result<()> {
    if exit_code == 0 {
        return Ok(());
    }
    if payload.is_empty() {
        return Err(Fault::Hung {
            pid: child.as_raw(),
        });
    }

    let report = match serde_json::from_slice::<FailureReport>(payload) {
        Ok(report) => report,
        Err(e) => {
            log::warn!("undecodable failure report from child {child}: {e}");
            FailureReport {
                kind: "unknown".to_string(),
                message: String::from_utf8_lossy(payload).into_owned(),
                backtrace: Vec::new(),
            }
        }
    };
    Err(rebuild(report))
}

/// Construct a fresh fault from the captured `(kind, message, backtrace)`
/// triple. Panics are the one kind constructible as its own variant; every
/// other kind is preserved opaquely as text.
fn rebuild(report: FailureReport) -> Fault {
    let FailureReport {
        kind,
        message,
        backtrace,
    } = report;
    if kind == PANIC_KIND {
        Fault::Panic { message, backtrace }
    } else {
        Fault::Task {
            kind,
            message,
            backtrace,
        }
    }
}
