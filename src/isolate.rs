//! Public entry points: fork, wait, drain, reconstruct.

use crate::channel::ErrorChannel;
use crate::child::spawn_task;
use crate::error::Result;
use crate::reconstruct::reconstruct;
use crate::wait::wait_with_escalation;
use std::time::Duration;

/// Deadline applied by [`run_isolated`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `task` in a forked child with the default 10 second deadline.
///
/// Returns normally if the task completed; re-raises the task's own failure
/// as a [`Fault`](crate::Fault) if it failed; raises
/// [`Fault::Hung`](crate::Fault::Hung) (naming the child pid) if the child
/// overran the deadline and had to be terminated, or was killed before it
/// could report.
///
/// The call is synchronous: it does not return until the child has
/// terminated and been reaped. In a multi-threaded parent the usual fork
/// caveats apply — the child runs with a snapshot of the parent's state.
///
/// ```
/// use forkfault::run_isolated;
///
/// run_isolated(|| -> Result<(), std::io::Error> { Ok(()) }).unwrap();
///
/// let fault = run_isolated(|| -> Result<(), std::io::Error> {
///     Err(std::io::Error::new(std::io::ErrorKind::Other, "Explosion!"))
/// })
/// .unwrap_err();
/// assert!(fault.to_string().contains("Explosion!"));
/// ```
pub fn run_isolated<F, E>(task: F) -> Result<()>
where
    F: FnOnce() -> std::result::Result<(), E>,
    E: std::error::Error,
{
    run_isolated_with_timeout(DEFAULT_TIMEOUT, task)
}

/// [`run_isolated`] with an explicit deadline.
///
/// The escalation sequence past the deadline is fixed: SIGTERM, then one
/// poll interval later SIGKILL, then a blocking reap.
pub fn run_isolated_with_timeout<F, E>(timeout: Duration, task: F) -> Result<()>
where
    F: FnOnce() -> std::result::Result<(), E>,
    E: std::error::Error,
{
    let channel = ErrorChannel::open()?;

    let child = match spawn_task(&channel, task) {
        Ok(pid) => pid,
        Err(e) => {
            channel.discard();
            return Err(e);
        }
    };
    log::debug!("task forked as child {child}");

    let exit_code = match wait_with_escalation(child, timeout) {
        Ok(code) => code,
        Err(e) => {
            channel.discard();
            return Err(e);
        }
    };
    log::debug!("child {child} terminated with exit code {exit_code}");

    // The child has terminated, so the drain cannot block on a live writer.
    let payload = channel.drain()?;
    reconstruct(child, exit_code, &payload)
}
