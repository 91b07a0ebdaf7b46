//! forkfault: crash and hang isolation for a single unit of work
//!
//! Runs a closure in a forked child process, captures any failure raised
//! inside it, enforces a wall-clock deadline with escalating forced
//! termination, and re-raises the failure in the caller's context as if it
//! had happened locally.
//!
//! # Architecture
//!
//! One invocation flows through four pieces, leaves first:
//!
//! - [`channel`]: the one-shot error channel — a pipe pair whose write end
//!   carries at most one serialized failure report from child to parent.
//! - [`child`]: the child-side task runner — forks, executes the task under
//!   a panic-capturing harness, reports failures, and hard-exits without
//!   running inherited atexit hooks.
//! - [`wait`]: the parent-side waiter — a non-blocking `waitpid` loop that
//!   escalates SIGTERM then SIGKILL once the deadline elapses and always
//!   reaps the child exactly once.
//! - [`reconstruct`]: the parent-side reconstructor — turns the child's exit
//!   code and drained report bytes into a normal return or a [`Fault`].
//!
//! [`isolate`] wires them together behind [`run_isolated`].
//!
//! # Guarantees and limits
//!
//! No state is retained between invocations. The child shares the parent's
//! privileges, filesystem, and environment: this is crash/hang isolation,
//! not a sandbox. A child that vanishes mid-check (killed and reaped by
//! someone else) is deliberately treated as having exited cleanly.
//!
//! ```
//! use forkfault::{run_isolated_with_timeout, Fault};
//! use std::time::Duration;
//!
//! let fault = run_isolated_with_timeout(Duration::from_millis(200), || {
//!     std::thread::sleep(Duration::from_secs(60));
//!     Ok::<(), std::io::Error>(())
//! })
//! .unwrap_err();
//! assert!(matches!(fault, Fault::Hung { .. }));
//! ```

pub mod channel;
pub mod child;
pub mod error;
pub mod isolate;
pub mod reconstruct;
pub mod report;
pub mod wait;

pub use error::{Fault, Result};
pub use isolate::{run_isolated, run_isolated_with_timeout, DEFAULT_TIMEOUT};
pub use report::FailureReport;
pub use wait::SIGNALED_EXIT_CODE;
