//! Crate-wide error type. Every invocation of the public API ends in either
//! a normal return or exactly one [`Fault`]; there is no partial success.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Fault>;

/// Failure surfaced by [`run_isolated`](crate::run_isolated).
///
/// `Task` and `Panic` are reconstructions of a failure the child reported
/// through the error channel. `Hung` is synthetic: the child terminated
/// without reporting anything, so no diagnostic detail is recoverable.
#[derive(Debug, Error)]
pub enum Fault {
    /// The task returned an error inside the child. `kind` is the error's
    /// type name as captured in the child; it is preserved as text rather
    /// than mapped back to a concrete type.
    #[error("{kind}: {message}")]
    Task {
        kind: String,
        message: String,
        backtrace: Vec<String>,
    },

    /// The task panicked inside the child.
    #[error("task panicked: {message}")]
    Panic {
        message: String,
        backtrace: Vec<String>,
    },

    /// The child overran its deadline and was force-terminated, or was
    /// killed externally before it could write a report.
    #[error("child process {pid} hung or was killed: no error information could be retrieved")]
    Hung { pid: i32 },

    /// fork/kill/waitpid machinery failed in the parent.
    #[error("process error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Fault {
    /// Backtrace frames reported by the child, innermost first. Empty for
    /// faults that carry no backtrace.
    pub fn backtrace_frames(&self) -> &[String] {
        match self {
            Fault::Task { backtrace, .. } | Fault::Panic { backtrace, .. } => backtrace,
            _ => &[],
        }
    }
}

pub(crate) fn process_fault(prefix: &str, err: impl std::fmt::Display) -> Fault {
    Fault::Process(format!("{prefix}: {err}"))
}
