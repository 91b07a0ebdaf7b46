//! Wire form of a task failure. At most one report crosses the error
//! channel per invocation, written by the child just before it exits.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::backtrace::Backtrace;

/// `kind` value used for panics, the one failure shape the parent can
/// reconstruct as its own variant rather than as opaque text.
pub const PANIC_KIND: &str = "panic";

/// A captured task failure: originating type name, display message, and
/// best-effort backtrace frames (innermost first, possibly empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
    pub backtrace: Vec<String>,
}

impl FailureReport {
    /// Capture an error returned by the task. The backtrace is taken at the
    /// observation point, not where the error was created.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        FailureReport {
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            backtrace: capture_backtrace(),
        }
    }

    /// Build a report from a caught panic payload when the panic hook did
    /// not record one (no backtrace is recoverable at that point).
    pub fn from_panic_payload(payload: &(dyn Any + Send)) -> Self {
        FailureReport {
            kind: PANIC_KIND.to_string(),
            message: panic_message(payload),
            backtrace: Vec::new(),
        }
    }
}

/// Render the current backtrace as one frame description per line.
pub(crate) fn capture_backtrace() -> Vec<String> {
    Backtrace::force_capture()
        .to_string()
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Extract a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn from_error_records_type_name_and_message() {
        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let report = FailureReport::from_error(&err);
        assert_eq!(report.kind, "std::io::error::Error");
        assert_eq!(report.message, "disk on fire");
        assert!(!report.backtrace.is_empty());
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static panic");
        assert_eq!(panic_message(payload.as_ref()), "static panic");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned panic"));
        assert_eq!(panic_message(payload.as_ref()), "owned panic");

        let payload: Box<dyn Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }

    #[test]
    fn report_survives_the_wire_format() {
        let report = FailureReport {
            kind: PANIC_KIND.to_string(),
            message: "Explosion!".to_string(),
            backtrace: vec!["0: task".to_string()],
        };
        let bytes = serde_json::to_vec(&report).unwrap();
        let decoded: FailureReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.kind, report.kind);
        assert_eq!(decoded.message, report.message);
        assert_eq!(decoded.backtrace, report.backtrace);
    }
}
