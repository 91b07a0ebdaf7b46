//! One-shot error channel between parent and child.
//!
//! A pipe pair created before forking. The write end is used exclusively by
//! the child to carry at most one serialized [`FailureReport`]; the parent's
//! copy of the write end exists only to be closed. Framing is writer-close
//! plus read-to-EOF: the parent reads only after the child has terminated,
//! so the read can never block on a still-running writer.

use crate::error::{process_fault, Result};
use crate::report::FailureReport;
use nix::unistd::{close, pipe};
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::io::{FromRawFd, RawFd};

pub struct ErrorChannel {
    read_fd: RawFd,
    write_fd: RawFd,
}

impl ErrorChannel {
    /// Create the pipe pair. Call before forking so both processes inherit
    /// the descriptors.
    pub fn open() -> Result<Self> {
        let (read_fd, write_fd) = pipe().map_err(|e| process_fault("pipe(report)", e))?;
        Ok(ErrorChannel { read_fd, write_fd })
    }

    /// Write end inherited by the child.
    pub fn write_fd(&self) -> RawFd {
        self.write_fd
    }

    /// Child side: drop the inherited read end so pipe EOF tracks the write
    /// end alone.
    pub fn close_read(&self) {
        let _ = close(self.read_fd);
    }

    /// Child side: serialize the report, flush, and close the write end.
    /// Takes the fd by value; the `File` owns and closes it on return.
    pub fn write_report(fd: RawFd, report: &FailureReport) -> Result<()> {
        let mut file = unsafe { File::from_raw_fd(fd) };
        let payload = serde_json::to_vec(report)
            .map_err(|e| process_fault("encode(report)", e))?;
        file.write_all(&payload)?;
        file.flush()?;
        Ok(())
    }

    /// Parent side, only after the child has terminated: close our write-end
    /// handle (idempotently), read whatever the child wrote up to EOF, and
    /// close the read end.
    pub fn drain(self) -> Result<Vec<u8>> {
        let _ = close(self.write_fd);
        let mut file = unsafe { File::from_raw_fd(self.read_fd) };
        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;
        Ok(payload)
    }

    /// Abort path: close both parent-held ends without reading.
    pub fn discard(self) {
        let _ = close(self.write_fd);
        let _ = close(self.read_fd);
    }
}
