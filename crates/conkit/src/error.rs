// SPDX-License-Identifier: MIT
//
// Error type shared by every conkit operation.
//
// Four things can go wrong: memory for the frame or scratch cannot be
// reserved, the OS refuses a console query or mode change, the host calls
// into a console that is not started, or the output sink rejects a frame.
// Nothing is retried here. The host decides whether to retry or give up.

use std::io;

/// Errors returned by conkit operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Growing the frame buffer, or the initial frame/scratch allocation,
    /// could not be satisfied. Existing buffer contents are left intact.
    #[error("could not reserve {requested} bytes of console buffer memory")]
    AllocationExhausted { requested: usize },

    /// An OS-level console query, mode toggle, poll, or read failed.
    #[error("console {operation} failed: {source}")]
    OsQueryFailed {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// The console was used outside of an active start/stop bracket.
    #[error("cannot {operation}: console is {state}")]
    InvalidLifecycleUse {
        operation: &'static str,
        state: &'static str,
    },

    /// Writing a frame to the output sink failed. The frame is kept.
    #[error("failed to write frame: {0}")]
    OutputFailed(#[source] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap the calling thread's last OS error for `operation`.
    #[must_use]
    pub fn last_os_error(operation: &'static str) -> Self {
        Self::OsQueryFailed {
            operation,
            source: io::Error::last_os_error(),
        }
    }

    /// Build an [`Error::OsQueryFailed`] from an existing I/O error.
    #[must_use]
    pub const fn os(operation: &'static str, source: io::Error) -> Self {
        Self::OsQueryFailed { operation, source }
    }

    /// Whether this error came from the OS console layer.
    #[must_use]
    pub const fn is_os_failure(&self) -> bool {
        matches!(self, Self::OsQueryFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_message_mentions_size() {
        let err = Error::AllocationExhausted { requested: 4096 };
        assert_eq!(
            err.to_string(),
            "could not reserve 4096 bytes of console buffer memory"
        );
    }

    #[test]
    fn os_failure_keeps_source() {
        let err = Error::os("size query", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_os_failure());
        assert!(err.to_string().starts_with("console size query failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn lifecycle_message() {
        let err = Error::InvalidLifecycleUse {
            operation: "flush",
            state: "uninitialized",
        };
        assert_eq!(err.to_string(), "cannot flush: console is uninitialized");
        assert!(!err.is_os_failure());
    }

    #[test]
    fn output_failure_is_not_os_failure() {
        let err = Error::OutputFailed(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(!err.is_os_failure());
        assert!(err.to_string().starts_with("failed to write frame"));
    }
}
